// src/evaluator.rs

use crate::hand::{Hand, SetKind, TileCounts, TileSet};
use crate::tiles::{Suit, TileKind, SPECIAL_WIN_KINDS};
use log::debug;

/// How the candidate tile reached the hand being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Self-drawn; the tile is already among the concealed tiles.
    Draw,
    /// Discarded by the seat immediately before the evaluating seat.
    Previous,
    /// Discarded by any other seat.
    Other,
}

impl Relation {
    pub fn between(discarder: usize, seat: usize) -> Self {
        if (discarder + 1) % 4 == seat % 4 {
            Relation::Previous
        } else {
            Relation::Other
        }
    }

    fn is_discard(self) -> bool {
        self != Relation::Draw
    }
}

/// The grouping that made a hand a win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinShape {
    /// One of each of the thirteen honors and terminals, `pair` held twice.
    Special { pair: TileKind },
    /// Four groups and an eye. `sets` holds only the newly formed groups;
    /// exposed groups are not repeated.
    Standard { eye: TileKind, sets: Vec<TileSet> },
}

/// Greedy decomposition of one suit into triples and runs.
///
/// Ranks are visited lowest first: a triple is taken if three or more are
/// held, then any leftover at that rank must start runs. A rank that cannot
/// be cleared fails the whole suit.
fn decompose_suit(suit: Suit, mut counts: [u8; 10]) -> Option<Vec<TileSet>> {
    let mut sets = Vec::new();
    for rank in 1..=suit.max_rank() {
        let j = rank as usize;
        if counts[j] == 0 {
            continue;
        }
        let kind = TileKind::new(suit, rank)?;
        if counts[j] >= 3 {
            sets.push(TileSet::triple(kind));
            counts[j] -= 3;
        }
        if counts[j] > 0 {
            while suit.forms_runs()
                && j <= 7
                && counts[j] > 0
                && counts[j + 1] > 0
                && counts[j + 2] > 0
            {
                sets.push(TileSet::sequence(kind)?);
                counts[j] -= 1;
                counts[j + 1] -= 1;
                counts[j + 2] -= 1;
            }
            if counts[j] != 0 {
                return None;
            }
        }
    }
    Some(sets)
}

/// Finds the eye in a suit holding 3n+2 tiles and decomposes the rest.
fn split_eye(suit: Suit, counts: [u8; 10], value_sum: u16) -> Option<(TileKind, Vec<TileSet>)> {
    if !suit.forms_runs() {
        // honors never run, so the eye is the first exact pair
        let rank = (1..=suit.max_rank()).find(|&r| counts[r as usize] == 2)?;
        let mut rest = counts;
        rest[rank as usize] -= 2;
        let eye = TileKind::new(suit, rank)?;
        return decompose_suit(suit, rest).map(|sets| (eye, sets));
    }

    // Removing a pair must leave a rank total divisible by three, which pins
    // the eye to one residue class: 3/6/9, 2/5/8 or 1/4/7.
    let first = [3usize, 2, 1][(value_sum % 3) as usize];
    for rank in [first, first + 3, first + 6] {
        if counts[rank] < 2 {
            continue;
        }
        let mut rest = counts;
        rest[rank] -= 2;
        debug!("{suit:?}: trying eye at rank {rank}");
        if let Some(sets) = decompose_suit(suit, rest) {
            let eye = TileKind::new(suit, rank as u8)?;
            return Some((eye, sets));
        }
    }
    None
}

fn special_win(hand: &Hand, candidate: Option<TileKind>) -> Option<TileKind> {
    let total = hand.concealed().len() + usize::from(candidate.is_some());
    if total != 14 {
        return None;
    }
    let counts = hand.counts(candidate);
    let mut pair = None;
    for kind in SPECIAL_WIN_KINDS {
        match counts.count(kind) {
            1 => {}
            2 if pair.is_none() => pair = Some(kind),
            _ => return None,
        }
    }
    pair
}

fn standard_win(hand: &Hand, candidate: Option<TileKind>, relation: Relation) -> Option<WinShape> {
    let counts: TileCounts = hand.counts(candidate);

    if let Some(suit) = Suit::PLAYABLE.into_iter().find(|&s| counts.total(s) % 3 == 1) {
        debug!(
            "seat {}: {suit:?} holds {} tiles, no decomposition possible",
            hand.seat(),
            counts.total(suit)
        );
        return None;
    }

    let mut eye = None;
    let mut sets = Vec::new();
    for suit in Suit::PLAYABLE {
        let total = counts.total(suit);
        if total == 0 {
            continue;
        }
        if total % 3 == 2 {
            if eye.is_some() {
                debug!("seat {}: a second suit needs an eye", hand.seat());
                return None;
            }
            let (suit_eye, suit_sets) =
                split_eye(suit, counts.ranks(suit), counts.value_sum(suit))?;
            eye = Some(suit_eye);
            sets.extend(suit_sets);
        } else {
            sets.extend(decompose_suit(suit, counts.ranks(suit))?);
        }
    }

    let eye = eye?;
    let group_count = hand.exposed().len() + sets.len();
    if group_count != 4 {
        debug!("seat {}: {group_count} groups, not a win", hand.seat());
        return None;
    }

    if let (true, Some(kind)) = (relation.is_discard(), candidate) {
        let suitable = eye == kind
            || sets.iter().any(|s| match s.kind() {
                SetKind::Triple | SetKind::Kong => s.contains(kind),
                SetKind::Sequence => relation == Relation::Previous && s.contains(kind),
            });
        if !suitable {
            debug!(
                "seat {}: {kind} cannot complete a group when claimed as {relation:?}",
                hand.seat()
            );
            return None;
        }
    }

    Some(WinShape::Standard { eye, sets })
}

/// The winning grouping of `hand` plus `candidate`, if there is one.
pub fn find_win(hand: &Hand, candidate: Option<TileKind>, relation: Relation) -> Option<WinShape> {
    if let Some(pair) = special_win(hand, candidate) {
        debug!("seat {}: special win paired on {pair}", hand.seat());
        return Some(WinShape::Special { pair });
    }
    let shape = standard_win(hand, candidate, relation);
    if let Some(WinShape::Standard { eye, sets }) = &shape {
        debug!("seat {}: standard win, eye {eye}, {} new groups", hand.seat(), sets.len());
    }
    shape
}

pub fn have_win(hand: &Hand, candidate: Option<TileKind>, relation: Relation) -> bool {
    find_win(hand, candidate, relation).is_some()
}

/// Every kong the hand could declare. With a candidate only that kind counts;
/// upgrading an exposed triple is only possible on a self-draw.
pub fn have_kong(hand: &Hand, candidate: Option<TileKind>, relation: Relation) -> Vec<TileSet> {
    let counts = hand.counts(candidate);
    let mut options = Vec::new();
    for suit in Suit::PLAYABLE {
        for rank in 1..=suit.max_rank() {
            let Some(kind) = TileKind::new(suit, rank) else { continue };
            if counts.count(kind) == 4 && candidate.map_or(true, |c| c == kind) {
                options.push(TileSet::kong(kind));
            }
        }
    }
    if relation == Relation::Draw {
        for meld in hand.exposed() {
            if meld.set.kind() == SetKind::Triple && counts.count(meld.set.base()) > 0 {
                options.push(TileSet::kong(meld.set.base()));
            }
        }
    }
    options
}

/// A pong of the candidate, only from a discard and only with exactly two concealed copies.
pub fn have_pong(hand: &Hand, candidate: Option<TileKind>, relation: Relation) -> Option<TileSet> {
    let kind = candidate.filter(|k| !k.is_bonus())?;
    if !relation.is_discard() || hand.count_concealed(kind) != 2 {
        return None;
    }
    Some(TileSet::triple(kind))
}

/// Every run the candidate could complete. Only the seat after the discarder may claim one.
pub fn have_seq(hand: &Hand, candidate: Option<TileKind>, relation: Relation) -> Vec<TileSet> {
    let Some(kind) = candidate else { return Vec::new() };
    if relation != Relation::Previous || !kind.suit().forms_runs() {
        return Vec::new();
    }
    let ranks = hand.counts(Some(kind)).ranks(kind.suit());
    (1..=7u8)
        .filter(|&start| (start..start + 3).contains(&kind.rank()))
        .filter(|&start| (start..start + 3).all(|r| ranks[r as usize] > 0))
        .filter_map(|start| TileKind::new(kind.suit(), start).and_then(TileSet::sequence))
        .collect()
}
