use crate::tiles::{Suit, Tile, TileKind};
use std::fmt;
use thiserror::Error;

pub const HAND_CAPACITY: usize = 14;
pub const BONUS_CAPACITY: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandError {
    #[error("seat {seat}: tile {tile} could not be placed, the hand already holds 14 tiles")]
    Full { seat: usize, tile: Tile },
    #[error("seat {seat}: bonus tile store is full and cannot take {tile}")]
    BonusFull { seat: usize, tile: Tile },
    #[error("seat {seat}: concealed slot {index} is empty")]
    EmptySlot { seat: usize, index: usize },
    #[error("seat {seat}: wanted {wanted} of {kind} but only {held} are concealed")]
    MissingTiles { seat: usize, kind: TileKind, wanted: usize, held: usize },
    #[error("seat {seat}: no exposed triple of {kind} to upgrade")]
    NoTriple { seat: usize, kind: TileKind },
}

/// Per-suit rank counts for the four playable suits. Row index = suit, column = rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileCounts {
    counts: [[u8; 10]; 4],
    totals: [u8; 4],
    value_sums: [u16; 4],
}

impl TileCounts {
    pub fn from_kinds(kinds: impl IntoIterator<Item = TileKind>) -> Self {
        let mut c = Self::default();
        for k in kinds {
            c.add(k);
        }
        c
    }

    /// Bonus tiles are never grouped and are ignored.
    pub fn add(&mut self, kind: TileKind) {
        if let Some(s) = kind.suit().playable_index() {
            self.counts[s][kind.rank() as usize] += 1;
            self.totals[s] += 1;
            self.value_sums[s] += kind.rank() as u16;
        }
    }

    pub fn count(&self, kind: TileKind) -> u8 {
        kind.suit()
            .playable_index()
            .map_or(0, |s| self.counts[s][kind.rank() as usize])
    }

    /// Counts for one suit, indexed by rank (slot 0 unused).
    pub fn ranks(&self, suit: Suit) -> [u8; 10] {
        suit.playable_index().map_or([0; 10], |s| self.counts[s])
    }

    pub fn total(&self, suit: Suit) -> u8 {
        suit.playable_index().map_or(0, |s| self.totals[s])
    }

    pub fn value_sum(&self, suit: Suit) -> u16 {
        suit.playable_index().map_or(0, |s| self.value_sums[s])
    }

    pub fn grid(&self) -> [[u8; 10]; 4] {
        self.counts
    }

    pub fn merge(&mut self, other: &TileCounts) {
        for s in 0..4 {
            for r in 0..10 {
                self.counts[s][r] += other.counts[s][r];
            }
            self.totals[s] += other.totals[s];
            self.value_sums[s] += other.value_sums[s];
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetKind {
    Triple,
    Sequence,
    Kong,
}

/// A tile-group pattern: three or four of a kind, or a run starting at `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSet {
    kind: SetKind,
    base: TileKind,
}

impl TileSet {
    pub fn triple(kind: TileKind) -> Self {
        Self { kind: SetKind::Triple, base: kind }
    }

    pub fn kong(kind: TileKind) -> Self {
        Self { kind: SetKind::Kong, base: kind }
    }

    /// `None` unless `base` is a number tile of rank 7 or lower.
    pub fn sequence(base: TileKind) -> Option<Self> {
        (base.suit().forms_runs() && base.rank() <= 7)
            .then_some(Self { kind: SetKind::Sequence, base })
    }

    pub fn kind(&self) -> SetKind {
        self.kind
    }

    pub fn base(&self) -> TileKind {
        self.base
    }

    pub fn members(&self) -> Vec<TileKind> {
        match self.kind {
            SetKind::Triple => vec![self.base; 3],
            SetKind::Kong => vec![self.base; 4],
            SetKind::Sequence => (0..3).filter_map(|d| self.base.offset(d)).collect(),
        }
    }

    pub fn contains(&self, kind: TileKind) -> bool {
        match self.kind {
            SetKind::Triple | SetKind::Kong => self.base == kind,
            SetKind::Sequence => {
                let low = self.base.rank();
                kind.suit() == self.base.suit() && (low..low + 3).contains(&kind.rank())
            }
        }
    }
}

impl fmt::Display for TileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in self.members() {
            write!(f, "{}", k.to_unicode())?;
        }
        Ok(())
    }
}

/// An exposed group together with the physical tiles that make it up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meld {
    pub set: TileSet,
    pub tiles: Vec<Tile>,
}

#[derive(Clone, Debug)]
pub struct Hand {
    seat: usize,
    concealed: Vec<Tile>,
    exposed: Vec<Meld>,
    bonus: Vec<Tile>,
    last_drawn: Option<Tile>,
    received: usize,
    discarded: usize,
}

impl Hand {
    pub fn new(seat: usize) -> Self {
        Self {
            seat,
            concealed: Vec::with_capacity(HAND_CAPACITY),
            exposed: Vec::new(),
            bonus: Vec::with_capacity(BONUS_CAPACITY),
            last_drawn: None,
            received: 0,
            discarded: 0,
        }
    }

    pub fn with_concealed(
        seat: usize,
        tiles: impl IntoIterator<Item = Tile>,
    ) -> Result<Self, HandError> {
        let mut h = Self::new(seat);
        for t in tiles {
            h.receive(t)?;
        }
        Ok(h)
    }

    pub fn seat(&self) -> usize {
        self.seat
    }

    /// Sorted by suit, rank and serial.
    pub fn concealed(&self) -> &[Tile] {
        &self.concealed
    }

    pub fn exposed(&self) -> &[Meld] {
        &self.exposed
    }

    pub fn bonus(&self) -> &[Tile] {
        &self.bonus
    }

    pub fn last_drawn(&self) -> Option<Tile> {
        self.last_drawn
    }

    pub fn set_last_drawn(&mut self, tile: Option<Tile>) {
        self.last_drawn = tile;
    }

    pub fn tiles_received(&self) -> usize {
        self.received
    }

    pub fn tiles_discarded(&self) -> usize {
        self.discarded
    }

    /// Adds a tile to the concealed part and keeps it sorted.
    pub fn receive(&mut self, tile: Tile) -> Result<(), HandError> {
        if self.concealed.len() >= HAND_CAPACITY {
            return Err(HandError::Full { seat: self.seat, tile });
        }
        let pos = self.concealed.partition_point(|t| *t < tile);
        self.concealed.insert(pos, tile);
        self.received += 1;
        Ok(())
    }

    pub fn has_bonus_tile(&self) -> bool {
        self.concealed.iter().any(|t| t.is_bonus())
    }

    /// Removes and returns the first concealed bonus tile.
    pub fn take_bonus_tile(&mut self) -> Option<Tile> {
        let pos = self.concealed.iter().position(|t| t.is_bonus())?;
        Some(self.concealed.remove(pos))
    }

    pub fn reveal_bonus(&mut self, tile: Tile) -> Result<(), HandError> {
        if self.bonus.len() >= BONUS_CAPACITY {
            return Err(HandError::BonusFull { seat: self.seat, tile });
        }
        self.bonus.push(tile);
        Ok(())
    }

    /// Removes the tile in concealed slot `index` as a discard.
    pub fn discard_slot(&mut self, index: usize) -> Result<Tile, HandError> {
        if index >= self.concealed.len() {
            return Err(HandError::EmptySlot { seat: self.seat, index });
        }
        let tile = self.concealed.remove(index);
        self.discarded += 1;
        self.last_drawn = None;
        Ok(tile)
    }

    pub fn count_concealed(&self, kind: TileKind) -> usize {
        self.concealed.iter().filter(|t| t.kind() == kind).count()
    }

    /// Removes `n` concealed tiles of `kind`, lowest serial first. Nothing is removed on failure.
    pub fn take_kind(&mut self, kind: TileKind, n: usize) -> Result<Vec<Tile>, HandError> {
        let held = self.count_concealed(kind);
        if held < n {
            return Err(HandError::MissingTiles { seat: self.seat, kind, wanted: n, held });
        }
        let mut taken = Vec::with_capacity(n);
        self.concealed.retain(|t| {
            if taken.len() < n && t.kind() == kind {
                taken.push(*t);
                false
            } else {
                true
            }
        });
        Ok(taken)
    }

    /// Exposes a group built from `from_hand` plus an optional claimed discard.
    pub fn expose(&mut self, set: TileSet, mut from_hand: Vec<Tile>, claimed: Option<Tile>) {
        if let Some(t) = claimed {
            from_hand.push(t);
            self.received += 1;
        }
        from_hand.sort_unstable();
        self.exposed.push(Meld { set, tiles: from_hand });
    }

    /// Turns an exposed triple of `tile`'s kind into a kong using `tile`.
    pub fn upgrade_triple(&mut self, tile: Tile) -> Result<(), HandError> {
        let kind = tile.kind();
        let meld = self
            .exposed
            .iter_mut()
            .find(|m| m.set.kind() == SetKind::Triple && m.set.base() == kind)
            .ok_or(HandError::NoTriple { seat: self.seat, kind })?;
        meld.set = TileSet::kong(kind);
        meld.tiles.push(tile);
        meld.tiles.sort_unstable();
        Ok(())
    }

    /// Counts of the concealed tiles plus an optional extra tile.
    pub fn counts(&self, consider: Option<TileKind>) -> TileCounts {
        let mut c = TileCounts::from_kinds(self.concealed.iter().map(|t| t.kind()));
        if let Some(k) = consider {
            c.add(k);
        }
        c
    }

    /// Counts of every tile shown in exposed groups.
    pub fn public_counts(&self) -> TileCounts {
        TileCounts::from_kinds(self.exposed.iter().flat_map(|m| m.set.members()))
    }

    /// concealed + exposed + revealed bonus + discarded == everything ever received.
    pub fn is_consistent(&self) -> bool {
        let shown: usize = self.exposed.iter().map(|m| m.tiles.len()).sum();
        let held = self.concealed.len() + shown + self.bonus.len();
        self.concealed.len() <= HAND_CAPACITY
            && self.bonus.len() <= BONUS_CAPACITY
            && held + self.discarded == self.received
    }
}
