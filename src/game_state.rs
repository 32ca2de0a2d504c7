use crate::agent::{DecisionAgent, TableView};
use crate::discard::{DiscardPile, DiscardedTile};
use crate::evaluator::{find_win, have_kong, have_pong, have_seq, Relation, WinShape};
use crate::events::{EventSink, GameEvent};
use crate::hand::{Hand, HandError, TileSet};
use crate::tiles::TileKind;
use crate::wall::{Cursor, Wall, WallError};
use log::{debug, warn};
use thiserror::Error;

pub const PLAYERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The acting seat just drew, or claimed and must discard.
    DrawProcessing,
    /// Other seats are offered the newest discard.
    DiscardProcessing,
}

/// One node of the turn sequence. Every variant but the two terminals names its acting seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    HaveWin { seat: usize, phase: Phase },
    HaveKong { seat: usize, phase: Phase },
    HavePong { seat: usize },
    HaveSeq { seat: usize },
    Discard { seat: usize },
    DrawTile { seat: usize },
    DrawReplacementTile { seat: usize },
    HandleSpecialTile { seat: usize },
    WinGame { seat: usize },
    DrawGame,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::HaveWin { .. } => "HaveWin",
            State::HaveKong { .. } => "HaveKong",
            State::HavePong { .. } => "HavePong",
            State::HaveSeq { .. } => "HaveSeq",
            State::Discard { .. } => "Discard",
            State::DrawTile { .. } => "DrawTile",
            State::DrawReplacementTile { .. } => "DrawReplacementTile",
            State::HandleSpecialTile { .. } => "HandleSpecialTile",
            State::WinGame { .. } => "WinGame",
            State::DrawGame => "DrawGame",
        }
    }

    pub fn phase(&self) -> Phase {
        match *self {
            State::HaveWin { phase, .. } | State::HaveKong { phase, .. } => phase,
            State::HavePong { .. } | State::HaveSeq { .. } => Phase::DiscardProcessing,
            _ => Phase::DrawProcessing,
        }
    }

    pub fn seat(&self) -> Option<usize> {
        match *self {
            State::HaveWin { seat, .. }
            | State::HaveKong { seat, .. }
            | State::HavePong { seat }
            | State::HaveSeq { seat }
            | State::Discard { seat }
            | State::DrawTile { seat }
            | State::DrawReplacementTile { seat }
            | State::HandleSpecialTile { seat }
            | State::WinGame { seat } => Some(seat),
            State::DrawGame => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::WinGame { .. } | State::DrawGame)
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Wall(#[from] WallError),
    #[error(transparent)]
    Hand(#[from] HandError),
    #[error("{0:?} needs a discard to claim but the pile is empty")]
    MissingDiscard(State),
    #[error("game already finished in {0:?}")]
    Finished(State),
}

fn table_view<'a>(
    hands: &'a [Hand; PLAYERS],
    discards: &'a DiscardPile,
    wall: &Wall,
    seat: usize,
) -> TableView<'a> {
    TableView { seat, hands, discards, remaining: wall.remaining() }
}

fn next(seat: usize, by: usize) -> usize {
    (seat + by) % PLAYERS
}

pub struct Game {
    wall: Wall,
    hands: [Hand; PLAYERS],
    discards: DiscardPile,

    // ─── Turn ───
    current: usize,
    dealer: usize,

    // ─── Collaborators ───
    agents: [Box<dyn DecisionAgent>; PLAYERS],
    sink: Box<dyn EventSink>,
}

impl Game {
    /// A table with empty hands. `wall` must already have its deal start set.
    pub fn new(
        wall: Wall,
        dealer: usize,
        agents: [Box<dyn DecisionAgent>; PLAYERS],
        sink: Box<dyn EventSink>,
    ) -> Self {
        let hands = [Hand::new(0), Hand::new(1), Hand::new(2), Hand::new(3)];
        Self::with_hands(wall, hands, dealer, agents, sink)
    }

    pub fn with_hands(
        wall: Wall,
        hands: [Hand; PLAYERS],
        dealer: usize,
        agents: [Box<dyn DecisionAgent>; PLAYERS],
        sink: Box<dyn EventSink>,
    ) -> Self {
        let dealer = dealer % PLAYERS;
        Self { wall, hands, discards: DiscardPile::new(), current: dealer, dealer, agents, sink }
    }

    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    pub fn hands(&self) -> &[Hand; PLAYERS] {
        &self.hands
    }

    pub fn discards(&self) -> &DiscardPile {
        &self.discards
    }

    pub fn current_player(&self) -> usize {
        self.current
    }

    pub fn dealer(&self) -> usize {
        self.dealer
    }

    pub fn record(&mut self, event: GameEvent) {
        self.sink.record(&event);
    }

    /// Three rounds of four tiles to every seat from the dealer on, then the
    /// dealer takes two more and every other seat one.
    pub fn deal(&mut self) -> Result<(), GameError> {
        for round in 0..3 {
            for player in 0..PLAYERS {
                for slot in 0..4 {
                    let tile = self.wall.take_initial(round, player, slot)?;
                    self.hands[next(self.dealer, player)].receive(tile)?;
                }
            }
        }
        for player in [0, 1] {
            let tile = self.wall.take_initial(3, player, 0)?;
            self.hands[self.dealer].receive(tile)?;
        }
        for i in 1..PLAYERS {
            let tile = self.wall.take_initial(3, 0, i)?;
            self.hands[next(self.dealer, i)].receive(tile)?;
        }
        self.record(GameEvent::Dealt { remaining: self.wall.remaining() });
        Ok(())
    }

    /// Replaces bonus tiles dealt in the opening hands, seat by seat from the dealer.
    pub fn replace_initial_bonus(&mut self) -> Result<(), GameError> {
        for i in 0..PLAYERS {
            let seat = next(self.dealer, i);
            while let Some(bonus) = self.hands[seat].take_bonus_tile() {
                self.hands[seat].reveal_bonus(bonus)?;
                let tile = self.wall.take_next(Cursor::Replacement)?;
                self.hands[seat].receive(tile)?;
                self.record(GameEvent::BonusRevealed { seat, bonus });
                self.record(GameEvent::Drew { seat, tile, cursor: Cursor::Replacement });
            }
        }
        Ok(())
    }

    /// The dealer opens by checking the dealt fourteen for a win.
    pub fn opening_state(&self) -> State {
        State::HaveWin { seat: self.dealer, phase: Phase::DrawProcessing }
    }

    /// Steps from `state` until a win or an exhausted wall.
    pub fn run(&mut self, mut state: State) -> Result<State, GameError> {
        while !state.is_terminal() {
            state = self.step(state)?;
        }
        Ok(state)
    }

    pub fn step(&mut self, state: State) -> Result<State, GameError> {
        if let Some(seat) = state.seat() {
            self.current = seat;
        }
        let next_state = match state {
            State::WinGame { .. } | State::DrawGame => return Err(GameError::Finished(state)),
            State::HaveWin { seat, phase: Phase::DrawProcessing } => self.self_drawn_win(seat),
            State::HaveKong { seat, phase: Phase::DrawProcessing } => self.self_drawn_kong(seat),
            State::DrawReplacementTile { seat } => self.draw(seat, Cursor::Replacement),
            State::DrawTile { seat } => self.draw(seat, Cursor::Draw),
            State::HandleSpecialTile { seat } => self.replace_bonus(seat),
            State::Discard { seat } => self.discard(seat),
            State::HaveWin { seat, phase: Phase::DiscardProcessing } => {
                self.discard_win(state, seat)
            }
            State::HaveKong { seat, phase: Phase::DiscardProcessing } => {
                self.discard_kong(state, seat)
            }
            State::HavePong { seat } => self.discard_pong(state, seat),
            State::HaveSeq { seat } => self.discard_seq(state, seat),
        }?;
        debug!("{state:?} -> {next_state:?}");
        Ok(next_state)
    }

    fn self_drawn_win(&mut self, seat: usize) -> Result<State, GameError> {
        if let Some(shape) = find_win(&self.hands[seat], None, Relation::Draw) {
            let view = table_view(&self.hands, &self.discards, &self.wall, seat);
            if self.agents[seat].take_win(&view, None) {
                self.record(GameEvent::Won { seat, shape });
                return Ok(State::WinGame { seat });
            }
        }
        Ok(State::HaveKong { seat, phase: Phase::DrawProcessing })
    }

    fn self_drawn_kong(&mut self, seat: usize) -> Result<State, GameError> {
        let options = have_kong(&self.hands[seat], None, Relation::Draw);
        if options.is_empty() {
            return Ok(State::Discard { seat });
        }
        let view = table_view(&self.hands, &self.discards, &self.wall, seat);
        let choice = self.agents[seat].choose_kong(&view, &options);
        let Some(set) = self.pick(seat, choice, &options) else {
            return Ok(State::Discard { seat });
        };

        let kind = set.base();
        let hand = &mut self.hands[seat];
        if hand.count_concealed(kind) == 4 {
            let tiles = hand.take_kind(kind, 4)?;
            hand.expose(set, tiles, None);
        } else {
            for tile in hand.take_kind(kind, 1)? {
                hand.upgrade_triple(tile)?;
            }
        }
        self.record(GameEvent::Declared { seat, set });
        Ok(State::DrawReplacementTile { seat })
    }

    fn draw(&mut self, seat: usize, cursor: Cursor) -> Result<State, GameError> {
        let tile = match self.wall.take_next(cursor) {
            Ok(t) => t,
            Err(WallError::Exhausted) => return Ok(self.exhausted()),
            Err(e) => return Err(e.into()),
        };
        self.hands[seat].receive(tile)?;
        self.hands[seat].set_last_drawn(Some(tile));
        self.record(GameEvent::Drew { seat, tile, cursor });
        Ok(State::HandleSpecialTile { seat })
    }

    fn replace_bonus(&mut self, seat: usize) -> Result<State, GameError> {
        while let Some(bonus) = self.hands[seat].take_bonus_tile() {
            self.hands[seat].reveal_bonus(bonus)?;
            self.record(GameEvent::BonusRevealed { seat, bonus });
            let tile = match self.wall.take_next(Cursor::Replacement) {
                Ok(t) => t,
                Err(WallError::Exhausted) => return Ok(self.exhausted()),
                Err(e) => return Err(e.into()),
            };
            self.hands[seat].receive(tile)?;
            self.hands[seat].set_last_drawn(Some(tile));
            self.record(GameEvent::Drew { seat, tile, cursor: Cursor::Replacement });
        }
        Ok(State::HaveWin { seat, phase: Phase::DrawProcessing })
    }

    fn discard(&mut self, seat: usize) -> Result<State, GameError> {
        let view = table_view(&self.hands, &self.discards, &self.wall, seat);
        let choice = self.agents[seat].choose_discard(&view);
        let held = self.hands[seat].concealed().len();
        let slot = match choice {
            Some(i) if i < held => i,
            other => {
                warn!(
                    "seat {seat}: discard choice {other:?} is not one of {held} slots, using slot 0"
                );
                0
            }
        };
        let tile = self.hands[seat].discard_slot(slot)?;
        self.discards.push(seat, tile);
        self.record(GameEvent::Discarded { seat, tile });
        Ok(State::HaveWin { seat: next(seat, 1), phase: Phase::DiscardProcessing })
    }

    fn discard_win(&mut self, state: State, seat: usize) -> Result<State, GameError> {
        let d = self.newest_discard(state)?;
        let relation = Relation::between(d.seat, seat);
        if let Some(shape) = find_win(&self.hands[seat], Some(d.tile.kind()), relation) {
            let view = table_view(&self.hands, &self.discards, &self.wall, seat);
            if self.agents[seat].take_win(&view, Some(d.tile)) {
                self.discards.take_last();
                self.hands[seat].receive(d.tile)?;
                if let Some(set) = completed_set(&shape, d.tile.kind()) {
                    self.record(GameEvent::Claimed { seat, from: d.seat, set, tile: d.tile });
                }
                self.record(GameEvent::Won { seat, shape });
                return Ok(State::WinGame { seat });
            }
        }
        if next(seat, 1) == d.seat {
            Ok(State::HaveKong { seat: next(seat, 2), phase: Phase::DiscardProcessing })
        } else {
            Ok(State::HaveWin { seat: next(seat, 1), phase: Phase::DiscardProcessing })
        }
    }

    fn discard_kong(&mut self, state: State, seat: usize) -> Result<State, GameError> {
        let d = self.newest_discard(state)?;
        let kind = d.tile.kind();
        let options = have_kong(&self.hands[seat], Some(kind), Relation::between(d.seat, seat));
        if !options.is_empty() {
            let view = table_view(&self.hands, &self.discards, &self.wall, seat);
            let choice = self.agents[seat].choose_kong(&view, &options);
            if let Some(set) = self.pick(seat, choice, &options) {
                let tiles = self.hands[seat].take_kind(kind, 3)?;
                self.discards.take_last();
                self.hands[seat].expose(set, tiles, Some(d.tile));
                self.record(GameEvent::Claimed { seat, from: d.seat, set, tile: d.tile });
                return Ok(State::DrawReplacementTile { seat });
            }
        }
        if next(seat, 1) == d.seat {
            Ok(State::HavePong { seat: next(seat, 2) })
        } else {
            Ok(State::HaveKong { seat: next(seat, 1), phase: Phase::DiscardProcessing })
        }
    }

    fn discard_pong(&mut self, state: State, seat: usize) -> Result<State, GameError> {
        let d = self.newest_discard(state)?;
        let kind = d.tile.kind();
        let relation = Relation::between(d.seat, seat);
        if let Some(set) = have_pong(&self.hands[seat], Some(kind), relation) {
            let view = table_view(&self.hands, &self.discards, &self.wall, seat);
            if self.agents[seat].take_pong(&view, &set) {
                let tiles = self.hands[seat].take_kind(kind, 2)?;
                self.discards.take_last();
                self.hands[seat].expose(set, tiles, Some(d.tile));
                self.record(GameEvent::Claimed { seat, from: d.seat, set, tile: d.tile });
                return Ok(State::Discard { seat });
            }
        }
        if next(seat, 1) == d.seat {
            Ok(State::HaveSeq { seat: next(seat, 2) })
        } else {
            Ok(State::HavePong { seat: next(seat, 1) })
        }
    }

    /// Only reached for the seat after the discarder; falls through to its ordinary draw.
    fn discard_seq(&mut self, state: State, seat: usize) -> Result<State, GameError> {
        let d = self.newest_discard(state)?;
        let kind = d.tile.kind();
        let options = have_seq(&self.hands[seat], Some(kind), Relation::between(d.seat, seat));
        if !options.is_empty() {
            let view = table_view(&self.hands, &self.discards, &self.wall, seat);
            let choice = self.agents[seat].choose_seq(&view, &options);
            if let Some(set) = self.pick(seat, choice, &options) {
                let mut tiles = Vec::with_capacity(2);
                for member in set.members().into_iter().filter(|&m| m != kind) {
                    tiles.extend(self.hands[seat].take_kind(member, 1)?);
                }
                self.discards.take_last();
                self.hands[seat].expose(set, tiles, Some(d.tile));
                self.record(GameEvent::Claimed { seat, from: d.seat, set, tile: d.tile });
                return Ok(State::Discard { seat });
            }
        }
        Ok(State::DrawTile { seat })
    }

    fn newest_discard(&self, state: State) -> Result<DiscardedTile, GameError> {
        self.discards.last().ok_or(GameError::MissingDiscard(state))
    }

    fn pick(&self, seat: usize, choice: Option<usize>, options: &[TileSet]) -> Option<TileSet> {
        let i = choice?;
        let set = options.get(i).copied();
        if set.is_none() {
            warn!("seat {seat}: option {i} out of {} offered, declining", options.len());
        }
        set
    }

    fn exhausted(&mut self) -> State {
        self.record(GameEvent::Exhausted { dealer: self.dealer });
        State::DrawGame
    }
}

/// The new group a winning discard completed; `None` when it paired the eye.
fn completed_set(shape: &WinShape, kind: TileKind) -> Option<TileSet> {
    match shape {
        WinShape::Standard { eye, sets } if *eye != kind => {
            sets.iter().find(|s| s.contains(kind)).copied()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AutoAgent;
    use crate::hand::SetKind;
    use crate::tiles::{tiles_from_glyphs, Tile, KIND_COUNT};
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fixed answers for every decision.
    struct Scripted {
        claim: bool,
        discard: usize,
    }

    impl DecisionAgent for Scripted {
        fn take_win(&mut self, _: &TableView<'_>, _: Option<Tile>) -> bool {
            self.claim
        }
        fn choose_kong(&mut self, _: &TableView<'_>, _: &[TileSet]) -> Option<usize> {
            self.claim.then_some(0)
        }
        fn take_pong(&mut self, _: &TableView<'_>, _: &TileSet) -> bool {
            self.claim
        }
        fn choose_seq(&mut self, _: &TableView<'_>, _: &[TileSet]) -> Option<usize> {
            self.claim.then_some(0)
        }
        fn choose_discard(&mut self, _: &TableView<'_>) -> Option<usize> {
            Some(self.discard)
        }
    }

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<GameEvent>>>);

    impl EventSink for Shared {
        fn record(&mut self, event: &GameEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    fn agents(claims: [bool; 4]) -> [Box<dyn DecisionAgent>; PLAYERS] {
        claims.map(|claim| Box::new(Scripted { claim, discard: 0 }) as Box<dyn DecisionAgent>)
    }

    fn auto_agents(seed: u64) -> [Box<dyn DecisionAgent>; PLAYERS] {
        [0, 1, 2, 3].map(|i| {
            let chance = Box::new(StdRng::seed_from_u64(seed + i));
            Box::new(AutoAgent::with_chance(chance)) as Box<dyn DecisionAgent>
        })
    }

    fn kind(c: char) -> TileKind {
        TileKind::try_from(c).unwrap()
    }

    /// Seats built from glyph strings sharing one copy counter; `discard` is thrown by `from`.
    fn table(
        seats: [&str; 4],
        discard: Option<(&str, usize)>,
        claims: [bool; 4],
    ) -> (Game, Shared) {
        let mut used = [0u8; KIND_COUNT];
        let mut seat = 0;
        let hands = seats.map(|g| {
            let h = Hand::with_concealed(seat, tiles_from_glyphs(g, &mut used)).unwrap();
            seat += 1;
            h
        });
        let sink = Shared::default();
        let mut game =
            Game::with_hands(Wall::empty(), hands, 0, agents(claims), Box::new(sink.clone()));
        if let Some((g, from)) = discard {
            game.discards.push(from, tiles_from_glyphs(g, &mut used)[0]);
        }
        (game, sink)
    }

    fn walk(game: &mut Game, mut state: State, until: impl Fn(&State) -> bool) -> Vec<State> {
        let mut seen = vec![state];
        while !until(&state) {
            state = game.step(state).unwrap();
            seen.push(state);
        }
        seen
    }

    const ALL: [bool; 4] = [true; 4];

    #[test]
    fn special_win_on_draw_ends_in_one_step() {
        let (mut game, sink) = table(["", "", "🀀🀁🀂🀃🀄🀅🀆🀙🀐🀇🀡🀘🀏🀀", ""], None, ALL);
        let state = State::HaveWin { seat: 2, phase: Phase::DrawProcessing };
        assert_eq!(game.step(state).unwrap(), State::WinGame { seat: 2 });
        assert!(matches!(sink.0.borrow().last(), Some(GameEvent::Won { seat: 2, .. })));
    }

    #[test]
    fn declined_win_moves_to_kong_check() {
        let (mut game, _) = table(["🀀🀁🀂🀃🀄🀅🀆🀙🀐🀇🀡🀘🀏🀀", "", "", ""], None, [false; 4]);
        let state = game.opening_state();
        assert_eq!(
            game.step(state).unwrap(),
            State::HaveKong { seat: 0, phase: Phase::DrawProcessing }
        );
    }

    #[test]
    fn exhausted_wall_draws_the_game() {
        let (mut game, sink) = table(["", "🀙", "", ""], None, ALL);
        assert_eq!(game.step(State::DrawTile { seat: 1 }).unwrap(), State::DrawGame);
        assert_eq!(game.step(State::DrawReplacementTile { seat: 3 }).unwrap(), State::DrawGame);
        assert!(matches!(sink.0.borrow().last(), Some(GameEvent::Exhausted { dealer: 0 })));
        assert!(matches!(game.step(State::DrawGame), Err(GameError::Finished(State::DrawGame))));
    }

    #[test]
    fn claiming_without_a_discard_is_fatal() {
        let (mut game, _) = table(["", "", "", ""], None, ALL);
        let state = State::HaveWin { seat: 1, phase: Phase::DiscardProcessing };
        assert!(matches!(game.step(state), Err(GameError::MissingDiscard(_))));
    }

    #[test]
    fn pong_beats_run_and_skips_seats() {
        let (mut game, sink) = table(
            ["", "🀈🀉🀙🀚🀛🀐🀑🀒🀆🀆🀀🀁🀂", "🀊🀊🀜🀝🀞🀓🀔🀕🀃🀃🀄🀅🀀", ""],
            Some(("🀊", 0)),
            ALL,
        );
        let start = State::HaveWin { seat: 1, phase: Phase::DiscardProcessing };
        let seen = walk(&mut game, start, |s| matches!(s, State::Discard { .. }));
        assert_eq!(
            seen,
            vec![
                start,
                State::HaveWin { seat: 2, phase: Phase::DiscardProcessing },
                State::HaveWin { seat: 3, phase: Phase::DiscardProcessing },
                State::HaveKong { seat: 1, phase: Phase::DiscardProcessing },
                State::HaveKong { seat: 2, phase: Phase::DiscardProcessing },
                State::HaveKong { seat: 3, phase: Phase::DiscardProcessing },
                State::HavePong { seat: 1 },
                State::HavePong { seat: 2 },
                State::Discard { seat: 2 },
            ]
        );
        assert!(game.discards().is_empty());
        let hand = &game.hands()[2];
        assert_eq!(hand.exposed()[0].set, TileSet::triple(kind('🀊')));
        assert_eq!(hand.exposed()[0].tiles.len(), 3);
        assert_eq!(hand.concealed().len(), 11);
        assert!(hand.is_consistent());
        assert_eq!(game.current_player(), 2);
        assert!(matches!(
            sink.0.borrow().last(),
            Some(GameEvent::Claimed { seat: 2, from: 0, .. })
        ));
    }

    #[test]
    fn declined_pong_leaves_run_to_next_seat() {
        let (mut game, _) = table(
            ["", "🀈🀉🀙🀚🀛🀐🀑🀒🀆🀆🀀🀁🀂", "🀊🀊🀜🀝🀞🀓🀔🀕🀃🀃🀄🀅🀀", ""],
            Some(("🀊", 0)),
            [true, true, false, true],
        );
        let start = State::HavePong { seat: 1 };
        let seen = walk(&mut game, start, |s| {
            matches!(s, State::Discard { .. } | State::DrawTile { .. })
        });
        assert_eq!(
            seen,
            vec![
                start,
                State::HavePong { seat: 2 },
                State::HavePong { seat: 3 },
                State::HaveSeq { seat: 1 },
                State::Discard { seat: 1 },
            ]
        );
        let hand = &game.hands()[1];
        assert_eq!(hand.exposed()[0].set.kind(), SetKind::Sequence);
        assert_eq!(hand.exposed()[0].set.to_string(), "🀈🀉🀊");
        assert_eq!(hand.concealed().len(), 11);
        assert_eq!(hand.count_concealed(kind('🀈')), 0);
        assert!(hand.is_consistent());
        assert!(game.discards().is_empty());
    }

    #[test]
    fn unclaimed_discard_passes_to_next_draw() {
        let (mut game, _) = table(["", "🀈🀉🀙", "🀊🀊🀜", ""], Some(("🀊", 0)), [false; 4]);
        let start = State::HaveWin { seat: 1, phase: Phase::DiscardProcessing };
        let seen = walk(&mut game, start, |s| {
            matches!(s, State::DrawTile { .. })
        });
        assert_eq!(seen.last(), Some(&State::DrawTile { seat: 1 }));
        assert_eq!(seen.len(), 11);
        assert_eq!(game.discards().len(), 1);
    }

    #[test]
    fn winning_discard_joins_the_hand() {
        let (mut game, sink) = table(["", "🀑🀒🀓🀉🀉🀉🀝🀒🀒🀟🀆🀆🀆", "", ""], Some(("🀞", 0)), ALL);
        let state = State::HaveWin { seat: 1, phase: Phase::DiscardProcessing };
        assert_eq!(game.step(state).unwrap(), State::WinGame { seat: 1 });
        assert!(game.discards().is_empty());
        assert_eq!(game.hands()[1].concealed().len(), 14);
        let events = sink.0.borrow();
        assert!(matches!(events.last(), Some(GameEvent::Won { seat: 1, .. })));
        let claimed = events.iter().find_map(|e| match e {
            GameEvent::Claimed { set, .. } => Some(set.to_string()),
            _ => None,
        });
        assert_eq!(claimed.as_deref(), Some("🀝🀞🀟"));
    }

    #[test]
    fn run_win_is_not_offered_across_the_table() {
        // seat 1 holds the same shape but the discard comes from seat 3
        let (mut game, _) = table(["", "🀑🀒🀓🀉🀉🀉🀝🀒🀒🀟🀆🀆🀆", "", ""], Some(("🀞", 3)), ALL);
        let state = State::HaveWin { seat: 1, phase: Phase::DiscardProcessing };
        assert_eq!(
            game.step(state).unwrap(),
            State::HaveWin { seat: 2, phase: Phase::DiscardProcessing }
        );
    }

    #[test]
    fn kong_on_discard_takes_it_from_the_pile() {
        let (mut game, _) = table(["", "", "🀆🀆🀆🀙🀚", ""], Some(("🀆", 0)), ALL);
        let start = State::HaveKong { seat: 1, phase: Phase::DiscardProcessing };
        let seen = walk(&mut game, start, |s| {
            matches!(s, State::DrawReplacementTile { .. })
        });
        assert_eq!(seen.last(), Some(&State::DrawReplacementTile { seat: 2 }));
        assert!(game.discards().is_empty());
        let hand = &game.hands()[2];
        assert_eq!(hand.exposed()[0].set, TileSet::kong(kind('🀆')));
        assert_eq!(hand.exposed()[0].tiles.len(), 4);
        assert!(hand.is_consistent());
        // replacement from an empty wall
        assert_eq!(game.step(State::DrawReplacementTile { seat: 2 }).unwrap(), State::DrawGame);
    }

    #[test]
    fn self_drawn_kong_and_upgrade() {
        let (mut game, sink) = table(["🀆🀆🀆🀆🀙", "", "", ""], None, ALL);
        let state = State::HaveKong { seat: 0, phase: Phase::DrawProcessing };
        assert_eq!(game.step(state).unwrap(), State::DrawReplacementTile { seat: 0 });
        assert_eq!(game.hands()[0].exposed()[0].tiles.len(), 4);
        assert!(matches!(sink.0.borrow().last(), Some(GameEvent::Declared { seat: 0, .. })));

        let (mut game, _) = table(["", "", "", "🀙🀚🀛🀆🀆🀇"], Some(("🀆", 0)), ALL);
        // pong the white, then draw the last copy and upgrade
        assert_eq!(game.step(State::HavePong { seat: 3 }).unwrap(), State::Discard { seat: 3 });
        let mut used = [0u8; KIND_COUNT];
        used[kind('🀆').index() as usize] = 3;
        let last_white = tiles_from_glyphs("🀆", &mut used)[0];
        game.hands[3].receive(last_white).unwrap();
        assert_eq!(
            game.step(State::HaveKong { seat: 3, phase: Phase::DrawProcessing }).unwrap(),
            State::DrawReplacementTile { seat: 3 }
        );
        let hand = &game.hands()[3];
        assert_eq!(hand.exposed().len(), 1);
        assert_eq!(hand.exposed()[0].set, TileSet::kong(kind('🀆')));
        assert!(hand.is_consistent());
    }

    #[test]
    fn declined_kong_goes_to_discard() {
        let (mut game, _) = table(["🀆🀆🀆🀆🀙", "", "", ""], None, [false; 4]);
        let state = State::HaveKong { seat: 0, phase: Phase::DrawProcessing };
        assert_eq!(game.step(state).unwrap(), State::Discard { seat: 0 });
    }

    #[test]
    fn bad_discard_slot_defaults_to_first() {
        let (mut game, _) = table(["🀙🀚🀛", "", "", ""], None, ALL);
        game.agents[0] = Box::new(Scripted { claim: true, discard: 99 });
        let state = State::Discard { seat: 0 };
        assert_eq!(
            game.step(state).unwrap(),
            State::HaveWin { seat: 1, phase: Phase::DiscardProcessing }
        );
        assert_eq!(game.discards().last().map(|d| d.tile.to_unicode()), Some('🀙'));
        assert_eq!(game.hands()[0].concealed().len(), 2);
    }

    #[test]
    fn bonus_tiles_are_replaced_from_the_back() {
        let mut wall = Wall::new();
        wall.set_deal_start(5, 0).unwrap(); // start 10, replacement cursor at position 9
        let mut used = [0u8; KIND_COUNT];
        let hands = [
            Hand::with_concealed(0, tiles_from_glyphs("🀇🀢", &mut used)).unwrap(),
            Hand::new(1),
            Hand::new(2),
            Hand::new(3),
        ];
        let mut game = Game::with_hands(wall, hands, 0, agents(ALL), Box::new(Vec::new()));
        let state = State::HandleSpecialTile { seat: 0 };
        assert_eq!(
            game.step(state).unwrap(),
            State::HaveWin { seat: 0, phase: Phase::DrawProcessing }
        );
        let hand = &game.hands()[0];
        assert_eq!(hand.bonus().len(), 1);
        assert!(!hand.has_bonus_tile());
        // unshuffled position 9 holds serial 10, the second 3-dots
        assert_eq!(hand.last_drawn().map(|t| t.serial()), Some(10));
        assert_eq!(game.wall().remaining(), 143);
    }

    fn bonus_revealed(sink: &Shared) -> usize {
        sink.0.borrow().iter().filter(|e| matches!(e, GameEvent::BonusRevealed { .. })).count()
    }

    #[test]
    fn bonus_replacements_chain_until_a_playable_tile() {
        // (17 % 4) * 36 + 36 + 72 wraps to 0; the replacement cursor starts at
        // position 143 and walks down through all eight bonus serials
        let mut wall = Wall::new();
        wall.set_deal_start(18, 2).unwrap();
        assert_eq!(wall.cursor_position(Cursor::Replacement), 143);
        let sink = Shared::default();
        let mut game = Game::new(wall, 2, agents(ALL), Box::new(sink.clone()));

        let state = game.step(State::DrawReplacementTile { seat: 2 }).unwrap();
        assert_eq!(state, State::HandleSpecialTile { seat: 2 });
        assert_eq!(
            game.step(state).unwrap(),
            State::HaveWin { seat: 2, phase: Phase::DrawProcessing }
        );

        let hand = &game.hands()[2];
        assert_eq!(hand.bonus().len(), 8);
        assert_eq!(bonus_revealed(&sink), 8);
        assert!(!hand.has_bonus_tile());
        // serial 136 is the last white dragon, the first non-bonus tile below the bonus block
        assert_eq!(hand.concealed().len(), 1);
        assert_eq!(hand.last_drawn().map(|t| t.serial()), Some(136));
        assert_eq!(game.wall().remaining(), 144 - 9);
        assert!(hand.is_consistent());
    }

    #[test]
    fn initial_bonus_replacement_chains_too() {
        let mut wall = Wall::new();
        wall.set_deal_start(18, 2).unwrap();
        let winter = wall.take_next(Cursor::Replacement).unwrap();
        assert!(winter.is_bonus());
        let mut used = [0u8; KIND_COUNT];
        let hands = [
            Hand::new(0),
            Hand::new(1),
            Hand::with_concealed(2, tiles_from_glyphs("🀇🀈", &mut used).into_iter().chain([winter]))
                .unwrap(),
            Hand::new(3),
        ];
        let sink = Shared::default();
        let mut game = Game::with_hands(wall, hands, 2, agents(ALL), Box::new(sink.clone()));
        game.replace_initial_bonus().unwrap();

        let hand = &game.hands()[2];
        assert_eq!(hand.bonus().len(), 8);
        assert_eq!(hand.concealed().len(), 3);
        assert!(!hand.has_bonus_tile());
        assert_eq!(bonus_revealed(&sink), 8);
    }

    #[test]
    fn wall_running_out_mid_replacement_draws_the_game() {
        let mut wall = Wall::new();
        wall.set_deal_start(18, 2).unwrap();
        let sink = Shared::default();
        let mut game = Game::new(wall, 2, agents(ALL), Box::new(sink.clone()));
        game.deal().unwrap();
        // empty the forward end so only the eight bonus tiles at 136..143 remain
        while game.wall().remaining() > 8 {
            game.wall.take_next(Cursor::Draw).unwrap();
        }

        let state = game.step(State::DrawReplacementTile { seat: 3 }).unwrap();
        assert_eq!(state, State::HandleSpecialTile { seat: 3 });
        assert_eq!(game.step(state).unwrap(), State::DrawGame);
        assert!(matches!(sink.0.borrow().last(), Some(GameEvent::Exhausted { dealer: 2 })));

        let hand = &game.hands()[3];
        assert_eq!(hand.bonus().len(), 8);
        assert_eq!(hand.concealed().len(), 13);
        assert!(game.wall().is_exhausted());
        assert!(hand.is_consistent());
    }

    #[test]
    fn deal_gives_dealer_fourteen() {
        let mut wall = Wall::new();
        wall.shuffle(&mut StdRng::seed_from_u64(11)).unwrap();
        wall.set_deal_start(10, 2).unwrap();
        let sink = Shared::default();
        let mut game = Game::new(wall, 2, auto_agents(1), Box::new(sink.clone()));
        game.deal().unwrap();
        assert_eq!(game.wall().remaining(), 91);
        assert_eq!(sink.0.borrow().as_slice(), &[GameEvent::Dealt { remaining: 91 }]);
        for (seat, hand) in game.hands().iter().enumerate() {
            assert_eq!(hand.concealed().len(), if seat == 2 { 14 } else { 13 });
        }
        game.replace_initial_bonus().unwrap();
        let held: usize = game.hands().iter().map(|h| h.concealed().len() + h.bonus().len()).sum();
        assert_eq!(held + game.wall().remaining(), 144);
        assert!(game.hands().iter().all(|h| !h.has_bonus_tile() && h.is_consistent()));
        assert_eq!(game.opening_state(), State::HaveWin { seat: 2, phase: Phase::DrawProcessing });
    }

    #[test]
    fn seeded_game_runs_to_an_end() {
        for seed in 0..8 {
            let mut wall = Wall::new();
            wall.shuffle(&mut StdRng::seed_from_u64(seed)).unwrap();
            wall.set_deal_start(7, 1).unwrap();
            let mut game = Game::new(wall, 1, auto_agents(seed), Box::new(Vec::new()));
            game.deal().unwrap();
            game.replace_initial_bonus().unwrap();
            let start = game.opening_state();
            let end = game.run(start).unwrap();
            assert!(end.is_terminal());
            assert!(game.hands().iter().all(Hand::is_consistent));
            let placed: usize = game
                .hands()
                .iter()
                .map(|h| {
                    let shown: usize = h.exposed().iter().map(|m| m.tiles.len()).sum();
                    h.concealed().len() + h.bonus().len() + shown
                })
                .sum();
            assert_eq!(placed + game.discards().len() + game.wall().remaining(), 144);
        }
    }
}
