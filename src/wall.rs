use crate::chance::Chance;
use crate::tiles::{deck, Tile, TILES_IN_GAME};
use thiserror::Error;

// The initial deal walks three rounds of 16 (four tiles to each of four seats)
// and then a five-tile top-up; the draw cursor starts right after that block.
const ROUND_STRIDE: usize = 16;
const SEAT_STRIDE: usize = 4;
pub const INITIAL_DEAL_TILES: usize = ROUND_STRIDE * 3 + 5;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WallError {
    #[error("shuffling already attempted")]
    AlreadyShuffled,
    #[error("deal locations already set")]
    AlreadySet,
    #[error("sum of three dice is {0}, not between 3 and 18")]
    DieSumOutOfRange(u8),
    #[error("deal locations have not been set")]
    NotSet,
    #[error("no more tiles to deal")]
    Exhausted,
    #[error("expected a tile at wall position {0}, which is empty")]
    EmptySlot(usize),
}

/// Which end of the wall a draw comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Ordinary draws walk forward.
    Draw,
    /// Kong and bonus-tile replacements walk backward.
    Replacement,
}

pub struct Wall {
    slots: [Option<Tile>; TILES_IN_GAME],
    shuffled: bool,
    start: Option<usize>,
    draw_pos: usize,
    replacement_pos: usize,
    remaining: usize,
}

impl Default for Wall {
    fn default() -> Self {
        Self::new()
    }
}

impl Wall {
    /// Full, unshuffled wall in serial order.
    pub fn new() -> Self {
        let mut slots = [None; TILES_IN_GAME];
        for (slot, tile) in slots.iter_mut().zip(deck()) {
            *slot = Some(tile);
        }
        Self {
            slots,
            shuffled: false,
            start: None,
            draw_pos: 0,
            replacement_pos: 0,
            remaining: TILES_IN_GAME,
        }
    }

    /// A wall with nothing left to draw; every draw reports exhaustion.
    pub fn empty() -> Self {
        Self {
            slots: [None; TILES_IN_GAME],
            shuffled: true,
            start: Some(0),
            draw_pos: 0,
            replacement_pos: TILES_IN_GAME - 1,
            remaining: 0,
        }
    }

    /// Single Fisher-Yates pass; a wall can only be shuffled once.
    pub fn shuffle(&mut self, chance: &mut dyn Chance) -> Result<(), WallError> {
        if self.shuffled {
            return Err(WallError::AlreadyShuffled);
        }
        self.shuffled = true;
        for i in (1..TILES_IN_GAME).rev() {
            let k = chance.below(i + 1);
            self.slots.swap(i, k);
        }
        Ok(())
    }

    /// Fixes the deal start from the dice and the dealer's seat, then derives both cursors.
    pub fn set_deal_start(&mut self, die_sum: u8, dealer: usize) -> Result<(), WallError> {
        if !(3..=18).contains(&die_sum) {
            return Err(WallError::DieSumOutOfRange(die_sum));
        }
        if self.start.is_some() {
            return Err(WallError::AlreadySet);
        }
        let sum = die_sum as usize;
        let start = (((sum - 1) % 4) * 36 + sum * 2 + (dealer % 4) * 36) % TILES_IN_GAME;
        self.start = Some(start);
        self.draw_pos = (start + INITIAL_DEAL_TILES) % TILES_IN_GAME;
        self.replacement_pos = (start + TILES_IN_GAME - 1) % TILES_IN_GAME;
        Ok(())
    }

    /// Takes the tile for `slot` of `player` in dealing `round`.
    pub fn take_initial(
        &mut self,
        round: usize,
        player: usize,
        slot: usize,
    ) -> Result<Tile, WallError> {
        let start = self.start.ok_or(WallError::NotSet)?;
        if self.remaining == 0 {
            return Err(WallError::Exhausted);
        }
        let pos = (start + ROUND_STRIDE * round + SEAT_STRIDE * player + slot) % TILES_IN_GAME;
        let tile = self.slots[pos].take().ok_or(WallError::EmptySlot(pos))?;
        self.remaining -= 1;
        Ok(tile)
    }

    pub fn take_next(&mut self, cursor: Cursor) -> Result<Tile, WallError> {
        if self.start.is_none() {
            return Err(WallError::NotSet);
        }
        if self.remaining == 0 {
            return Err(WallError::Exhausted);
        }
        let pos = match cursor {
            Cursor::Draw => self.draw_pos,
            Cursor::Replacement => self.replacement_pos,
        };
        let tile = self.slots[pos].take().ok_or(WallError::EmptySlot(pos))?;
        self.remaining -= 1;
        match cursor {
            Cursor::Draw => self.draw_pos = (pos + 1) % TILES_IN_GAME,
            Cursor::Replacement => self.replacement_pos = (pos + TILES_IN_GAME - 1) % TILES_IN_GAME,
        }
        Ok(tile)
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn deal_start(&self) -> Option<usize> {
        self.start
    }

    pub fn cursor_position(&self, cursor: Cursor) -> usize {
        match cursor {
            Cursor::Draw => self.draw_pos,
            Cursor::Replacement => self.replacement_pos,
        }
    }

    pub fn slots(&self) -> &[Option<Tile>] {
        &self.slots
    }
}
