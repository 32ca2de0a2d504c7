use crate::hand::TileCounts;
use crate::tiles::Tile;

/// A discarded tile and the seat that threw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardedTile {
    pub seat: usize,
    pub tile: Tile,
}

/// Append-only record of discards. Only the newest entry may be claimed.
#[derive(Debug, Clone, Default)]
pub struct DiscardPile(Vec<DiscardedTile>);

impl DiscardPile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, seat: usize, tile: Tile) {
        self.0.push(DiscardedTile { seat, tile });
    }

    pub fn last(&self) -> Option<DiscardedTile> {
        self.0.last().copied()
    }

    /// Removes the newest discard when another seat claims it.
    pub fn take_last(&mut self) -> Option<DiscardedTile> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscardedTile> {
        self.0.iter()
    }

    /// Rank counts of the pile, optionally leaving out the newest discard.
    pub fn counts(&self, ignore_last: bool) -> TileCounts {
        let n = if ignore_last { self.0.len().saturating_sub(1) } else { self.0.len() };
        TileCounts::from_kinds(self.0[..n].iter().map(|d| d.tile.kind()))
    }
}
