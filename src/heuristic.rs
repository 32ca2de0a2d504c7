//! Discard policy for unattended seats.
//!
//! Complete groups are set aside first, then pairs and partial runs are
//! retired in priority order. Each retired tile is also counted as
//! unavailable so a partial run is only kept when its missing tile can
//! still turn up. One of the tiles left over is discarded at random.

use crate::chance::Chance;
use crate::discard::DiscardPile;
use crate::hand::{Hand, TileCounts};
use crate::tiles::{Suit, TileKind};
use log::debug;

const NUMBER_SUITS: usize = 3;

struct Pool {
    held: [[u8; 10]; 4],
    unavailable: [[u8; 10]; 4],
    hidden: usize,
}

impl Pool {
    fn retire(&mut self, suit: usize, ranks: &[usize]) {
        for &r in ranks {
            self.held[suit][r] -= 1;
            self.unavailable[suit][r] += 1;
        }
        self.hidden -= ranks.len();
    }

    fn has(&self, suit: usize, ranks: &[usize], n: u8) -> bool {
        ranks.iter().all(|&r| self.held[suit][r] >= n)
    }

    fn remove_sets(&mut self) {
        for s in 0..4 {
            for j in 1..10 {
                if self.held[s][j] >= 3 {
                    self.retire(s, &[j, j, j]);
                } else if s < NUMBER_SUITS && j <= 7 && self.has(s, &[j, j + 1, j + 2], 1) {
                    self.retire(s, &[j, j + 1, j + 2]);
                }
            }
        }
    }

    fn remove_pairs(&mut self) {
        for s in 0..4 {
            for j in 1..10 {
                if self.hidden > 2 && self.held[s][j] >= 2 && self.unavailable[s][j] < 2 {
                    self.retire(s, &[j, j]);
                }
            }
        }
    }

    fn remove_middle_twos(&mut self) {
        for s in 0..NUMBER_SUITS {
            for j in 2..7 {
                let open = self.unavailable[s][j + 2] < 3 || self.unavailable[s][j - 1] < 3;
                if self.hidden > 2 && self.has(s, &[j, j + 1], 1) && open {
                    self.retire(s, &[j, j + 1]);
                }
            }
        }
    }

    fn remove_edge_twos(&mut self) {
        for s in 0..NUMBER_SUITS {
            if self.hidden > 2 && self.has(s, &[1, 2], 1) && self.unavailable[s][3] < 3 {
                self.retire(s, &[1, 2]);
            }
        }
        for s in 0..NUMBER_SUITS {
            if self.hidden > 2 && self.has(s, &[8, 9], 1) && self.unavailable[s][7] < 3 {
                self.retire(s, &[8, 9]);
            }
        }
    }

    fn remove_gapped_twos(&mut self) {
        for s in 0..NUMBER_SUITS {
            for j in 1..8 {
                let open = self.unavailable[s][j + 1] < 3;
                if self.hidden > 2 && self.has(s, &[j, j + 2], 1) && open {
                    self.retire(s, &[j, j + 2]);
                }
            }
        }
    }

    fn leftovers(&self) -> Vec<TileKind> {
        let mut out = Vec::new();
        for (s, suit) in Suit::PLAYABLE.into_iter().enumerate() {
            for rank in 1..=suit.max_rank() {
                if let Some(kind) = TileKind::new(suit, rank) {
                    out.extend(std::iter::repeat(kind).take(self.held[s][rank as usize] as usize));
                }
            }
        }
        out
    }
}

/// Tiles nobody can draw any more: the discard pile plus every exposed group.
pub fn unavailable_counts(discards: &DiscardPile, hands: &[Hand]) -> TileCounts {
    let mut counts = discards.counts(false);
    for h in hands {
        counts.merge(&h.public_counts());
    }
    counts
}

/// Kinds left after every group and promising partial group is set aside,
/// one entry per concealed tile.
pub fn discard_candidates(hand: &Hand, discards: &DiscardPile, hands: &[Hand]) -> Vec<TileKind> {
    let mut pool = Pool {
        held: hand.counts(None).grid(),
        unavailable: unavailable_counts(discards, hands).grid(),
        hidden: hand.concealed().len(),
    };

    pool.remove_sets();
    pool.remove_pairs();
    pool.remove_middle_twos();
    pool.remove_edge_twos();
    pool.remove_gapped_twos();
    pool.leftovers()
}

/// Slot of the concealed tile `hand` should discard. Falls back to slot 0.
pub fn discard_choice(
    hand: &Hand,
    discards: &DiscardPile,
    hands: &[Hand],
    chance: &mut dyn Chance,
) -> usize {
    let options = discard_candidates(hand, discards, hands);
    let listed: String = options.iter().map(|k| k.to_unicode()).collect();
    debug!("seat {}: discard candidates {listed}", hand.seat());
    if options.is_empty() {
        return 0;
    }
    let pick = options[chance.below(options.len())];
    // last copy of the kind, matching how slots are listed to a human
    hand.concealed().iter().rposition(|t| t.kind() == pick).unwrap_or(0)
}
