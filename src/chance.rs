//! Randomness capability used for the shuffle, the dice and the discard heuristic.
//!
//! Anything implementing `rand::RngCore` qualifies. Sessions default to
//! `rand::rngs::OsRng`; tests seed a `StdRng`.

use rand::{Rng, RngCore};

pub trait Chance {
    /// Uniform in `0..bound`. `bound` must be non-zero.
    fn below(&mut self, bound: usize) -> usize;

    /// One fair six-sided die.
    fn roll_die(&mut self) -> u8 {
        self.below(6) as u8 + 1
    }
}

impl<R: RngCore + ?Sized> Chance for R {
    fn below(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

/// Sum of three dice, 3..=18.
pub fn roll_three(chance: &mut dyn Chance) -> u8 {
    (0..3).map(|_| chance.roll_die()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn dice_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let d = rng.roll_die();
            assert!((1..=6).contains(&d));
            let s = roll_three(&mut rng);
            assert!((3..=18).contains(&s));
        }
    }

    #[test]
    fn seeded_streams_repeat() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let xs: Vec<usize> = (0..20).map(|_| a.below(144)).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.below(144)).collect();
        assert_eq!(xs, ys);
    }
}
