use crate::chance::Chance;
use crate::discard::DiscardPile;
use crate::hand::{Hand, TileSet};
use crate::heuristic;
use crate::tiles::Tile;
use log::warn;
use rand::rngs::OsRng;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

/// Read-only snapshot handed to an agent at each decision point.
pub struct TableView<'a> {
    pub seat: usize,
    pub hands: &'a [Hand; 4],
    pub discards: &'a DiscardPile,
    pub remaining: usize,
}

impl TableView<'_> {
    pub fn hand(&self) -> &Hand {
        &self.hands[self.seat]
    }

    /// Discards, wall count, every seat's shown tiles and the acting seat's concealed slots.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let pile: String = self.discards.iter().map(|d| d.tile.to_unicode()).collect();
        let _ = writeln!(out, "discards: {pile}");
        let _ = writeln!(out, "{} new tiles remain", self.remaining);
        for offset in [3, 2, 1, 0] {
            let h = &self.hands[(self.seat + offset) % 4];
            let shown: Vec<String> = h.exposed().iter().map(|m| m.set.to_string()).collect();
            let bonus: String = h.bonus().iter().map(|t| t.to_unicode()).collect();
            let _ = writeln!(out, "P{} shown: {} bonus: {}", h.seat(), shown.join(" "), bonus);
        }
        let slots: String = self
            .hand()
            .concealed()
            .iter()
            .enumerate()
            .map(|(i, t)| format!("({}{})", t.to_unicode(), i))
            .collect();
        let _ = writeln!(out, "{slots}");
        if let Some(t) = self.hand().last_drawn() {
            let _ = writeln!(out, "P{}-N: {}", self.seat, t.to_unicode());
        }
        out
    }
}

/// Makes every choice the state machine delegates to a seat.
///
/// Answers are advisory: an out-of-range index is treated as a decline
/// (claims) or as slot 0 (discards) by the caller.
pub trait DecisionAgent {
    /// `discard` is the claimable tile, `None` for a self-drawn win.
    fn take_win(&mut self, view: &TableView<'_>, discard: Option<Tile>) -> bool;
    fn choose_kong(&mut self, view: &TableView<'_>, options: &[TileSet]) -> Option<usize>;
    fn take_pong(&mut self, view: &TableView<'_>, pong: &TileSet) -> bool;
    fn choose_seq(&mut self, view: &TableView<'_>, options: &[TileSet]) -> Option<usize>;
    /// Concealed slot to throw away.
    fn choose_discard(&mut self, view: &TableView<'_>) -> Option<usize>;
}

/// Programmatic seat: claims everything it can and discards by heuristic.
pub struct AutoAgent {
    chance: Box<dyn Chance>,
}

impl Default for AutoAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoAgent {
    pub fn new() -> Self {
        Self::with_chance(Box::new(OsRng))
    }

    pub fn with_chance(chance: Box<dyn Chance>) -> Self {
        Self { chance }
    }
}

impl DecisionAgent for AutoAgent {
    fn take_win(&mut self, _view: &TableView<'_>, _discard: Option<Tile>) -> bool {
        true
    }

    fn choose_kong(&mut self, _view: &TableView<'_>, options: &[TileSet]) -> Option<usize> {
        (!options.is_empty()).then_some(0)
    }

    fn take_pong(&mut self, _view: &TableView<'_>, _pong: &TileSet) -> bool {
        true
    }

    fn choose_seq(&mut self, _view: &TableView<'_>, options: &[TileSet]) -> Option<usize> {
        (!options.is_empty()).then_some(0)
    }

    fn choose_discard(&mut self, view: &TableView<'_>) -> Option<usize> {
        let hand = view.hand();
        Some(heuristic::discard_choice(hand, view.discards, view.hands, self.chance.as_mut()))
    }
}

/// Interactive seat reading one line per decision.
pub struct PromptAgent<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptAgent<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, view: &TableView<'_>, question: &str) -> String {
        let shown = writeln!(self.output, "{}{question}", view.render())
            .and_then(|_| self.output.flush());
        if let Err(e) = shown {
            warn!("seat {}: could not write prompt: {e}", view.seat);
        }
        let mut line = String::new();
        if let Err(e) = self.input.read_line(&mut line) {
            warn!("seat {}: could not read answer: {e}", view.seat);
            line.clear();
        }
        line.trim().to_owned()
    }

    fn yes(&mut self, view: &TableView<'_>, question: &str) -> bool {
        let answer = self.ask(view, question);
        answer.is_empty() || answer == "y"
    }

    fn pick(&mut self, view: &TableView<'_>, question: &str, options: &[TileSet]) -> Option<usize> {
        let mut q = question.to_owned();
        for (i, o) in options.iter().enumerate() {
            let _ = write!(q, "\nOption {i}: {o}");
        }
        let answer = self.ask(view, &q);
        match answer.parse::<usize>() {
            Ok(i) if i < options.len() => Some(i),
            Ok(i) => {
                warn!("seat {}: option {i} out of range, declining", view.seat);
                None
            }
            Err(_) => None,
        }
    }
}

impl<R: BufRead, W: Write> DecisionAgent for PromptAgent<R, W> {
    fn take_win(&mut self, view: &TableView<'_>, discard: Option<Tile>) -> bool {
        let q = match discard {
            Some(t) => format!(
                "Player {}: You appear to have a win if you add in the discarded tile {t}. \
                 Do you take it? (y/n) [y]",
                view.seat
            ),
            None => {
                format!("Player {}: You appear to have a win. Do you take it? (y/n) [y]", view.seat)
            }
        };
        self.yes(view, &q)
    }

    fn choose_kong(&mut self, view: &TableView<'_>, options: &[TileSet]) -> Option<usize> {
        let q = format!(
            "Player {}: You appear to have a set of four. Do you take it, if so, which? (#) [n]",
            view.seat
        );
        self.pick(view, &q, options)
    }

    fn take_pong(&mut self, view: &TableView<'_>, pong: &TileSet) -> bool {
        let q = format!(
            "Player {}: You can have a pong of {pong} with the most recent discard. \
             Do you take it? (y/n) [y]",
            view.seat
        );
        self.yes(view, &q)
    }

    fn choose_seq(&mut self, view: &TableView<'_>, options: &[TileSet]) -> Option<usize> {
        let q = format!(
            "Player {}: Using the most recent discard you can form a sequence. \
             Do you take it, if so, which? (#) [n]",
            view.seat
        );
        self.pick(view, &q, options)
    }

    fn choose_discard(&mut self, view: &TableView<'_>) -> Option<usize> {
        let q = format!("Player {}: What do you want to discard? # [0]", view.seat);
        let answer = self.ask(view, &q);
        match answer.parse::<usize>() {
            Ok(i) => Some(i),
            Err(_) if answer.is_empty() => Some(0),
            Err(_) => {
                warn!("seat {}: unreadable discard {answer:?}, using slot 0", view.seat);
                Some(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{tiles_from_glyphs, TileKind, KIND_COUNT};
    use rand::{rngs::StdRng, SeedableRng};
    use std::io::Cursor;

    fn table() -> ([Hand; 4], DiscardPile) {
        let mut used = [0u8; KIND_COUNT];
        let h0 = Hand::with_concealed(0, tiles_from_glyphs("🀙🀚🀛🀆", &mut used)).unwrap();
        ([h0, Hand::new(1), Hand::new(2), Hand::new(3)], DiscardPile::new())
    }

    fn white_pong() -> TileSet {
        TileSet::triple(TileKind::try_from('🀆').unwrap())
    }

    fn runs() -> Vec<TileSet> {
        ['🀙', '🀚']
            .iter()
            .filter_map(|&c| TileSet::sequence(TileKind::try_from(c).unwrap()))
            .collect()
    }

    #[test]
    fn auto_agent_accepts_and_picks_first() {
        let (hands, pile) = table();
        let view = TableView { seat: 0, hands: &hands, discards: &pile, remaining: 50 };
        let mut agent = AutoAgent::with_chance(Box::new(StdRng::seed_from_u64(5)));
        assert!(agent.take_win(&view, None));
        assert!(agent.take_pong(&view, &white_pong()));
        assert_eq!(agent.choose_seq(&view, &runs()), Some(0));
        assert_eq!(agent.choose_kong(&view, &[]), None);
        // the run is kept, so the lone white goes
        assert_eq!(agent.choose_discard(&view), Some(3));
    }

    #[test]
    fn prompt_defaults_accept_claims() {
        let (hands, pile) = table();
        let view = TableView { seat: 0, hands: &hands, discards: &pile, remaining: 50 };
        let mut agent = PromptAgent::new(Cursor::new("\ny\nn\nY\n"), Vec::new());
        assert!(agent.take_win(&view, None));
        assert!(agent.take_pong(&view, &white_pong()));
        assert!(!agent.take_win(&view, None));
        // only a lowercase y accepts
        assert!(!agent.take_pong(&view, &white_pong()));
        let shown = String::from_utf8(agent.output).unwrap();
        assert!(shown.contains("(🀙0)(🀚1)(🀛2)(🀆3)"));
        assert!(shown.contains("50 new tiles remain"));
    }

    #[test]
    fn prompt_options_decline_on_bad_input() {
        let (hands, pile) = table();
        let view = TableView { seat: 0, hands: &hands, discards: &pile, remaining: 1 };
        let mut agent = PromptAgent::new(Cursor::new("1\n7\nn\n\n"), Vec::new());
        assert_eq!(agent.choose_seq(&view, &runs()), Some(1));
        assert_eq!(agent.choose_seq(&view, &runs()), None);
        assert_eq!(agent.choose_kong(&view, &runs()), None);
        assert_eq!(agent.choose_kong(&view, &runs()), None);
    }

    #[test]
    fn prompt_discard_falls_back_to_first_slot() {
        let (hands, pile) = table();
        let view = TableView { seat: 0, hands: &hands, discards: &pile, remaining: 1 };
        let mut agent = PromptAgent::new(Cursor::new("2\nabc\n"), Vec::new());
        assert_eq!(agent.choose_discard(&view), Some(2));
        assert_eq!(agent.choose_discard(&view), Some(0));
        // input exhausted reads as an empty line
        assert_eq!(agent.choose_discard(&view), Some(0));
    }
}
