//! One game from shuffle to result.

use crate::agent::{AutoAgent, DecisionAgent, PromptAgent};
use crate::chance::{roll_three, Chance};
use crate::config::{ConfigError, SessionConfig};
use crate::events::{EventSink, GameEvent, LogSink};
use crate::game_state::{Game, GameError, State, PLAYERS};
use crate::wall::Wall;
use log::{debug, error};
use rand::rngs::OsRng;
use std::io::{self, BufReader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// `seat` is the winner, or the dealer who stays on after a drawn game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub won: bool,
    pub seat: usize,
}

pub struct Session {
    game: Game,
    state: State,
    die_sum: u8,
}

impl Session {
    /// Terminal prompts for the configured human seats, the heuristic for the rest.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let agents = std::array::from_fn(|seat| -> Box<dyn DecisionAgent> {
            if config.is_human(seat) {
                // one-byte buffer so seats sharing stdin never read ahead of each other
                Box::new(PromptAgent::new(BufReader::with_capacity(1, io::stdin()), io::stdout()))
            } else {
                Box::new(AutoAgent::new())
            }
        });
        Self::with_parts(config, Box::new(OsRng), agents, Box::new(LogSink))
    }

    pub fn with_parts(
        config: &SessionConfig,
        mut chance: Box<dyn Chance>,
        agents: [Box<dyn DecisionAgent>; PLAYERS],
        sink: Box<dyn EventSink>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let mut wall = Wall::new();
        wall.shuffle(chance.as_mut()).map_err(GameError::from)?;
        let die_sum = roll_three(chance.as_mut());
        let dealer = config.dealer.unwrap_or((die_sum as usize - 1) % PLAYERS);
        wall.set_deal_start(die_sum, dealer).map_err(GameError::from)?;
        debug!("dice {die_sum}, dealer {dealer}, deal starts at {:?}", wall.deal_start());

        let mut game = Game::new(wall, dealer, agents, sink);
        game.record(GameEvent::DiceRolled { sum: die_sum });
        game.record(GameEvent::Started { dealer });
        game.deal()?;
        game.replace_initial_bonus()?;
        let state = game.opening_state();
        Ok(Self { game, state, die_sum })
    }

    /// Plays until a win or an exhausted wall. Calling it again returns the same outcome.
    pub fn run(&mut self) -> Result<Outcome, GameError> {
        match self.game.run(self.state) {
            Ok(end) => {
                self.state = end;
                Ok(match end {
                    State::WinGame { seat } => Outcome { won: true, seat },
                    _ => Outcome { won: false, seat: self.game.dealer() },
                })
            }
            Err(e) => {
                error!("game aborted at seat {}: {e}", self.game.current_player());
                Err(e)
            }
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn die_sum(&self) -> u8 {
        self.die_sum
    }
}
