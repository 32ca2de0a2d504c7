//! Table setup read from YAML or from the legacy integer dealer argument.

use crate::game_state::PLAYERS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("dealer seat {0} is not in 0..4")]
    InvalidDealer(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Fixed dealer seat; `None` rolls the dice to decide.
    #[serde(default)]
    pub dealer: Option<usize>,
    /// Seats answered from the terminal instead of the heuristic.
    #[serde(default)]
    pub human_seats: [bool; PLAYERS],
}

impl SessionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// `-1` means roll for the dealer, `0..4` fixes the seat.
    pub fn from_dealer_arg(dealer: i32, human_seats: [bool; PLAYERS]) -> Result<Self, ConfigError> {
        let dealer = match dealer {
            -1 => None,
            d if (0..PLAYERS as i32).contains(&d) => Some(d as usize),
            d => return Err(ConfigError::InvalidDealer(d.into())),
        };
        Ok(Self { dealer, human_seats })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.dealer {
            Some(d) if d >= PLAYERS => Err(ConfigError::InvalidDealer(d as i64)),
            _ => Ok(()),
        }
    }

    pub fn is_human(&self, seat: usize) -> bool {
        self.human_seats.get(seat).copied().unwrap_or(false)
    }
}
