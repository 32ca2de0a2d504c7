// src/lib.rs
pub mod tiles;
pub mod chance;
pub mod wall;
pub mod hand;
pub mod discard;
pub mod evaluator;
pub mod heuristic;
pub mod agent;
pub mod events;
pub mod game_state;
pub mod config;
pub mod session;
#[cfg(feature = "python")]
mod python;

pub use tiles::{Suit, Tile, TileKind};
pub use chance::Chance;
pub use wall::{Cursor, Wall, WallError};
pub use hand::{Hand, HandError, Meld, SetKind, TileCounts, TileSet};
pub use discard::{DiscardPile, DiscardedTile};
pub use evaluator::{find_win, have_kong, have_pong, have_seq, have_win, Relation, WinShape};
pub use agent::{AutoAgent, DecisionAgent, PromptAgent, TableView};
pub use events::{EventSink, GameEvent, LogSink};
pub use game_state::{Game, GameError, Phase, State};
pub use config::{ConfigError, SessionConfig};
pub use session::{Outcome, Session, SessionError};
