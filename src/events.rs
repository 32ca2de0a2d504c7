//! Audit trail of notable table events. Purely observational: the game never reads it back.

use crate::evaluator::WinShape;
use crate::hand::TileSet;
use crate::tiles::Tile;
use crate::wall::Cursor;
use log::info;
use std::fmt;

pub const AUDIT_TARGET: &str = "mahjong::audit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started { dealer: usize },
    DiceRolled { sum: u8 },
    Dealt { remaining: usize },
    BonusRevealed { seat: usize, bonus: Tile },
    Drew { seat: usize, tile: Tile, cursor: Cursor },
    Discarded { seat: usize, tile: Tile },
    Claimed { seat: usize, from: usize, set: TileSet, tile: Tile },
    /// A kong formed from the seat's own tiles.
    Declared { seat: usize, set: TileSet },
    Won { seat: usize, shape: WinShape },
    Exhausted { dealer: usize },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::Started { dealer } => write!(f, "game started, dealer P{dealer}"),
            GameEvent::DiceRolled { sum } => write!(f, "dice roll: {sum}"),
            GameEvent::Dealt { remaining } => {
                write!(f, "initial deal done, {remaining} tiles remain")
            }
            GameEvent::BonusRevealed { seat, bonus } => write!(f, "P{seat} revealed bonus {bonus}"),
            GameEvent::Drew { seat, tile, cursor } => match cursor {
                Cursor::Draw => write!(f, "P{seat} drew {tile}"),
                Cursor::Replacement => write!(f, "P{seat} drew as replacement {tile}"),
            },
            GameEvent::Discarded { seat, tile } => write!(f, "P{seat} discarded {tile}"),
            GameEvent::Claimed { seat, from, set, tile } => {
                write!(f, "P{seat} claimed {tile} from P{from} for {set}")
            }
            GameEvent::Declared { seat, set } => write!(f, "P{seat} declared {set}"),
            GameEvent::Won { seat, shape } => match shape {
                WinShape::Special { pair } => {
                    write!(f, "P{seat} won with the thirteen, pair {pair}")
                }
                WinShape::Standard { eye, sets } => {
                    write!(f, "P{seat} won, eye {eye}{eye}")?;
                    for s in sets {
                        write!(f, " {s}")?;
                    }
                    Ok(())
                }
            },
            GameEvent::Exhausted { dealer } => write!(f, "wall exhausted, dealer P{dealer} stays"),
        }
    }
}

pub trait EventSink {
    fn record(&mut self, event: &GameEvent);
}

/// Writes each event through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: &GameEvent) {
        info!(target: AUDIT_TARGET, "{event}");
    }
}

impl EventSink for Vec<GameEvent> {
    fn record(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}
