pub mod board;
pub mod engine;

pub use board::{cell_at, Cell, CellType, FINAL_CELL};
pub use engine::{roll_dice, GameError, GameEvent, GamePhase, GooseGame, Player, PlayerSnapshot};
