use serde::{Deserialize, Serialize};

/// Index of the goal cell. Landing on or past it wins the game.
pub const FINAL_CELL: u8 = 63;

/// Cell the labyrinth sends you back to.
pub const LABYRINTH_RECOVERY: u8 = 30;

/// First cell of the track.
pub const START_CELL: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellType {
    Normal,
    Start,
    Goose,
    Bridge,
    Inn,
    Well,
    Jail,
    Labyrinth,
    Death,
    Dice,
    // Serpentine-layout direction markers; no gameplay effect.
    ArrowUp,
    ArrowDown,
}

impl CellType {
    /// True for cells that grant the mover another turn (`de oca a oca`).
    #[must_use]
    pub const fn repeats_turn(self) -> bool {
        matches!(self, Self::Goose | Self::Bridge | Self::Dice)
    }

    /// Number of forced skips the cell imposes, if any.
    ///
    /// The classic rulebook says the well costs two turns and the jail
    /// three; the behavior shipped by the original server is one and two
    /// respectively, and that effective behavior is what we reproduce.
    #[must_use]
    pub const fn skip_penalty(self) -> i32 {
        match self {
            Self::Inn | Self::Well => 1,
            Self::Jail => 2,
            _ => 0,
        }
    }

    /// True when landing on the cell leaves the player where they landed.
    #[must_use]
    pub const fn is_passive(self) -> bool {
        matches!(
            self,
            Self::Normal | Self::Start | Self::ArrowUp | Self::ArrowDown
        )
    }
}

/// One board cell: its type tag and the cell the effect sends you to
/// (the cell's own index for no-op types).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub index: u8,
    pub cell_type: CellType,
    pub target: u8,
}

/// Static cell table lookup. The board is immutable and shared by every
/// game, so there is no per-game copy.
#[must_use]
pub const fn cell_at(index: u8) -> Cell {
    let (cell_type, target) = match index {
        0 => (CellType::Start, 0),
        // Geese jump forward to the next goose cell; the last one lands
        // straight on the goal.
        5 => (CellType::Goose, 9),
        9 => (CellType::Goose, 14),
        14 => (CellType::Goose, 18),
        18 => (CellType::Goose, 23),
        23 => (CellType::Goose, 27),
        27 => (CellType::Goose, 32),
        32 => (CellType::Goose, 36),
        36 => (CellType::Goose, 41),
        41 => (CellType::Goose, 45),
        45 => (CellType::Goose, 50),
        50 => (CellType::Goose, 54),
        54 => (CellType::Goose, 59),
        59 => (CellType::Goose, FINAL_CELL),
        6 => (CellType::Bridge, 12),
        19 => (CellType::Inn, 19),
        26 => (CellType::Dice, 53),
        53 => (CellType::Dice, 26),
        31 => (CellType::Well, 31),
        42 => (CellType::Labyrinth, LABYRINTH_RECOVERY),
        52 => (CellType::Jail, 52),
        58 => (CellType::Death, START_CELL),
        7 | 39 | 55 => (CellType::ArrowUp, index),
        15 | 47 => (CellType::ArrowDown, index),
        _ => (CellType::Normal, index),
    };
    Cell {
        index,
        cell_type,
        target,
    }
}

/// Human-readable flavor text for the move-result broadcast.
#[must_use]
pub fn flavor_text(cell: Cell) -> String {
    match cell.cell_type {
        CellType::Goose => format!("Goose! Fly ahead to cell {} and roll again", cell.target),
        CellType::Bridge => format!("The bridge carries you to cell {}, roll again", cell.target),
        CellType::Inn => "You stop at the inn and lose a turn".to_string(),
        CellType::Well => "You fall into the well and lose a turn".to_string(),
        CellType::Jail => "Jail! You sit out the next two turns".to_string(),
        CellType::Labyrinth => {
            format!("Lost in the labyrinth, back to cell {}", cell.target)
        }
        CellType::Death => "Death. Back to the start".to_string(),
        CellType::Dice => format!("The dice send you to cell {}, roll again", cell.target),
        CellType::Normal | CellType::Start | CellType::ArrowUp | CellType::ArrowDown => {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goose_cells_chain_to_the_goal() {
        let geese = [5u8, 9, 14, 18, 23, 27, 32, 36, 41, 45, 50, 54, 59];
        for pair in geese.windows(2) {
            let cell = cell_at(pair[0]);
            assert_eq!(cell.cell_type, CellType::Goose);
            assert_eq!(cell.target, pair[1]);
        }
        assert_eq!(cell_at(59).target, FINAL_CELL);
    }

    #[test]
    fn passive_cells_target_themselves() {
        for idx in 0..=FINAL_CELL {
            let cell = cell_at(idx);
            if cell.cell_type.is_passive() || cell.cell_type.skip_penalty() > 0 {
                assert_eq!(cell.target, idx, "cell {idx} must be a no-op target");
            }
        }
    }

    #[test]
    fn effect_targets_stay_on_the_board() {
        for idx in 0..=FINAL_CELL {
            assert!(cell_at(idx).target <= FINAL_CELL);
        }
    }

    #[test]
    fn hazards_match_the_published_table() {
        assert_eq!(cell_at(6).target, 12);
        assert_eq!(cell_at(26).target, 53);
        assert_eq!(cell_at(53).target, 26);
        assert_eq!(cell_at(42).target, LABYRINTH_RECOVERY);
        assert_eq!(cell_at(58).target, START_CELL);
        assert_eq!(cell_at(19).cell_type.skip_penalty(), 1);
        assert_eq!(cell_at(31).cell_type.skip_penalty(), 1);
        assert_eq!(cell_at(52).cell_type.skip_penalty(), 2);
    }
}
