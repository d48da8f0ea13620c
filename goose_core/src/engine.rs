use crate::board::{cell_at, flavor_text, CellType, FINAL_CELL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sentinel for "repeat the current player's turn immediately".
///
/// Repeat-turn cells must not cost a turn and must not be confused with
/// "skip N more turns", so the counter reserves a negative value instead
/// of growing a second field.
pub const REPEAT_TURN: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i32,
    pub name: String,
    pub position: u8,
    pub turns_to_skip: i32,
    pub is_bot: bool,
}

/// Alias kept for readability at the wire boundary: `gameUpdate` carries
/// plain roster snapshots.
pub type PlayerSnapshot = Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Finished,
}

/// Outbound events emitted by the engine. The engine never touches a
/// transport; the caller serializes and fans these out.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Moved {
        player_id: i32,
        player_name: String,
        dice: u8,
        new_position: u8,
        cell_type: CellType,
        flavor: String,
    },
    TurnSkipped {
        player_id: i32,
        player_name: String,
        remaining: i32,
    },
    StateChanged {
        players: Vec<Player>,
        current_player: i32,
        dice: Option<u8>,
    },
    GameOver {
        winner_id: i32,
        winner_name: String,
    },
    /// The current player is the bot; the caller should schedule a bot roll.
    BotTurnDue,
    RematchStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    NotStarted,
    AlreadyFinished,
    UnknownPlayer,
    NotYourTurn,
    NotABot,
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::NotStarted => "game has not started",
            Self::AlreadyFinished => "game is already finished",
            Self::UnknownPlayer => "unknown player id",
            Self::NotYourTurn => "not this player's turn",
            Self::NotABot => "current player is not the bot",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for GameError {}

/// Draws a uniform dice value in `[1, 6]`.
#[must_use]
pub fn roll_dice() -> u8 {
    use rand::Rng;
    rand::thread_rng().gen_range(1..=6)
}

/// One match of the goose game: roster (order = turn order), current-turn
/// index and lifecycle phase.
pub struct GooseGame {
    players: Vec<Player>,
    current: usize,
    phase: GamePhase,
    bot_mode: bool,
    rematch_votes: HashSet<i32>,
    last_dice: Option<u8>,
    next_id: i32,
}

impl Default for GooseGame {
    fn default() -> Self {
        Self::new()
    }
}

impl GooseGame {
    #[must_use]
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            current: 0,
            phase: GamePhase::NotStarted,
            bot_mode: false,
            rematch_votes: HashSet::new(),
            last_dice: None,
            next_id: 1,
        }
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn is_bot_mode(&self) -> bool {
        self.bot_mode
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Id of the player whose turn it is. `None` before the first start.
    #[must_use]
    pub fn current_player_id(&self) -> Option<i32> {
        self.players.get(self.current).map(|p| p.id)
    }

    #[must_use]
    pub fn current_player_is_bot(&self) -> bool {
        self.players.get(self.current).is_some_and(|p| p.is_bot)
    }

    fn add_player(&mut self, name: &str, is_bot: bool) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.players.push(Player {
            id,
            name: name.to_string(),
            position: 0,
            turns_to_skip: 0,
            is_bot,
        });
        id
    }

    /// Starts a game against the built-in bot. No-op if already started.
    pub fn start_bot_game(&mut self, host_name: &str) -> Vec<GameEvent> {
        if self.phase != GamePhase::NotStarted {
            return Vec::new();
        }
        self.add_player(host_name, false);
        self.add_player("Goose Bot", true);
        self.bot_mode = true;
        self.phase = GamePhase::InProgress;
        log::debug!("bot game started, host {host_name}");
        vec![self.snapshot()]
    }

    /// Starts a multiplayer game; call order of `names` is turn order.
    /// No-op if already started.
    pub fn start_multiplayer<'a, I>(&mut self, names: I) -> Vec<GameEvent>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.phase != GamePhase::NotStarted {
            return Vec::new();
        }
        for name in names {
            self.add_player(name, false);
        }
        if self.players.is_empty() {
            return Vec::new();
        }
        self.phase = GamePhase::InProgress;
        log::debug!("multiplayer game started, {} players", self.players.len());
        vec![self.snapshot()]
    }

    fn snapshot(&self) -> GameEvent {
        GameEvent::StateChanged {
            players: self.players.clone(),
            current_player: self.current_player_id().unwrap_or(0),
            dice: self.last_dice,
        }
    }

    fn index_of(&self, player_id: i32) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    /// Applies one dice roll for `player_id` and returns the events to
    /// broadcast. The caller advances the turn afterwards with
    /// [`Self::next_turn`].
    pub fn move_player(
        &mut self,
        player_id: i32,
        dice: u8,
    ) -> Result<Vec<GameEvent>, GameError> {
        match self.phase {
            GamePhase::NotStarted => return Err(GameError::NotStarted),
            GamePhase::Finished => return Err(GameError::AlreadyFinished),
            GamePhase::InProgress => {}
        }
        let idx = self.index_of(player_id).ok_or(GameError::UnknownPlayer)?;
        if idx != self.current {
            return Err(GameError::NotYourTurn);
        }

        let mut events = Vec::new();
        self.last_dice = Some(dice);

        if self.players[idx].turns_to_skip > 0 {
            // Forced skip consumes the roll without movement.
            self.players[idx].turns_to_skip -= 1;
            events.push(GameEvent::TurnSkipped {
                player_id,
                player_name: self.players[idx].name.clone(),
                remaining: self.players[idx].turns_to_skip,
            });
            events.push(self.snapshot());
            return Ok(events);
        }

        let landing = u16::from(self.players[idx].position) + u16::from(dice);
        if landing >= u16::from(FINAL_CELL) {
            // Overshoot clamps to the goal and wins outright.
            self.players[idx].position = FINAL_CELL;
            let winner_id = self.players[idx].id;
            let winner_name = self.players[idx].name.clone();
            events.push(GameEvent::Moved {
                player_id,
                player_name: winner_name.clone(),
                dice,
                new_position: FINAL_CELL,
                cell_type: cell_at(FINAL_CELL).cell_type,
                flavor: "You reached the final cell!".to_string(),
            });
            self.phase = GamePhase::Finished;
            events.push(GameEvent::GameOver {
                winner_id,
                winner_name,
            });
            events.push(self.snapshot());
            return Ok(events);
        }

        #[allow(clippy::cast_possible_truncation)]
        let cell = cell_at(landing as u8);
        let mover_is_bot = self.players[idx].is_bot;
        if cell.cell_type.is_passive() {
            self.players[idx].position = cell.index;
        } else {
            self.players[idx].position = cell.target;
            if cell.cell_type.repeats_turn() {
                self.players[idx].turns_to_skip = REPEAT_TURN;
            } else {
                let penalty = cell.cell_type.skip_penalty();
                if penalty > 0 {
                    self.players[idx].turns_to_skip = penalty;
                }
                // Labyrinth and Death only relocate; target covers it.
            }
        }

        events.push(GameEvent::Moved {
            player_id,
            player_name: self.players[idx].name.clone(),
            dice,
            new_position: self.players[idx].position,
            cell_type: cell.cell_type,
            flavor: flavor_text(cell),
        });
        events.push(self.snapshot());
        if cell.cell_type.repeats_turn() && self.bot_mode && mover_is_bot {
            events.push(GameEvent::BotTurnDue);
        }
        Ok(events)
    }

    /// Ends the current turn. A repeat sentinel keeps the index in place;
    /// players with pending skips are passed over (each pass consumes one
    /// skip) in a loop bounded by the roster size.
    pub fn next_turn(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.phase != GamePhase::InProgress || self.players.is_empty() {
            return events;
        }

        if self.players[self.current].turns_to_skip == REPEAT_TURN {
            self.players[self.current].turns_to_skip = 0;
            events.push(self.snapshot());
            return events;
        }

        for _ in 0..self.players.len() {
            self.current = (self.current + 1) % self.players.len();
            let p = &mut self.players[self.current];
            if p.turns_to_skip > 0 {
                p.turns_to_skip -= 1;
                events.push(GameEvent::TurnSkipped {
                    player_id: p.id,
                    player_name: p.name.clone(),
                    remaining: p.turns_to_skip,
                });
                continue;
            }
            break;
        }

        events.push(self.snapshot());
        if self.current_player_is_bot() {
            events.push(GameEvent::BotTurnDue);
        }
        events
    }

    /// Plays the bot's turn with the supplied dice value and advances.
    pub fn bot_move(&mut self, dice: u8) -> Result<Vec<GameEvent>, GameError> {
        if !self.current_player_is_bot() {
            return Err(GameError::NotABot);
        }
        let bot_id = self.current_player_id().ok_or(GameError::NotStarted)?;
        let mut events = self.move_player(bot_id, dice)?;
        if self.phase == GamePhase::InProgress {
            events.extend(self.next_turn());
        }
        Ok(events)
    }

    /// Removes a departed player. In bot mode the bot wins by forfeit; in
    /// multiplayer the last player standing wins.
    pub fn handle_disconnect(&mut self, player_id: i32) -> Vec<GameEvent> {
        if self.phase == GamePhase::Finished {
            return Vec::new();
        }
        let Some(idx) = self.index_of(player_id) else {
            return Vec::new();
        };

        if self.bot_mode {
            if let Some(bot) = self.players.iter().find(|p| p.is_bot) {
                let (id, name) = (bot.id, bot.name.clone());
                return self.declare_winner_inner(id, name);
            }
            return Vec::new();
        }

        self.players.remove(idx);
        self.rematch_votes.remove(&player_id);
        if idx < self.current || self.current >= self.players.len() {
            self.current = self.current.saturating_sub(1);
        }
        if self.players.len() == 1 {
            let (id, name) = (self.players[0].id, self.players[0].name.clone());
            return self.declare_winner_inner(id, name);
        }
        vec![self.snapshot()]
    }

    pub fn declare_winner(&mut self, player_id: i32) -> Result<Vec<GameEvent>, GameError> {
        if self.phase == GamePhase::Finished {
            return Err(GameError::AlreadyFinished);
        }
        let idx = self.index_of(player_id).ok_or(GameError::UnknownPlayer)?;
        let name = self.players[idx].name.clone();
        Ok(self.declare_winner_inner(player_id, name))
    }

    fn declare_winner_inner(&mut self, winner_id: i32, winner_name: String) -> Vec<GameEvent> {
        self.phase = GamePhase::Finished;
        log::debug!("game over, winner {winner_id}");
        vec![GameEvent::GameOver {
            winner_id,
            winner_name,
        }]
    }

    /// Records a rematch request; when every roster member has asked, the
    /// board resets and play resumes with the first player.
    pub fn request_rematch(&mut self, player_id: i32) -> Result<Vec<GameEvent>, GameError> {
        let _ = self.index_of(player_id).ok_or(GameError::UnknownPlayer)?;
        self.rematch_votes.insert(player_id);
        let all_agreed = self
            .players
            .iter()
            .all(|p| p.is_bot || self.rematch_votes.contains(&p.id));
        if !all_agreed {
            return Ok(Vec::new());
        }

        self.rematch_votes.clear();
        for p in &mut self.players {
            p.position = 0;
            p.turns_to_skip = 0;
        }
        self.current = 0;
        self.last_dice = None;
        self.phase = GamePhase::InProgress;
        log::debug!("rematch started");
        Ok(vec![GameEvent::RematchStarted, self.snapshot()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_game() -> GooseGame {
        let mut game = GooseGame::new();
        game.start_multiplayer(["alice", "bob"]);
        game
    }

    #[test]
    fn start_is_idempotent() {
        let mut game = two_player_game();
        assert_eq!(game.phase(), GamePhase::InProgress);
        assert!(game.start_multiplayer(["mallory"]).is_empty());
        assert_eq!(game.players().len(), 2);
    }

    #[test]
    fn empty_roster_start_is_a_noop() {
        let mut game = GooseGame::new();
        assert!(game.start_multiplayer(Vec::<&str>::new()).is_empty());
        assert_eq!(game.phase(), GamePhase::NotStarted);
        assert!(game.players().is_empty());
    }

    #[test]
    fn move_out_of_turn_is_rejected() {
        let mut game = two_player_game();
        assert_eq!(game.move_player(2, 3), Err(GameError::NotYourTurn));
    }

    #[test]
    fn repeat_sentinel_keeps_the_turn() {
        let mut game = two_player_game();
        // alice from 0 rolls 5 -> goose cell 5 -> jumps to 9, repeat turn.
        let events = game.move_player(1, 5).unwrap();
        assert!(matches!(
            events.first(),
            Some(GameEvent::Moved {
                new_position: 9,
                cell_type: CellType::Goose,
                ..
            })
        ));
        assert_eq!(game.players()[0].turns_to_skip, REPEAT_TURN);

        let events = game.next_turn();
        assert_eq!(game.current_player_id(), Some(1));
        assert_eq!(game.players()[0].turns_to_skip, 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn jail_costs_two_full_rounds() {
        let mut game = two_player_game();
        game.players[0].position = 48;
        game.move_player(1, 4).unwrap(); // 48 + 4 = 52, jail
        assert_eq!(game.players[0].turns_to_skip, 2);
        game.next_turn();
        assert_eq!(game.current_player_id(), Some(2));

        // bob plays; advancing past alice consumes one skip each round.
        game.move_player(2, 1).unwrap();
        let events = game.next_turn();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TurnSkipped { player_id: 1, .. })));
        assert_eq!(game.current_player_id(), Some(2));
        assert_eq!(game.players[0].turns_to_skip, 1);

        game.move_player(2, 1).unwrap();
        game.next_turn();
        assert_eq!(game.players[0].turns_to_skip, 0);
        assert_eq!(game.current_player_id(), Some(2));

        game.move_player(2, 1).unwrap();
        game.next_turn();
        assert_eq!(game.current_player_id(), Some(1));
    }

    #[test]
    fn inn_costs_exactly_one_round() {
        let mut game = two_player_game();
        game.players[0].position = 16;
        game.move_player(1, 3).unwrap(); // 16 + 3 = 19, inn
        assert_eq!(game.players[0].turns_to_skip, 1);
        game.next_turn();

        game.move_player(2, 1).unwrap();
        game.next_turn();
        assert_eq!(game.current_player_id(), Some(2));

        game.move_player(2, 1).unwrap();
        game.next_turn();
        assert_eq!(game.current_player_id(), Some(1));
    }

    #[test]
    fn roll_while_skipping_consumes_without_moving() {
        let mut game = two_player_game();
        game.players[0].position = 10;
        game.players[0].turns_to_skip = 1;
        let events = game.move_player(1, 6).unwrap();
        assert_eq!(game.players[0].position, 10);
        assert_eq!(game.players[0].turns_to_skip, 0);
        assert!(matches!(
            events.first(),
            Some(GameEvent::TurnSkipped {
                player_id: 1,
                remaining: 0,
                ..
            })
        ));
    }

    #[test]
    fn overshoot_clamps_and_finishes() {
        let mut game = two_player_game();
        game.players[0].position = 60;
        let events = game.move_player(1, 6).unwrap();
        assert_eq!(game.phase(), GamePhase::Finished);
        assert_eq!(game.players[0].position, FINAL_CELL);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { winner_id: 1, .. })));
        assert_eq!(game.move_player(2, 1), Err(GameError::AlreadyFinished));
    }

    #[test]
    fn exact_landing_on_the_goal_wins_too() {
        let mut game = two_player_game();
        game.players[0].position = 57;
        let events = game.move_player(1, 6).unwrap();
        assert_eq!(game.players[0].position, FINAL_CELL);
        assert_eq!(game.phase(), GamePhase::Finished);
        assert!(matches!(
            events.first(),
            Some(GameEvent::Moved {
                new_position: FINAL_CELL,
                ..
            })
        ));
    }

    #[test]
    fn goose_at_59_flies_to_the_goal_without_winning() {
        // Landing on 59 is a jump to 63 via the goose table, not a clamp,
        // so the game is not over and the mover keeps the turn.
        let mut game = two_player_game();
        game.players[0].position = 57;
        let events = game.move_player(1, 2).unwrap();
        assert_eq!(game.players[0].position, FINAL_CELL);
        assert_eq!(game.players[0].turns_to_skip, REPEAT_TURN);
        assert_eq!(game.phase(), GamePhase::InProgress);
        assert!(matches!(
            events.first(),
            Some(GameEvent::Moved {
                new_position: FINAL_CELL,
                cell_type: CellType::Goose,
                ..
            })
        ));
    }

    #[test]
    fn bot_mode_human_at_57_rolls_2_and_flies_home() {
        let mut game = GooseGame::new();
        game.start_bot_game("alice");
        game.players[0].position = 57;
        let events = game.move_player(1, 2).unwrap();
        assert_eq!(game.players[0].position, FINAL_CELL);
        assert_eq!(game.players[0].turns_to_skip, REPEAT_TURN);
        assert!(matches!(
            events.first(),
            Some(GameEvent::Moved {
                player_id: 1,
                dice: 2,
                new_position: FINAL_CELL,
                cell_type: CellType::Goose,
                ..
            })
        ));
        // The mover keeps the turn; the follow-up roll wins from the goal.
        game.next_turn();
        assert_eq!(game.current_player_id(), Some(1));
        game.move_player(1, 1).unwrap();
        assert_eq!(game.phase(), GamePhase::Finished);
    }

    #[test]
    fn death_cell_sends_back_to_start() {
        let mut game = two_player_game();
        game.players[0].position = 57;
        let events = game.move_player(1, 1).unwrap();
        assert_eq!(game.players[0].position, 0);
        assert!(matches!(
            events.first(),
            Some(GameEvent::Moved {
                cell_type: CellType::Death,
                new_position: 0,
                ..
            })
        ));
    }

    #[test]
    fn labyrinth_relocates_without_penalty() {
        let mut game = two_player_game();
        game.players[0].position = 40;
        game.move_player(1, 2).unwrap(); // 42, labyrinth -> 30
        assert_eq!(game.players[0].position, 30);
        assert_eq!(game.players[0].turns_to_skip, 0);
    }

    #[test]
    fn bot_forfeit_on_human_disconnect() {
        let mut game = GooseGame::new();
        game.start_bot_game("alice");
        let events = game.handle_disconnect(1);
        assert_eq!(game.phase(), GamePhase::Finished);
        assert!(matches!(
            events.first(),
            Some(GameEvent::GameOver { winner_id: 2, .. })
        ));
    }

    #[test]
    fn last_player_standing_wins() {
        let mut game = two_player_game();
        let events = game.handle_disconnect(2);
        assert_eq!(game.phase(), GamePhase::Finished);
        assert!(matches!(
            events.first(),
            Some(GameEvent::GameOver { winner_id: 1, .. })
        ));
    }

    #[test]
    fn rematch_needs_every_human() {
        let mut game = two_player_game();
        game.move_player(1, 1).unwrap();
        game.next_turn();
        game.declare_winner(2).unwrap();

        assert!(game.request_rematch(1).unwrap().is_empty());
        assert_eq!(game.phase(), GamePhase::Finished);

        let events = game.request_rematch(2).unwrap();
        assert_eq!(game.phase(), GamePhase::InProgress);
        assert!(matches!(events.first(), Some(GameEvent::RematchStarted)));
        assert!(game.players().iter().all(|p| p.position == 0));
        assert_eq!(game.current_player_id(), Some(1));
    }

    #[test]
    fn bot_rematch_needs_only_the_human() {
        let mut game = GooseGame::new();
        game.start_bot_game("alice");
        game.declare_winner(2).unwrap();
        let events = game.request_rematch(1).unwrap();
        assert_eq!(game.phase(), GamePhase::InProgress);
        assert!(matches!(events.first(), Some(GameEvent::RematchStarted)));
    }
}
