use crate::game_manager::AppState;
use goose_core::GameEvent;
use rand::Rng;
use shared::{ClientMessage, ServerMessage};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Delay before a scheduled bot roll, so clients can animate the turn.
/// Jittered so back-to-back bot turns do not look mechanical.
const BOT_THINK_DELAY_MS: RangeInclusive<u64> = 600..=1100;

impl AppState {
    /// Routes one decoded inbound frame to the queue or the game room.
    /// The router holds no state of its own.
    pub async fn dispatch(&self, player_id: String, msg: ClientMessage) {
        match msg {
            ClientMessage::PlayRandom => self.play_random(player_id).await,
            ClientMessage::CancelSearch => self.cancel_search(&player_id).await,
            ClientMessage::PlayBot => self.play_bot(player_id).await,
            ClientMessage::RollDice { game_id } => {
                self.handle_roll_dice(&player_id, &game_id).await;
            }
            ClientMessage::RequestRematch { game_id } => {
                self.handle_rematch(&player_id, &game_id).await;
            }
            ClientMessage::TurnTimeout { game_id } => {
                self.handle_turn_timeout(&player_id, &game_id).await;
            }
            ClientMessage::AbandonGame { game_id } => {
                self.handle_abandon(&player_id, &game_id).await;
            }
        }
    }

    /// Applies one server-drawn dice roll and the following turn advance
    /// as a single critical section under the room lock.
    pub async fn handle_roll_dice(&self, player_id: &str, game_id: &str) {
        let Some(room_lock) = self.games.get(game_id) else {
            self.reject(player_id, "unknown game");
            return;
        };
        let mut room = room_lock.write().await;
        let Some(engine_id) = room.engine_id_of(player_id) else {
            self.reject(player_id, "not seated in this game");
            return;
        };

        let dice = goose_core::roll_dice();
        match room.game.move_player(engine_id, dice) {
            Ok(mut events) => {
                events.extend(room.game.next_turn());
                room.last_activity = Instant::now();
                let seats = room.seat_ids();
                drop(room);
                self.dispatch_room_events(game_id, &seats, events);
            }
            Err(e) => {
                tracing::debug!(player_id = %player_id, game_id = %game_id, error = %e, "Roll rejected");
                drop(room);
                self.reject(player_id, &e.to_string());
            }
        }
    }

    /// The current player's client reported its turn timer expired; the
    /// move is forfeited and the turn advances.
    pub async fn handle_turn_timeout(&self, player_id: &str, game_id: &str) {
        let Some(room_lock) = self.games.get(game_id) else {
            return;
        };
        let mut room = room_lock.write().await;
        let engine_id = room.engine_id_of(player_id);
        if engine_id.is_none() || engine_id != room.game.current_player_id() {
            tracing::debug!(player_id = %player_id, game_id = %game_id, "Timeout from non-current player ignored");
            return;
        }

        tracing::info!(player_id = %player_id, game_id = %game_id, "Turn timed out");
        let events = room.game.next_turn();
        room.last_activity = Instant::now();
        let seats = room.seat_ids();
        drop(room);
        self.dispatch_room_events(game_id, &seats, events);
    }

    pub async fn handle_rematch(&self, player_id: &str, game_id: &str) {
        let Some(room_lock) = self.games.get(game_id) else {
            self.reject(player_id, "unknown game");
            return;
        };
        let mut room = room_lock.write().await;
        let Some(engine_id) = room.engine_id_of(player_id) else {
            self.reject(player_id, "not seated in this game");
            return;
        };

        match room.game.request_rematch(engine_id) {
            Ok(events) => {
                room.last_activity = Instant::now();
                let seats = room.seat_ids();
                drop(room);
                self.dispatch_room_events(game_id, &seats, events);
            }
            Err(e) => {
                drop(room);
                self.reject(player_id, &e.to_string());
            }
        }
    }

    /// Explicit abandon takes the same path as a disconnect for the
    /// room's sake; the connection itself stays open.
    pub async fn handle_abandon(&self, player_id: &str, game_id: &str) {
        let belongs = self
            .player_to_game
            .get(player_id)
            .is_some_and(|g| g.value() == game_id);
        if !belongs {
            tracing::debug!(player_id = %player_id, game_id = %game_id, "Abandon for a game the player is not in");
            return;
        }
        tracing::info!(player_id = %player_id, game_id = %game_id, "Player abandoned game");
        self.leave_active_game(player_id).await;
    }

    /// Removes the player's room, lets the engine settle the winner and
    /// notifies whoever is left. Safe to call when no game is active.
    pub async fn leave_active_game(&self, id: &str) {
        let Some((_, game_id)) = self.player_to_game.remove(id) else {
            return;
        };
        let Some((_, room_lock)) = self.games.remove(&game_id) else {
            return;
        };
        let mut room = room_lock.into_inner();
        let remaining: Vec<String> = room
            .seat_ids()
            .into_iter()
            .filter(|seat| seat != id)
            .collect();
        for seat in &remaining {
            self.player_to_game.remove(seat);
        }

        let events = match room.engine_id_of(id) {
            Some(engine_id) => room.game.handle_disconnect(engine_id),
            None => Vec::new(),
        };
        tracing::info!(player_id = %id, game_id = %game_id, "Game closed after player left");
        self.dispatch_room_events(&game_id, &remaining, events);
    }

    /// Maps engine events onto wire messages for the room's seats. A
    /// `BotTurnDue` also schedules the delayed bot roll.
    pub fn dispatch_room_events(&self, game_id: &str, seats: &[String], events: Vec<GameEvent>) {
        for event in events {
            let msg = match event {
                GameEvent::Moved {
                    player_id,
                    player_name,
                    dice,
                    new_position,
                    cell_type,
                    flavor,
                } => ServerMessage::MoveResult {
                    player_id,
                    player_name,
                    dice_result: dice,
                    new_position,
                    cell_type,
                    special_message: flavor,
                },
                GameEvent::TurnSkipped {
                    player_id,
                    player_name,
                    remaining,
                } => ServerMessage::SkipTurn {
                    player_id,
                    player_name,
                    turns_to_skip: remaining,
                },
                GameEvent::StateChanged {
                    players,
                    current_player,
                    dice,
                } => ServerMessage::GameUpdate {
                    players,
                    current_player,
                    dice_result: dice,
                },
                GameEvent::GameOver {
                    winner_id,
                    winner_name,
                } => ServerMessage::GameOver {
                    winner_id,
                    winner_name,
                },
                GameEvent::RematchStarted => ServerMessage::RematchStarted {
                    game_id: game_id.to_string(),
                },
                GameEvent::BotTurnDue => {
                    self.send_to_many(
                        seats,
                        &ServerMessage::BotTurn {
                            game_id: game_id.to_string(),
                        },
                    );
                    self.schedule_bot_move(game_id.to_string());
                    continue;
                }
            };
            self.send_to_many(seats, &msg);
        }
    }

    fn schedule_bot_move(&self, game_id: String) {
        if self.bot_jobs.send(game_id).is_err() {
            tracing::error!("Bot worker is gone, bot turn dropped");
        }
    }

    /// Worker owning the state that plays scheduled bot turns. Each job
    /// gets its own delay task so slow games do not stall each other.
    pub(super) fn spawn_bot_worker(
        self: Arc<Self>,
        mut jobs: tokio::sync::mpsc::UnboundedReceiver<String>,
    ) {
        tokio::spawn(async move {
            while let Some(game_id) = jobs.recv().await {
                let state = self.clone();
                let delay = rand::thread_rng().gen_range(BOT_THINK_DELAY_MS);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    state.run_bot_move(&game_id).await;
                });
            }
        });
    }

    /// Plays the bot's turn. The room may be gone by the time the delayed
    /// task fires; that is a quiet no-op.
    pub async fn run_bot_move(&self, game_id: &str) {
        let Some(room_lock) = self.games.get(game_id) else {
            return;
        };
        let mut room = room_lock.write().await;
        let dice = goose_core::roll_dice();
        match room.game.bot_move(dice) {
            Ok(events) => {
                room.last_activity = Instant::now();
                let seats = room.seat_ids();
                drop(room);
                self.dispatch_room_events(game_id, &seats, events);
            }
            Err(e) => {
                tracing::debug!(game_id = %game_id, error = %e, "Bot move skipped");
            }
        }
    }

    fn reject(&self, player_id: &str, message: &str) {
        self.send_to(
            player_id,
            &ServerMessage::Error {
                message: message.to_string(),
            },
        );
    }
}
