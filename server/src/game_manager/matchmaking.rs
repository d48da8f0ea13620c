use crate::game_manager::{AppState, GameRoom};
use goose_core::GooseGame;
use shared::ServerMessage;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

impl AppState {
    /// Puts the caller in the matchmaking queue and attempts a pairing.
    /// Enqueueing is idempotent; a caller already in a game is ignored.
    pub async fn play_random(&self, player_id: String) {
        if self.player_to_game.contains_key(&player_id) {
            tracing::warn!(player_id = %player_id, "Player already in game, ignoring playRandom");
            return;
        }

        let mut queue = self.waiting.lock().await;
        if queue.contains(&player_id) {
            tracing::debug!(player_id = %player_id, "Player already in queue");
        } else {
            queue.push_back(player_id.clone());
            tracing::info!(player_id = %player_id, queued = queue.len(), "Player joined queue");
        }
        // Pairing stays under the queue lock so a concurrent enqueue can
        // never observe a half-paired queue. Only channel sends happen
        // here; socket I/O lives in the writer tasks.
        self.try_pair_locked(&mut queue);
    }

    /// Removes every queue occurrence of the caller. Unknown ids are a
    /// silent no-op.
    pub async fn cancel_search(&self, player_id: &str) {
        let mut queue = self.waiting.lock().await;
        let before = queue.len();
        queue.retain(|id| id != player_id);
        if queue.len() != before {
            tracing::info!(player_id = %player_id, "Player left queue");
        }
    }

    fn try_pair_locked(&self, queue: &mut VecDeque<String>) {
        // Prune entries whose writer channel is gone; they disconnected
        // while waiting and must never be paired.
        queue.retain(|id| {
            self.sessions
                .get(id)
                .is_some_and(|session| !session.tx.is_closed())
        });

        let status = ServerMessage::WaitingStatus {
            players_in_queue: queue.len(),
            total_players: self.active.load(Ordering::SeqCst),
        };
        for id in queue.iter() {
            self.send_to(id, &status);
        }

        if queue.len() < 2 {
            return;
        }
        let (Some(first), Some(second)) = (queue.pop_front(), queue.pop_front()) else {
            return;
        };
        self.start_paired_game(first, second);
    }

    /// Creates the room for exactly the two oldest waiters and tells each
    /// who they face.
    fn start_paired_game(&self, first: String, second: String) {
        let game_id = Uuid::new_v4().to_string();
        let first_name = self.display_name(&first);
        let second_name = self.display_name(&second);

        let mut game = GooseGame::new();
        let events = game.start_multiplayer([first_name.as_str(), second_name.as_str()]);
        let seats: HashMap<i32, String> = game
            .players()
            .iter()
            .map(|p| p.id)
            .zip([first.clone(), second.clone()])
            .collect();

        tracing::info!(game_id = %game_id, first = %first, second = %second, "Created multiplayer game");

        let room = GameRoom::new(game, seats);
        let seat_ids = room.seat_ids();
        self.games.insert(game_id.clone(), RwLock::new(room));
        self.player_to_game.insert(first.clone(), game_id.clone());
        self.player_to_game.insert(second.clone(), game_id.clone());

        self.send_to(
            &first,
            &ServerMessage::GameReady {
                game_id: game_id.clone(),
                opponent_id: second.clone(),
            },
        );
        self.send_to(
            &second,
            &ServerMessage::GameReady {
                game_id: game_id.clone(),
                opponent_id: first,
            },
        );
        self.dispatch_room_events(&game_id, &seat_ids, events);
    }

    /// Starts a solo game against the built-in bot, no queue involved.
    pub async fn play_bot(&self, player_id: String) {
        if self.player_to_game.contains_key(&player_id) {
            tracing::warn!(player_id = %player_id, "Player already in game, ignoring playBot");
            return;
        }
        // A queued player who starts a bot game leaves the queue.
        self.cancel_search(&player_id).await;

        let game_id = Uuid::new_v4().to_string();
        let name = self.display_name(&player_id);
        let mut game = GooseGame::new();
        let events = game.start_bot_game(&name);
        let host_engine_id = game.players().first().map_or(1, |p| p.id);
        let seats = HashMap::from([(host_engine_id, player_id.clone())]);

        tracing::info!(game_id = %game_id, player_id = %player_id, "Created bot game");

        let room = GameRoom::new(game, seats);
        let seat_ids = room.seat_ids();
        self.games.insert(game_id.clone(), RwLock::new(room));
        self.player_to_game.insert(player_id.clone(), game_id.clone());

        self.send_to(
            &player_id,
            &ServerMessage::GameReady {
                game_id: game_id.clone(),
                opponent_id: "bot".to_string(),
            },
        );
        self.dispatch_room_events(&game_id, &seat_ids, events);
    }

    fn display_name(&self, id: &str) -> String {
        self.sessions
            .get(id)
            .map_or_else(|| id.to_string(), |s| s.name.clone())
    }
}
