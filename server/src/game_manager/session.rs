use goose_core::GooseGame;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc;

/// Outbound channel carrying pre-serialized frames, so a broadcast
/// serializes its message exactly once.
pub type Tx = mpsc::UnboundedSender<String>;

/// One live connection: its writer channel, the display name cached at
/// connect time, and the last-inbound-frame timestamp for rate limiting.
pub struct SessionHandle {
    pub tx: Tx,
    pub name: String,
    pub last_msg_at: Instant,
}

/// One match: the engine state plus the seat map from engine player ids
/// to connection ids. The bot has no seat. Rooms are keyed by game id in
/// the registry, so the room itself does not carry it.
pub struct GameRoom {
    pub game: GooseGame,
    pub seats: HashMap<i32, String>,
    pub last_activity: Instant,
}

impl GameRoom {
    pub fn new(game: GooseGame, seats: HashMap<i32, String>) -> Self {
        Self {
            game,
            seats,
            last_activity: Instant::now(),
        }
    }

    /// Connection ids of every seated human.
    pub fn seat_ids(&self) -> Vec<String> {
        self.seats.values().cloned().collect()
    }

    pub fn engine_id_of(&self, connection_id: &str) -> Option<i32> {
        self.seats
            .iter()
            .find(|(_, conn)| conn.as_str() == connection_id)
            .map(|(id, _)| *id)
    }
}
