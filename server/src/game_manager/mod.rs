use crate::ports::UserDirectory;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

pub mod gameplay;
pub mod lifecycle;
pub mod matchmaking;
pub mod session;

pub use session::{GameRoom, SessionHandle, Tx};

pub struct AppState {
    /// Connected sessions keyed by the authenticated caller id.
    pub sessions: DashMap<String, SessionHandle>,
    /// FIFO matchmaking queue; pairing is serialized under this lock.
    pub waiting: Mutex<VecDeque<String>>,
    /// Active-connection counter; must always equal `sessions.len()`.
    pub active: AtomicUsize,
    pub games: DashMap<String, RwLock<GameRoom>>,
    pub player_to_game: DashMap<String, String>,
    pub directory: Arc<dyn UserDirectory>,
    /// Bot turns are driven by message-passing: handlers push a game id
    /// here and a worker task owning the state plays the delayed roll.
    bot_jobs: mpsc::UnboundedSender<String>,
}

impl AppState {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Arc<Self> {
        let (bot_jobs, job_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            sessions: DashMap::new(),
            waiting: Mutex::new(VecDeque::new()),
            active: AtomicUsize::new(0),
            games: DashMap::new(),
            player_to_game: DashMap::new(),
            directory,
            bot_jobs,
        });
        state.clone().spawn_bot_worker(job_rx);
        state
    }

    /// Allow at most 10 inbound frames per second per session.
    pub fn check_rate_limit(&self, player_id: &str) -> bool {
        use std::time::Instant;
        if let Some(mut session) = self.sessions.get_mut(player_id) {
            let now = Instant::now();
            let elapsed = now.duration_since(session.last_msg_at).as_secs_f32();
            if elapsed < 0.1 {
                return false;
            }
            session.last_msg_at = now;
            true
        } else {
            false
        }
    }
}
