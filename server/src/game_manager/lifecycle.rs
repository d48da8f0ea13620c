use crate::game_manager::{AppState, SessionHandle, Tx};
use shared::ServerMessage;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

impl AppState {
    /// Registers a freshly upgraded connection: counts it, announces the
    /// new active count to everyone, flips the external status to online
    /// and tells connected friends.
    pub async fn add_session(&self, id: String, tx: Tx) {
        // Directory lookups happen before and after the map mutation;
        // no registry lock is held across them.
        let name = match self.directory.get_user_by_id(&id).await {
            Ok(Some(user)) => user.display_name,
            Ok(None) => id.clone(),
            Err(e) => {
                tracing::warn!(player_id = %id, error = %e, "Directory lookup failed on connect");
                id.clone()
            }
        };

        let previous = self.sessions.insert(
            id.clone(),
            SessionHandle {
                tx,
                name,
                last_msg_at: Instant::now(),
            },
        );
        if previous.is_none() {
            self.active.fetch_add(1, Ordering::SeqCst);
        }
        let count = self.active.load(Ordering::SeqCst);
        tracing::info!(player_id = %id, active = count, "Session connected");

        self.broadcast(&ServerMessage::ActiveConnections { count });
        self.set_online_status(&id, true).await;
        self.notify_friends(&id, true).await;
    }

    /// Tears a session down. The caller passes the writer channel of the
    /// connection that is closing: after a reconnect the map holds the new
    /// handle, and the old socket's late cleanup must not evict it. The
    /// guarded map removal also makes the call idempotent, so a disconnect
    /// racing an explicit abandon decrements the counter exactly once.
    pub async fn remove_session(&self, id: &str, tx: &Tx) {
        if self
            .sessions
            .remove_if(id, |_, session| session.tx.same_channel(tx))
            .is_none()
        {
            tracing::debug!(player_id = %id, "Session already removed or replaced");
            return;
        }

        {
            let mut queue = self.waiting.lock().await;
            queue.retain(|waiting| waiting != id);
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        let count = self.active.load(Ordering::SeqCst);
        tracing::info!(player_id = %id, active = count, "Session disconnected");

        self.broadcast(&ServerMessage::ActiveConnections { count });
        self.leave_active_game(id).await;
        self.set_online_status(id, false).await;
        self.notify_friends(id, false).await;
    }

    /// Serializes once and fans out to every connected session. A failed
    /// send only means that recipient's writer task is gone; it never
    /// blocks or fails delivery to the others.
    pub fn broadcast(&self, msg: &ServerMessage) {
        let frame = match serde_json::to_string(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast");
                return;
            }
        };
        for entry in self.sessions.iter() {
            let _ = entry.value().tx.send(frame.clone());
        }
    }

    pub fn send_to(&self, id: &str, msg: &ServerMessage) {
        let frame = match serde_json::to_string(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize message");
                return;
            }
        };
        if let Some(session) = self.sessions.get(id) {
            let _ = session.tx.send(frame);
        }
    }

    pub fn send_to_many(&self, ids: &[String], msg: &ServerMessage) {
        let frame = match serde_json::to_string(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize message");
                return;
            }
        };
        for id in ids {
            if let Some(session) = self.sessions.get(id) {
                let _ = session.tx.send(frame.clone());
            }
        }
    }

    /// Read-modify-write of the external status record. Collaborator
    /// failures are logged and swallowed; presence degrades gracefully.
    async fn set_online_status(&self, id: &str, online: bool) {
        match self.directory.get_user_by_id(id).await {
            Ok(Some(mut user)) => {
                user.online = online;
                if let Err(e) = self.directory.update_user(user).await {
                    tracing::warn!(player_id = %id, error = %e, "Status update failed");
                }
            }
            Ok(None) => {
                tracing::debug!(player_id = %id, "No directory record, skipping status update");
            }
            Err(e) => {
                tracing::warn!(player_id = %id, error = %e, "Status lookup failed");
            }
        }
    }

    async fn notify_friends(&self, id: &str, connected: bool) {
        let friends = match self.directory.get_friends_list(id).await {
            Ok(friends) => friends,
            Err(e) => {
                tracing::warn!(player_id = %id, error = %e, "Friend lookup failed");
                return;
            }
        };
        let msg = if connected {
            ServerMessage::FriendConnected {
                friend_id: id.to_string(),
            }
        } else {
            ServerMessage::FriendDisconnected {
                friend_id: id.to_string(),
            }
        };
        let online: Vec<String> = friends
            .into_iter()
            .filter(|f| self.sessions.contains_key(f))
            .collect();
        self.send_to_many(&online, &msg);
    }

    /// Periodically drops rooms with no activity for an hour.
    pub fn spawn_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            use std::time::Duration;
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                let now = Instant::now();
                let mut stale = Vec::new();

                for entry in self.games.iter() {
                    let room = entry.value().read().await;
                    if now.duration_since(room.last_activity) > Duration::from_secs(3600) {
                        stale.push(entry.key().clone());
                    }
                }

                for game_id in stale {
                    tracing::info!(game_id = %game_id, "Cleaning up inactive game");
                    if let Some((_, room_lock)) = self.games.remove(&game_id) {
                        let room = room_lock.into_inner();
                        for seat in room.seat_ids() {
                            self.player_to_game.remove(&seat);
                        }
                    }
                }
            }
        });
    }
}
