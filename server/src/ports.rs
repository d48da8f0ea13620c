use async_trait::async_trait;
use dashmap::DashMap;

/// User record as seen through the external repository.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: String,
    pub online: bool,
}

#[derive(Debug, Clone)]
pub enum DirectoryError {
    Unavailable(String),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "directory unavailable: {reason}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Collaborator port to the external user/friendship repository.
///
/// The registry only needs three operations; failures here degrade
/// presence features and are never fatal to a connection or a game.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<DirectoryUser>, DirectoryError>;
    async fn update_user(&self, user: DirectoryUser) -> Result<(), DirectoryError>;
    async fn get_friends_list(&self, id: &str) -> Result<Vec<String>, DirectoryError>;
}

/// In-memory directory, used for standalone runs and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: DashMap<String, DirectoryUser>,
    friends: DashMap<String, Vec<String>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: DirectoryUser) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn set_friends(&self, id: &str, friends: Vec<String>) {
        self.friends.insert(id.to_string(), friends);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<DirectoryUser>, DirectoryError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn update_user(&self, user: DirectoryUser) -> Result<(), DirectoryError> {
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_friends_list(&self, id: &str) -> Result<Vec<String>, DirectoryError> {
        Ok(self
            .friends
            .get(id)
            .map(|f| f.value().clone())
            .unwrap_or_default())
    }
}
