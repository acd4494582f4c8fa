use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Invalid password for user: {0}")]
    InvalidPassword(String),

    #[error("Guest access is disabled")]
    GuestDisabled,

    #[error("Authentication backend failure: {0}")]
    Backend(String),
}

/// Identity of a logged on user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user: String,
    pub guest: bool,
    pub home: Option<PathBuf>,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, user: &str, password: &str) -> Result<Principal, AuthError>;

    async fn authenticate_as_guest(
        &self,
        guest_user: &str,
        home: Option<PathBuf>,
    ) -> Result<Principal, AuthError>;
}

/// One `user:hash[:home]` line of a passwd file.
#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
    home: Option<PathBuf>,
}

impl PasswdEntry {
    pub fn new(username: &str, hashed_password: &str, home: Option<PathBuf>) -> Self {
        Self {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
            home,
        }
    }

    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut parts = line.splitn(3, ':');
        let username = parts.next()?;
        let hashed_password = parts.next()?;
        if username.is_empty() || hashed_password.is_empty() {
            return None;
        }
        let home = parts
            .next()
            .filter(|home| !home.is_empty())
            .map(PathBuf::from);

        Some(PasswdEntry::new(username, hashed_password, home))
    }

    pub fn get_hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_home(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }
}
