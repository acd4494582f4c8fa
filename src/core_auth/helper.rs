use crate::core_auth::core_auth::{AuthError, Authenticator, PasswdEntry, Principal};
use async_trait::async_trait;
use bcrypt::{hash, verify};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use bcrypt::DEFAULT_COST;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost).map_err(|e| AuthError::Backend(e.to_string()))
}

pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}

pub fn load_passwd_file(path: &Path) -> std::io::Result<HashMap<String, PasswdEntry>> {
    let content = fs::read_to_string(path)?;
    let mut passwd_map = HashMap::new();

    for (lineno, line) in content.lines().enumerate() {
        match PasswdEntry::from_line(line) {
            Some(entry) => {
                passwd_map.insert(entry.get_username().to_string(), entry);
            }
            None if !line.trim().is_empty() && !line.trim_start().starts_with('#') => {
                warn!("Ignoring malformed passwd line {} in {:?}", lineno + 1, path);
            }
            None => {}
        }
    }
    debug!("Loaded {} passwd entries from {:?}", passwd_map.len(), path);
    Ok(passwd_map)
}

/// Authenticates against bcrypt hashes from a passwd file.
pub struct PasswdAuthenticator {
    entries: HashMap<String, PasswdEntry>,
    guest_enabled: bool,
}

impl PasswdAuthenticator {
    pub fn from_file(path: &Path, guest_enabled: bool) -> std::io::Result<Self> {
        Ok(Self::from_entries(load_passwd_file(path)?, guest_enabled))
    }

    pub fn from_entries(entries: HashMap<String, PasswdEntry>, guest_enabled: bool) -> Self {
        Self {
            entries,
            guest_enabled,
        }
    }
}

#[async_trait]
impl Authenticator for PasswdAuthenticator {
    async fn authenticate(&self, user: &str, password: &str) -> Result<Principal, AuthError> {
        let entry = self
            .entries
            .get(user)
            .ok_or_else(|| AuthError::UnknownUser(user.to_string()))?;

        // bcrypt verification blocks
        let password = password.to_string();
        let hashed = entry.get_hashed_password().to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if !valid {
            return Err(AuthError::InvalidPassword(user.to_string()));
        }
        Ok(Principal {
            user: user.to_string(),
            guest: false,
            home: entry.get_home().cloned(),
        })
    }

    async fn authenticate_as_guest(
        &self,
        guest_user: &str,
        home: Option<PathBuf>,
    ) -> Result<Principal, AuthError> {
        if !self.guest_enabled {
            return Err(AuthError::GuestDisabled);
        }
        Ok(Principal {
            user: guest_user.to_string(),
            guest: true,
            home,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> PasswdAuthenticator {
        let hashed = hash_password("secret", 4).unwrap();
        let mut entries = HashMap::new();
        entries.insert(
            "bob".to_string(),
            PasswdEntry::new("bob", &hashed, Some(PathBuf::from("/home/bob"))),
        );
        PasswdAuthenticator::from_entries(entries, false)
    }

    #[tokio::test]
    async fn accepts_matching_password() {
        let principal = authenticator().authenticate("bob", "secret").await.unwrap();
        assert_eq!(principal.user, "bob");
        assert!(!principal.guest);
        assert_eq!(principal.home, Some(PathBuf::from("/home/bob")));
    }

    #[tokio::test]
    async fn rejects_bad_credentials() {
        let auth = authenticator();
        assert!(matches!(
            auth.authenticate("bob", "wrong").await,
            Err(AuthError::InvalidPassword(_))
        ));
        assert!(matches!(
            auth.authenticate("eve", "secret").await,
            Err(AuthError::UnknownUser(_))
        ));
        assert!(matches!(
            auth.authenticate_as_guest("guest", None).await,
            Err(AuthError::GuestDisabled)
        ));
    }

    #[test]
    fn loads_passwd_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passwd");
        let hashed = hash_password("pw", 4).unwrap();
        fs::write(&path, format!("# users\nbob:{}\nbroken\n", hashed)).unwrap();
        let entries = load_passwd_file(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(verify_password("pw", entries["bob"].get_hashed_password()));
    }
}
