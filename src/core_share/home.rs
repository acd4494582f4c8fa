use super::share::Share;
use crate::core_auth::Principal;
use crate::core_disk::LocalDisk;
use crate::core_events::ChangeNotifier;
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("No home folder for user: {0}")]
    NoHome(String),

    #[error("Home folder unavailable: {0}")]
    Unavailable(String),
}

/// Builds the per-session share a guest is confined to.
#[async_trait]
pub trait HomeShareFactory: Send + Sync {
    async fn create_home_share(&self, principal: &Principal) -> Result<Arc<Share>, ShareError>;
}

/// Roots the guest share at the principal's home, or a default folder.
pub struct LocalHomeShareFactory {
    default_home: Option<PathBuf>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
}

impl LocalHomeShareFactory {
    pub fn new(default_home: Option<PathBuf>) -> Self {
        Self {
            default_home,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

#[async_trait]
impl HomeShareFactory for LocalHomeShareFactory {
    async fn create_home_share(&self, principal: &Principal) -> Result<Arc<Share>, ShareError> {
        let home = principal
            .home
            .clone()
            .or_else(|| self.default_home.clone())
            .ok_or_else(|| ShareError::NoHome(principal.user.clone()))?;

        match tokio::fs::metadata(&home).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(ShareError::Unavailable(home.display().to_string())),
        }

        let name = home
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| principal.user.clone());

        let mut share = Share::new(&name, Arc::new(LocalDisk::new(&home))).into_temporary();
        if let Some(notifier) = &self.notifier {
            share = share.with_notifier(Arc::clone(notifier));
        }
        debug!("Created home share {} at {:?} for {}", name, home, principal.user);
        Ok(Arc::new(share))
    }
}
