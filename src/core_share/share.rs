use crate::core_disk::DiskInterface;
use crate::core_events::{ChangeNotifier, FileAction};
use std::fmt;
use std::sync::Arc;

/// A named top-level directory exposed to FTP clients.
pub struct Share {
    name: String,
    disk: Arc<dyn DiskInterface>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    temporary: bool,
    read_only: bool,
}

impl Share {
    pub fn new(name: &str, disk: Arc<dyn DiskInterface>) -> Self {
        Self {
            name: name.to_string(),
            disk,
            notifier: None,
            temporary: false,
            read_only: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Marks a share that only lives for one session.
    pub fn into_temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disk(&self) -> &Arc<dyn DiskInterface> {
        &self.disk
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn notify_file_changed(&self, action: FileAction, path: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify_file_changed(&self.name, action, path);
        }
    }

    pub fn notify_rename(&self, old_path: &str, new_path: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify_rename(&self.name, old_path, new_path);
        }
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("name", &self.name)
            .field("temporary", &self.temporary)
            .field("read_only", &self.read_only)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    NoAccess,
    ReadOnly,
    Writeable,
}

/// A session's connection to one share with the access it was granted.
#[derive(Debug, Clone)]
pub struct TreeConnection {
    share: Arc<Share>,
    permission: Access,
}

impl TreeConnection {
    pub fn new(share: Arc<Share>, permission: Access) -> Self {
        Self { share, permission }
    }

    pub fn share(&self) -> &Arc<Share> {
        &self.share
    }

    pub fn permission(&self) -> Access {
        self.permission
    }

    pub fn has_read_access(&self) -> bool {
        self.permission >= Access::ReadOnly
    }

    pub fn has_write_access(&self) -> bool {
        self.permission == Access::Writeable
    }
}
