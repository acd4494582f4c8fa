use log::debug;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Added,
    Removed,
    Modified,
    DirectoryAdded,
    DirectoryRemoved,
}

/// Receives change events for files under a share.
pub trait ChangeNotifier: Send + Sync {
    fn notify_file_changed(&self, share: &str, action: FileAction, path: &str);

    fn notify_rename(&self, share: &str, old_path: &str, new_path: &str);
}

/// Writes change events to the debug log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn notify_file_changed(&self, share: &str, action: FileAction, path: &str) {
        debug!("[{}] {:?} {}", share, action, path);
    }

    fn notify_rename(&self, share: &str, old_path: &str, new_path: &str) {
        debug!("[{}] Renamed {} -> {}", share, old_path, new_path);
    }
}

/// Session lifecycle events.
pub trait SessionListener: Send + Sync {
    fn session_opened(&self, _session_id: u32, _remote: SocketAddr) {}

    fn session_logged_on(&self, _session_id: u32, _user: &str) {}

    fn session_closed(&self, _session_id: u32) {}
}
