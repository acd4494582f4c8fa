use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Disk full")]
    DiskFull,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid file handle")]
    InvalidHandle,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DiskError {
    pub fn from_io(err: io::Error, path: &str) -> Self {
        if is_disk_full(&err) {
            return DiskError::DiskFull;
        }
        match err.kind() {
            io::ErrorKind::NotFound => DiskError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => DiskError::AccessDenied(path.to_string()),
            io::ErrorKind::AlreadyExists => DiskError::AlreadyExists(path.to_string()),
            _ => DiskError::Io(err),
        }
    }

    /// FTP reply code and text for a failed disk operation.
    pub fn reply(&self) -> (u16, &'static str) {
        match self {
            DiskError::NotFound(_) => (550, "File not found"),
            DiskError::AccessDenied(_) => (550, "Access denied"),
            DiskError::AlreadyExists(_) => (550, "File exists"),
            DiskError::DirectoryNotEmpty(_) => (550, "Directory not empty"),
            DiskError::DiskFull => (451, "Disk full"),
            DiskError::InvalidPath(_) => (550, "Invalid path"),
            DiskError::InvalidHandle | DiskError::Io(_) => {
                (451, "Requested action aborted: local error in processing")
            }
        }
    }
}

fn is_disk_full(err: &io::Error) -> bool {
    #[cfg(unix)]
    const DISK_FULL: i32 = 28; // ENOSPC
    #[cfg(windows)]
    const DISK_FULL: i32 = 112; // ERROR_DISK_FULL
    #[cfg(not(any(unix, windows)))]
    const DISK_FULL: i32 = -1;

    err.raw_os_error() == Some(DISK_FULL)
}
