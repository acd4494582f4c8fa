use super::error::DiskError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Identity a disk backend acts for. Built from the logged on principal by
/// the control session and again by each transfer worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskContext {
    pub session_id: u32,
    pub user: String,
    pub guest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    NotExist,
    FileExists,
    DirectoryExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAction {
    /// The file must already exist.
    OpenExisting,
    /// Create the file, or truncate it if it exists.
    Truncate,
    /// Create the file, or open it positioned at its current end.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOpenParams {
    pub path: String,
    pub action: OpenAction,
    pub write: bool,
}

impl FileOpenParams {
    pub fn read(path: &str) -> Self {
        Self {
            path: path.to_string(),
            action: OpenAction::OpenExisting,
            write: false,
        }
    }

    pub fn write(path: &str, action: OpenAction) -> Self {
        Self {
            path: path.to_string(),
            action,
            write: true,
        }
    }
}

/// Handle to a file opened through a [`DiskInterface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFile {
    pub id: u64,
    pub path: String,
    pub write: bool,
    /// Length of the file when it was opened.
    pub size: u64,
}

/// Metadata record for one file or directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub directory: bool,
    pub modify: Option<DateTime<Utc>>,
    pub create: Option<DateTime<Utc>>,
    pub read_only: bool,
    pub file_id: Option<u64>,
    pub symlink: bool,
    pub hidden: bool,
}

impl FileInfo {
    pub fn directory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            directory: true,
            ..Default::default()
        }
    }

    pub fn file(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            size,
            ..Default::default()
        }
    }
}

/// Attributes a client may change, `None` leaves the attribute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetFileInfo {
    pub modify: Option<DateTime<Utc>>,
}

/// Results of a wildcard search, in the order the backend produced them.
#[derive(Debug)]
pub struct SearchContext {
    entries: std::vec::IntoIter<FileInfo>,
}

impl SearchContext {
    pub fn new(entries: Vec<FileInfo>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for SearchContext {
    type Item = FileInfo;

    fn next(&mut self) -> Option<FileInfo> {
        self.entries.next()
    }
}

/// Storage capability a share is backed by. Paths are share-relative and use
/// `\` separators.
#[async_trait]
pub trait DiskInterface: Send + Sync {
    async fn file_exists(&self, ctx: &DiskContext, path: &str) -> FileStatus;

    async fn open_file(
        &self,
        ctx: &DiskContext,
        params: &FileOpenParams,
    ) -> Result<NetworkFile, DiskError>;

    /// Creates a new file, failing if one already exists.
    async fn create_file(
        &self,
        ctx: &DiskContext,
        params: &FileOpenParams,
    ) -> Result<NetworkFile, DiskError>;

    async fn read_file(
        &self,
        ctx: &DiskContext,
        file: &NetworkFile,
        buf: &mut [u8],
        pos: u64,
    ) -> Result<usize, DiskError>;

    async fn write_file(
        &self,
        ctx: &DiskContext,
        file: &NetworkFile,
        data: &[u8],
        pos: u64,
    ) -> Result<usize, DiskError>;

    async fn close_file(&self, ctx: &DiskContext, file: &NetworkFile) -> Result<(), DiskError>;

    async fn delete_file(&self, ctx: &DiskContext, path: &str) -> Result<(), DiskError>;

    async fn create_directory(&self, ctx: &DiskContext, path: &str) -> Result<(), DiskError>;

    async fn delete_directory(&self, ctx: &DiskContext, path: &str) -> Result<(), DiskError>;

    async fn rename_file(&self, ctx: &DiskContext, from: &str, to: &str)
        -> Result<(), DiskError>;

    async fn get_file_information(
        &self,
        ctx: &DiskContext,
        path: &str,
    ) -> Result<FileInfo, DiskError>;

    async fn set_file_information(
        &self,
        ctx: &DiskContext,
        path: &str,
        info: &SetFileInfo,
    ) -> Result<(), DiskError>;

    /// `path` is a directory path followed by a `*`/`?` pattern, or a single
    /// file path.
    async fn start_search(&self, ctx: &DiskContext, path: &str)
        -> Result<SearchContext, DiskError>;
}
