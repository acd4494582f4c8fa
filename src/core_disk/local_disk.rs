use super::disk_interface::{
    DiskContext, DiskInterface, FileInfo, FileOpenParams, FileStatus, NetworkFile, OpenAction,
    SearchContext, SetFileInfo,
};
use super::error::DiskError;
use crate::core_path::{DIR_SEPARATOR, FTP_SEPARATOR};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use log::{debug, trace};
use regex::Regex;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;

type OpenFiles = HashMap<u64, Arc<AsyncMutex<File>>>;

/// Disk backend rooted at a local directory.
pub struct LocalDisk {
    root: PathBuf,
    files: Mutex<OpenFiles>,
    next_handle: AtomicU64,
}

impl LocalDisk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a share-relative path below the root. `..` is refused so no
    /// path can leave the share.
    fn resolve(&self, path: &str) -> Result<PathBuf, DiskError> {
        let mut resolved = self.root.clone();
        for segment in path.split([DIR_SEPARATOR, FTP_SEPARATOR]) {
            match segment {
                "" | "." => {}
                ".." => return Err(DiskError::InvalidPath(path.to_string())),
                name if name.contains('\0') => {
                    return Err(DiskError::InvalidPath(path.to_string()))
                }
                name => resolved.push(name),
            }
        }
        Ok(resolved)
    }

    fn open_files(&self) -> MutexGuard<'_, OpenFiles> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, file: File, params: &FileOpenParams, size: u64) -> NetworkFile {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.open_files().insert(id, Arc::new(AsyncMutex::new(file)));
        trace!("Opened {} as handle {}", params.path, id);
        NetworkFile {
            id,
            path: params.path.clone(),
            write: params.write,
            size,
        }
    }

    fn handle(&self, file: &NetworkFile) -> Result<Arc<AsyncMutex<File>>, DiskError> {
        self.open_files()
            .get(&file.id)
            .cloned()
            .ok_or(DiskError::InvalidHandle)
    }

    async fn stat(&self, full: &Path, name: &str) -> Result<FileInfo, DiskError> {
        let link = tokio::fs::symlink_metadata(full)
            .await
            .map_err(|e| DiskError::from_io(e, name))?;
        let meta = if link.file_type().is_symlink() {
            tokio::fs::metadata(full).await.unwrap_or(link.clone())
        } else {
            link.clone()
        };

        Ok(FileInfo {
            name: name.to_string(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            directory: meta.is_dir(),
            modify: meta.modified().ok().map(DateTime::<Utc>::from),
            create: meta.created().ok().map(DateTime::<Utc>::from),
            read_only: meta.permissions().readonly(),
            file_id: file_id(&meta),
            symlink: link.file_type().is_symlink(),
            hidden: name.starts_with('.'),
        })
    }
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> Option<u64> {
    None
}

fn last_segment(path: &str) -> &str {
    path.rsplit([DIR_SEPARATOR, FTP_SEPARATOR])
        .next()
        .unwrap_or_default()
}

fn wildcard_regex(pattern: &str) -> Result<Regex, DiskError> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|_| DiskError::InvalidPath(pattern.to_string()))
}

#[async_trait]
impl DiskInterface for LocalDisk {
    async fn file_exists(&self, _ctx: &DiskContext, path: &str) -> FileStatus {
        let Ok(full) = self.resolve(path) else {
            return FileStatus::NotExist;
        };
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_dir() => FileStatus::DirectoryExists,
            Ok(_) => FileStatus::FileExists,
            Err(_) => FileStatus::NotExist,
        }
    }

    async fn open_file(
        &self,
        _ctx: &DiskContext,
        params: &FileOpenParams,
    ) -> Result<NetworkFile, DiskError> {
        let full = self.resolve(&params.path)?;
        let mut options = OpenOptions::new();
        match params.action {
            OpenAction::OpenExisting => options.read(true).write(params.write),
            OpenAction::Truncate => options.write(true).create(true).truncate(true),
            OpenAction::Append => options.write(true).create(true),
        };

        let file = options
            .open(&full)
            .await
            .map_err(|e| DiskError::from_io(e, &params.path))?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| DiskError::from_io(e, &params.path))?;
        if meta.is_dir() {
            return Err(DiskError::AccessDenied(params.path.clone()));
        }
        Ok(self.register(file, params, meta.len()))
    }

    async fn create_file(
        &self,
        _ctx: &DiskContext,
        params: &FileOpenParams,
    ) -> Result<NetworkFile, DiskError> {
        let full = self.resolve(&params.path)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .map_err(|e| DiskError::from_io(e, &params.path))?;
        Ok(self.register(file, params, 0))
    }

    async fn read_file(
        &self,
        _ctx: &DiskContext,
        file: &NetworkFile,
        buf: &mut [u8],
        pos: u64,
    ) -> Result<usize, DiskError> {
        let handle = self.handle(file)?;
        let mut handle = handle.lock().await;
        handle
            .seek(SeekFrom::Start(pos))
            .await
            .map_err(|e| DiskError::from_io(e, &file.path))?;
        handle
            .read(buf)
            .await
            .map_err(|e| DiskError::from_io(e, &file.path))
    }

    async fn write_file(
        &self,
        _ctx: &DiskContext,
        file: &NetworkFile,
        data: &[u8],
        pos: u64,
    ) -> Result<usize, DiskError> {
        let handle = self.handle(file)?;
        let mut handle = handle.lock().await;
        handle
            .seek(SeekFrom::Start(pos))
            .await
            .map_err(|e| DiskError::from_io(e, &file.path))?;
        handle
            .write_all(data)
            .await
            .map_err(|e| DiskError::from_io(e, &file.path))?;
        Ok(data.len())
    }

    async fn close_file(&self, _ctx: &DiskContext, file: &NetworkFile) -> Result<(), DiskError> {
        let handle = self
            .open_files()
            .remove(&file.id)
            .ok_or(DiskError::InvalidHandle)?;
        let mut handle = handle.lock().await;
        handle
            .flush()
            .await
            .map_err(|e| DiskError::from_io(e, &file.path))?;
        trace!("Closed handle {} ({})", file.id, file.path);
        Ok(())
    }

    async fn delete_file(&self, _ctx: &DiskContext, path: &str) -> Result<(), DiskError> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| DiskError::from_io(e, path))?;
        if meta.is_dir() {
            return Err(DiskError::AccessDenied(path.to_string()));
        }
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| DiskError::from_io(e, path))
    }

    async fn create_directory(&self, _ctx: &DiskContext, path: &str) -> Result<(), DiskError> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir(&full)
            .await
            .map_err(|e| DiskError::from_io(e, path))
    }

    async fn delete_directory(&self, _ctx: &DiskContext, path: &str) -> Result<(), DiskError> {
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(DiskError::AccessDenied(path.to_string()));
        }
        let mut entries = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| DiskError::from_io(e, path))?;
        if entries
            .next_entry()
            .await
            .map_err(|e| DiskError::from_io(e, path))?
            .is_some()
        {
            return Err(DiskError::DirectoryNotEmpty(path.to_string()));
        }
        tokio::fs::remove_dir(&full)
            .await
            .map_err(|e| DiskError::from_io(e, path))
    }

    async fn rename_file(
        &self,
        _ctx: &DiskContext,
        from: &str,
        to: &str,
    ) -> Result<(), DiskError> {
        let old = self.resolve(from)?;
        let new = self.resolve(to)?;
        if tokio::fs::symlink_metadata(&new).await.is_ok() {
            return Err(DiskError::AlreadyExists(to.to_string()));
        }
        tokio::fs::rename(&old, &new)
            .await
            .map_err(|e| DiskError::from_io(e, from))
    }

    async fn get_file_information(
        &self,
        _ctx: &DiskContext,
        path: &str,
    ) -> Result<FileInfo, DiskError> {
        let full = self.resolve(path)?;
        self.stat(&full, last_segment(path)).await
    }

    async fn set_file_information(
        &self,
        _ctx: &DiskContext,
        path: &str,
        info: &SetFileInfo,
    ) -> Result<(), DiskError> {
        let full = self.resolve(path)?;
        if let Some(modify) = info.modify {
            let mtime = FileTime::from_unix_time(modify.timestamp(), modify.timestamp_subsec_nanos());
            filetime::set_file_mtime(&full, mtime).map_err(|e| DiskError::from_io(e, path))?;
            debug!("Set modification time of {} to {}", path, modify);
        }
        Ok(())
    }

    async fn start_search(
        &self,
        ctx: &DiskContext,
        path: &str,
    ) -> Result<SearchContext, DiskError> {
        let (dir, pattern) = match path.rfind([DIR_SEPARATOR, FTP_SEPARATOR]) {
            Some(pos) => (&path[..pos], &path[pos + 1..]),
            None => ("", path),
        };

        if !pattern.contains(['*', '?']) {
            let info = self.get_file_information(ctx, path).await?;
            return Ok(SearchContext::new(vec![info]));
        }

        let matcher = wildcard_regex(pattern)?;
        let dir_full = self.resolve(dir)?;
        let mut read_dir = tokio::fs::read_dir(&dir_full)
            .await
            .map_err(|e| DiskError::from_io(e, dir))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| DiskError::from_io(e, dir))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !matcher.is_match(&name) {
                continue;
            }
            match self.stat(&entry.path(), &name).await {
                Ok(info) => entries.push(info),
                Err(e) => debug!("Skipping {} in search: {}", name, e),
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(SearchContext::new(entries))
    }
}
