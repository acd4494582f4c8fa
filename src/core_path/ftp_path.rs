use crate::core_share::Share;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const FTP_SEPARATOR: char = '/';
pub const FTP_SEPARATOR_STR: &str = "/";

/// Separator used in share-relative paths handed to a disk backend.
pub const DIR_SEPARATOR: char = '\\';
pub const DIR_SEPARATOR_STR: &str = "\\";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid FTP path: {0}")]
    Invalid(String),

    #[error("already at root directory")]
    AtRoot,
}

/// A client-visible FTP path together with its share decomposition.
///
/// The first segment of the FTP form names the share, the rest is the
/// share-relative path in native form. `/` is the pseudo-directory that
/// lists the shares and has no share bound.
#[derive(Clone)]
pub struct FtpPath {
    ftp_path: String,
    share_name: Option<String>,
    share_path: Option<String>,
    dir: bool,
    share: Option<Arc<Share>>,
}

impl FtpPath {
    pub fn root() -> Self {
        Self {
            ftp_path: FTP_SEPARATOR_STR.to_string(),
            share_name: None,
            share_path: None,
            dir: true,
            share: None,
        }
    }

    pub fn from_ftp_path(path: &str) -> Result<Self, PathError> {
        let mut ftp_path = Self::root();
        ftp_path.set_ftp_path(path)?;
        Ok(ftp_path)
    }

    pub fn from_share_path(share_name: &str, share_path: &str) -> Result<Self, PathError> {
        let mut ftp_path = Self::root();
        ftp_path.set_share_path(share_name, share_path)?;
        Ok(ftp_path)
    }

    /// Replaces the path from its FTP form. Any bound share is dropped.
    pub fn set_ftp_path(&mut self, path: &str) -> Result<(), PathError> {
        if path.is_empty() || path == FTP_SEPARATOR_STR {
            *self = Self::root();
            return Ok(());
        }
        if !path.starts_with(FTP_SEPARATOR) {
            return Err(PathError::Invalid(path.to_string()));
        }

        let segments: Vec<&str> = path
            .split(FTP_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect();
        let Some((share_name, rest)) = segments.split_first() else {
            *self = Self::root();
            return Ok(());
        };

        self.ftp_path = format!("{}{}", FTP_SEPARATOR, segments.join(FTP_SEPARATOR_STR));
        self.share_name = Some(share_name.to_string());
        self.share_path = Some(format!(
            "{}{}",
            DIR_SEPARATOR,
            rest.join(DIR_SEPARATOR_STR)
        ));
        self.share = None;
        Ok(())
    }

    pub fn set_share_path(&mut self, share_name: &str, share_path: &str) -> Result<(), PathError> {
        if share_name.is_empty() || share_name.contains([FTP_SEPARATOR, DIR_SEPARATOR]) {
            return Err(PathError::Invalid(share_name.to_string()));
        }

        let segments: Vec<&str> = share_path
            .split([DIR_SEPARATOR, FTP_SEPARATOR])
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut ftp_path = format!("{}{}", FTP_SEPARATOR, share_name);
        for segment in &segments {
            ftp_path.push(FTP_SEPARATOR);
            ftp_path.push_str(segment);
        }

        self.ftp_path = ftp_path;
        self.share_name = Some(share_name.to_string());
        self.share_path = Some(format!(
            "{}{}",
            DIR_SEPARATOR,
            segments.join(DIR_SEPARATOR_STR)
        ));
        self.share = None;
        Ok(())
    }

    pub fn add_directory(&mut self, name: &str) {
        self.add_segment(name);
        self.dir = true;
    }

    pub fn add_file(&mut self, name: &str) {
        self.add_segment(name);
        self.dir = false;
    }

    fn add_segment(&mut self, name: &str) {
        // Children of the root are shares
        if self.is_root_path() {
            self.ftp_path = format!("{}{}", FTP_SEPARATOR, name);
            self.share_name = Some(name.to_string());
            self.share_path = Some(DIR_SEPARATOR_STR.to_string());
            self.share = None;
            return;
        }

        if !self.ftp_path.ends_with(FTP_SEPARATOR) {
            self.ftp_path.push(FTP_SEPARATOR);
        }
        self.ftp_path.push_str(name);

        let share_path = self
            .share_path
            .get_or_insert_with(|| DIR_SEPARATOR_STR.to_string());
        if !share_path.ends_with(DIR_SEPARATOR) {
            share_path.push(DIR_SEPARATOR);
        }
        share_path.push_str(name);
    }

    /// Strips the last segment. Leaving a share drops the bound share, the
    /// root stays the root.
    pub fn remove_directory(&mut self) {
        if self.is_root_path() {
            return;
        }
        let parent = match self.ftp_path.rfind(FTP_SEPARATOR) {
            Some(0) | None => FTP_SEPARATOR_STR.to_string(),
            Some(pos) => self.ftp_path[..pos].to_string(),
        };

        let share = self.share.take();
        let share_name = self.share_name.clone();
        let previous = self.clone();
        if self.set_ftp_path(&parent).is_err() {
            *self = previous;
            self.share = share;
            return;
        }
        if self.share_name == share_name {
            self.share = share;
        }
        self.dir = true;
    }

    /// Resolves `arg` against this path. `.` keeps the directory, `..`
    /// climbs one level and fails at the root, a leading `/` restarts from
    /// the root. The final segment is added as a file when `last_is_file`.
    pub fn resolve(&self, arg: &str, last_is_file: bool) -> Result<FtpPath, PathError> {
        let mut path = if Self::is_relative(arg) {
            self.clone()
        } else {
            Self::root()
        };

        let segments: Vec<&str> = arg
            .split(FTP_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect();
        let last = segments.len().saturating_sub(1);

        for (idx, segment) in segments.iter().enumerate() {
            match *segment {
                "." => {}
                ".." => {
                    if path.is_root_path() {
                        return Err(PathError::AtRoot);
                    }
                    path.remove_directory();
                }
                name if idx == last && last_is_file => path.add_file(name),
                name => path.add_directory(name),
            }
        }
        Ok(path)
    }

    pub fn is_relative(path: &str) -> bool {
        !path.starts_with(FTP_SEPARATOR)
    }

    pub fn is_root_path(&self) -> bool {
        self.share_name.is_none()
    }

    pub fn is_root_share_path(&self) -> bool {
        self.share_name.is_some()
            && self
                .share_path
                .as_deref()
                .map_or(true, |path| path == DIR_SEPARATOR_STR)
    }

    pub fn ftp_path(&self) -> &str {
        &self.ftp_path
    }

    pub fn share_name(&self) -> Option<&str> {
        self.share_name.as_deref()
    }

    pub fn share_path(&self) -> Option<&str> {
        self.share_path.as_deref()
    }

    pub fn is_dir(&self) -> bool {
        self.dir
    }

    pub fn set_dir(&mut self, dir: bool) {
        self.dir = dir;
    }

    /// Last segment of the FTP form, empty for the root.
    pub fn name(&self) -> &str {
        self.ftp_path
            .rsplit(FTP_SEPARATOR)
            .next()
            .unwrap_or_default()
    }

    pub fn make_share_path_to_file(&self, name: &str) -> String {
        let base = self.share_path.as_deref().unwrap_or(DIR_SEPARATOR_STR);
        if base.ends_with(DIR_SEPARATOR) {
            format!("{}{}", base, name)
        } else {
            format!("{}{}{}", base, DIR_SEPARATOR, name)
        }
    }

    pub fn share(&self) -> Option<&Arc<Share>> {
        self.share.as_ref()
    }

    pub fn set_share(&mut self, share: Arc<Share>) {
        self.share = Some(share);
    }

    /// Binds the share named by the first segment, matched case-insensitively.
    pub fn set_shared_device(&mut self, shares: &[Arc<Share>]) -> bool {
        let Some(name) = self.share_name.as_deref() else {
            return false;
        };
        match shares
            .iter()
            .find(|share| share.name().eq_ignore_ascii_case(name))
        {
            Some(share) => {
                self.share = Some(Arc::clone(share));
                true
            }
            None => false,
        }
    }
}

impl Default for FtpPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for FtpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpPath")
            .field("ftp_path", &self.ftp_path)
            .field("share_name", &self.share_name)
            .field("share_path", &self.share_path)
            .field("dir", &self.dir)
            .field("bound", &self.share.is_some())
            .finish()
    }
}

impl fmt::Display for FtpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ftp_path)
    }
}
