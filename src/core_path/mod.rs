pub mod ftp_path;

#[cfg(test)]
mod test_ftp_path;

pub use ftp_path::{FtpPath, PathError, DIR_SEPARATOR, DIR_SEPARATOR_STR, FTP_SEPARATOR};
