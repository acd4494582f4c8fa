pub mod disk_interface;
pub mod error;
pub mod local_disk;

pub use disk_interface::{
    DiskContext, DiskInterface, FileInfo, FileOpenParams, FileStatus, NetworkFile, OpenAction,
    SearchContext, SetFileInfo,
};
pub use error::DiskError;
pub use local_disk::LocalDisk;
