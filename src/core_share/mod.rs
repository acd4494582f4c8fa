pub mod access;
pub mod home;
pub mod share;

pub use access::{AccessControlManager, ConfigAccessControl};
pub use home::{HomeShareFactory, LocalHomeShareFactory, ShareError};
pub use share::{Access, Share, TreeConnection};
