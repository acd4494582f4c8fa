pub mod core_auth;
pub mod helper;

pub use core_auth::{AuthError, Authenticator, PasswdEntry, Principal};
pub use helper::{hash_password, verify_password, PasswdAuthenticator, DEFAULT_COST};
