pub mod charset;
pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_disk;
pub mod core_events;
pub mod core_ftpcommand;
pub mod core_listing;
pub mod core_network;
pub mod core_path;
pub mod core_share;
pub mod core_txn;
pub mod helpers;
pub mod server;
pub mod session;

pub use config::Config;
pub use server::ServerContext;
