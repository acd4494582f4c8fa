pub mod datachan;
pub mod network;
pub mod pasv;
pub mod port;
pub mod registry;
pub mod transfer;

#[cfg(test)]
mod test_session;
