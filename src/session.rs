use crate::core_auth::Principal;
use crate::core_disk::DiskContext;
use crate::core_listing::FactMask;
use crate::core_network::datachan::DataChannel;
use crate::core_path::FtpPath;
use crate::core_share::{Share, TreeConnection};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    AwaitingUser,
    AwaitingPassword,
    LoggedOn,
    Closed,
}

/// Identity the client is logging on as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub user: String,
    pub guest: bool,
    pub home: Option<PathBuf>,
}

/// A RETR/STOR running on its own task.
#[derive(Debug)]
pub struct ActiveTransfer {
    pub id: u32,
    pub abort: CancellationToken,
    pub bytes: Arc<AtomicU64>,
    pub handle: JoinHandle<()>,
}

impl ActiveTransfer {
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// State of one control connection.
#[derive(Debug)]
pub struct Session {
    pub id: u32,
    pub unique_id: String,
    pub remote_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub state: SessionState,
    pub client: Option<ClientInfo>,
    pub principal: Option<Principal>,
    pub cwd: FtpPath,
    /// Where `/` and the initial directory point, a guest's home share.
    pub root_path: FtpPath,
    pub binary: bool,
    pub restart_pos: u64,
    pub utf8: bool,
    pub mlst_facts: FactMask,
    pub rename_from: Option<FtpPath>,
    /// Shares visible to this session, filled on first use.
    pub shares: Option<Vec<Arc<Share>>>,
    /// Per-session shares, the guest home share.
    pub dynamic_shares: Vec<Arc<Share>>,
    pub connections: HashMap<String, TreeConnection>,
    pub data_channel: Option<DataChannel>,
    pub active_transfer: Option<ActiveTransfer>,
    pub shutdown: CancellationToken,
    next_transfer_id: u32,
}

impl Session {
    pub fn new(
        id: u32,
        remote_addr: SocketAddr,
        local_addr: SocketAddr,
        root_path: FtpPath,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            unique_id: format!("FTP{}", id),
            remote_addr,
            local_addr,
            state: SessionState::New,
            client: None,
            principal: None,
            cwd: root_path.clone(),
            root_path,
            binary: false,
            restart_pos: 0,
            utf8: false,
            mlst_facts: FactMask::default(),
            rename_from: None,
            shares: None,
            dynamic_shares: Vec::new(),
            connections: HashMap::new(),
            data_channel: None,
            active_transfer: None,
            shutdown,
            next_transfer_id: 1,
        }
    }

    pub fn is_logged_on(&self) -> bool {
        self.state == SessionState::LoggedOn
    }

    pub fn is_guest(&self) -> bool {
        self.principal.as_ref().is_some_and(|p| p.guest)
    }

    pub fn user(&self) -> Option<&str> {
        self.client.as_ref().map(|client| client.user.as_str())
    }

    /// Disk identity for the logged on principal.
    pub fn disk_context(&self) -> Option<DiskContext> {
        self.principal.as_ref().map(|principal| DiskContext {
            session_id: self.id,
            user: principal.user.clone(),
            guest: principal.guest,
        })
    }

    pub fn next_transfer_id(&mut self) -> u32 {
        let id = self.next_transfer_id;
        self.next_transfer_id += 1;
        id
    }

    /// Cancellation token for a new data channel.
    pub fn channel_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Forgets the logged on identity, as a new USER does.
    pub fn reset_logon(&mut self) {
        self.client = None;
        self.principal = None;
        self.shares = None;
        self.dynamic_shares.clear();
        self.connections.clear();
        self.rename_from = None;
    }

    /// Drops the data channel and stops any running transfer.
    pub async fn release_data(&mut self) {
        if let Some(mut channel) = self.data_channel.take() {
            channel.close().await;
        }
        if let Some(transfer) = self.active_transfer.take() {
            transfer.abort.cancel();
        }
    }
}
