use log::{debug, trace, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum DataChannelError {
    #[error("Data channel is not bound")]
    NotBound,

    #[error("Failed to bind passive listener: {0}")]
    Bind(io::Error),

    #[error("Failed to connect to {0}: {1}")]
    Connect(SocketAddr, io::Error),

    #[error("Failed to accept data connection: {0}")]
    Accept(io::Error),

    #[error("Data connection cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelState {
    Listening,
    PendingConnect,
    Connected,
    Transferring,
    Closed,
}

#[derive(Debug)]
enum Mode {
    Active {
        target: SocketAddr,
        local_port: Option<u16>,
    },
    Passive {
        listener: Option<TcpListener>,
        local: SocketAddr,
    },
}

/// Data connection negotiated by PORT or PASV for one transfer or listing.
///
/// Active channels connect lazily on [`DataChannel::acquire_socket`], passive
/// channels listen from the moment they are bound. The abort token cancels a
/// pending accept and is polled by transfers between chunks.
#[derive(Debug)]
pub struct DataChannel {
    mode: Mode,
    socket: Option<TcpStream>,
    state: DataChannelState,
    bytes: Arc<AtomicU64>,
    abort: CancellationToken,
}

impl DataChannel {
    pub fn bind_active(target: SocketAddr, local_port: Option<u16>, abort: CancellationToken) -> Self {
        debug!("Active data channel bound to {}", target);
        Self {
            mode: Mode::Active { target, local_port },
            socket: None,
            state: DataChannelState::PendingConnect,
            bytes: Arc::new(AtomicU64::new(0)),
            abort,
        }
    }

    /// Opens the passive listener on `bind_addr`, on the first free port of
    /// `port_range` when one is given.
    pub async fn bind_passive(
        bind_addr: IpAddr,
        port_range: Option<(u16, u16)>,
        abort: CancellationToken,
    ) -> Result<Self, DataChannelError> {
        let listener = match port_range {
            Some((low, high)) => {
                let mut last_err = io::Error::from(io::ErrorKind::AddrInUse);
                let mut bound = None;
                for port in low..=high {
                    match TcpListener::bind((bind_addr, port)).await {
                        Ok(listener) => {
                            bound = Some(listener);
                            break;
                        }
                        Err(e) => last_err = e,
                    }
                }
                bound.ok_or(DataChannelError::Bind(last_err))?
            }
            None => TcpListener::bind((bind_addr, 0))
                .await
                .map_err(DataChannelError::Bind)?,
        };
        let local = listener.local_addr().map_err(DataChannelError::Bind)?;
        debug!("Passive data channel listening on {}", local);

        Ok(Self {
            mode: Mode::Passive {
                listener: Some(listener),
                local,
            },
            socket: None,
            state: DataChannelState::Listening,
            bytes: Arc::new(AtomicU64::new(0)),
            abort,
        })
    }

    /// Listening address of a passive channel.
    pub fn passive_address(&self) -> Option<SocketAddr> {
        match &self.mode {
            Mode::Passive { local, .. } => Some(*local),
            Mode::Active { .. } => None,
        }
    }

    pub fn is_passive(&self) -> bool {
        matches!(self.mode, Mode::Passive { .. })
    }

    pub fn state(&self) -> DataChannelState {
        self.state
    }

    pub fn set_transferring(&mut self) {
        self.state = DataChannelState::Transferring;
    }

    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    pub fn byte_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.bytes)
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn add_bytes(&self, count: usize) {
        self.bytes.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Returns the connected data socket, accepting or connecting on first
    /// use. Later calls return the same socket.
    pub async fn acquire_socket(&mut self) -> Result<&mut TcpStream, DataChannelError> {
        if self.socket.is_none() {
            let stream = match &mut self.mode {
                Mode::Passive { listener, .. } => {
                    // a passive listener serves a single connection
                    let listener = listener.take().ok_or(DataChannelError::NotBound)?;
                    tokio::select! {
                        biased;
                        _ = self.abort.cancelled() => {
                            return Err(DataChannelError::Cancelled);
                        }
                        accepted = listener.accept() => {
                            let (stream, addr) = accepted.map_err(DataChannelError::Accept)?;
                            debug!("Accepted data connection from {}", addr);
                            stream
                        }
                    }
                }
                Mode::Active { target, local_port } => {
                    let target = *target;
                    let local_port = *local_port;
                    tokio::select! {
                        biased;
                        _ = self.abort.cancelled() => {
                            return Err(DataChannelError::Cancelled);
                        }
                        connected = connect_active(target, local_port) => connected?,
                    }
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to disable send delay on data socket: {}", e);
            }
            self.socket = Some(stream);
            self.state = DataChannelState::Connected;
        }
        self.socket.as_mut().ok_or(DataChannelError::NotBound)
    }

    /// Shuts the data socket down and drops any listener.
    pub async fn close(&mut self) {
        if let Mode::Passive { listener, .. } = &mut self.mode {
            listener.take();
        }
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.shutdown().await {
                trace!("Data socket shutdown: {}", e);
            }
        }
        self.state = DataChannelState::Closed;
    }
}

async fn connect_active(
    target: SocketAddr,
    local_port: Option<u16>,
) -> Result<TcpStream, DataChannelError> {
    let socket = if target.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(|e| DataChannelError::Connect(target, e))?;

    if let Some(port) = local_port {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, port).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, port).into()
        };
        socket
            .set_reuseaddr(true)
            .and_then(|_| socket.bind(local))
            .map_err(|e| DataChannelError::Connect(target, e))?;
    }

    let stream = socket
        .connect(target)
        .await
        .map_err(|e| DataChannelError::Connect(target, e))?;
    debug!("Connected data channel to {}", target);
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn passive_accepts_once() {
        let token = CancellationToken::new();
        let mut channel = DataChannel::bind_passive(Ipv4Addr::LOCALHOST.into(), None, token)
            .await
            .unwrap();
        let addr = channel.passive_address().unwrap();
        assert_eq!(channel.state(), DataChannelState::Listening);

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            buf
        });

        channel.acquire_socket().await.unwrap().write_all(b"abc").await.unwrap();
        // second call hands back the same socket
        channel.acquire_socket().await.unwrap().write_all(b"def").await.unwrap();
        assert_eq!(channel.state(), DataChannelState::Connected);
        channel.close().await;

        assert_eq!(client.await.unwrap(), b"abcdef");
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn passive_accept_is_cancellable() {
        let token = CancellationToken::new();
        let mut channel =
            DataChannel::bind_passive(Ipv4Addr::LOCALHOST.into(), None, token.clone())
                .await
                .unwrap();
        token.cancel();
        assert!(matches!(
            channel.acquire_socket().await,
            Err(DataChannelError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn active_connects_lazily() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let target = listener.local_addr().unwrap();
        let mut channel = DataChannel::bind_active(target, None, CancellationToken::new());
        assert_eq!(channel.state(), DataChannelState::PendingConnect);

        let (accepted, socket) = tokio::join!(listener.accept(), channel.acquire_socket());
        assert!(accepted.is_ok());
        assert!(socket.is_ok());
    }

    #[tokio::test]
    async fn port_range_is_honoured() {
        let probe = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let channel = DataChannel::bind_passive(
            Ipv4Addr::LOCALHOST.into(),
            Some((port, port)),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(channel.passive_address().unwrap().port(), port);
    }
}
