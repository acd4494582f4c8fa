use crate::charset::decode_command;
use crate::constants::MAX_COMMAND_LINE;
use crate::core_ftpcommand::ftpcommand::FtpRequest;
use crate::core_ftpcommand::handlers::{dispatch, CommandContext};
use crate::core_network::registry::{SessionGuard, SessionInfo};
use crate::helpers::{format_multiline, send_response, ControlWriter};
use crate::server::ServerContext;
use crate::session::{Session, SessionState};
use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle on a running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    ctx: Arc<ServerContext>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    /// Ends the accept loop and signals every session to close, without
    /// waiting for them.
    pub fn stop(&self) {
        self.ctx.registry.shutdown_all();
    }

    /// Waits for the accept loop to finish.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!("Accept loop ended abnormally: {}", e);
        }
    }
}

pub async fn start_server(ctx: Arc<ServerContext>) -> Result<ServerHandle> {
    let addr = format!(
        "{}:{}",
        ctx.config.server.listen_address, ctx.config.server.listen_port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind control listener on {}", addr))?;
    let local_addr = listener.local_addr()?;
    info!("Server listening on {}", local_addr);

    let shutdown = ctx.registry.shutdown_token();
    let task = tokio::spawn(accept_loop(listener, Arc::clone(&ctx), shutdown));

    Ok(ServerHandle {
        local_addr,
        ctx,
        task,
    })
}

async fn accept_loop(listener: TcpListener, ctx: Arc<ServerContext>, shutdown: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Server stopping, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((socket, addr)) => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket, ctx).await {
                        error!("Connection error for {}: {:#}", addr, e);
                    }
                });
            }
            Err(e) => error!("Failed to accept control connection: {}", e),
        }
    }
}

pub async fn handle_connection(socket: TcpStream, ctx: Arc<ServerContext>) -> Result<()> {
    let remote_addr = socket.peer_addr()?;
    let local_addr = socket.local_addr()?;
    socket.set_nodelay(true)?;

    let id = ctx.registry.next_id();
    let shutdown = ctx.registry.shutdown_token().child_token();
    info!("session={} New connection from {}", id, remote_addr);

    ctx.registry.add(SessionInfo {
        id,
        remote_addr,
        user: None,
        opened: Local::now(),
        shutdown: shutdown.clone(),
    });
    let _guard = SessionGuard::new(Arc::clone(&ctx.registry), id);

    let (read_half, write_half) = socket.into_split();
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));
    let session = Arc::new(Mutex::new(Session::new(
        id,
        remote_addr,
        local_addr,
        ctx.root_path(),
        shutdown.clone(),
    )));

    send_banner(&writer, &ctx).await?;
    session.lock().await.state = SessionState::AwaitingUser;

    let result = command_loop(read_half, &writer, &ctx, &session, &shutdown).await;

    close_session(&session, &writer).await;
    info!("session={} Connection closed for {}", id, remote_addr);
    result
}

async fn send_banner(writer: &ControlWriter, ctx: &ServerContext) -> std::io::Result<()> {
    match &ctx.banner {
        Some(banner) => {
            let mut lines: Vec<String> = banner.lines().map(String::from).collect();
            lines.push(String::from("Service ready"));
            send_response(writer, format_multiline(220, &lines).as_bytes()).await
        }
        None => send_response(writer, b"220 shareftpd ready\r\n").await,
    }
}

async fn command_loop(
    read_half: OwnedReadHalf,
    writer: &ControlWriter,
    ctx: &Arc<ServerContext>,
    session: &Arc<Mutex<Session>>,
    shutdown: &CancellationToken,
) -> Result<()> {
    let id = session.lock().await.id;
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("session={} Shutdown requested", id);
                break;
            }
            read = read_command_line(&mut reader, &mut line) => read?,
        };
        match read {
            LineRead::Eof => {
                info!("session={} Client disconnected", id);
                break;
            }
            LineRead::Overlong => {
                warn!("session={} Discarded a command line over {} bytes", id, MAX_COMMAND_LINE);
                send_response(writer, b"500 Command line too long\r\n").await?;
                continue;
            }
            LineRead::Line => {}
        }

        let (utf8, charset) = {
            let session = session.lock().await;
            (session.utf8, ctx.config.server.charset)
        };
        let text = decode_command(&line, utf8, charset);
        let request = FtpRequest::parse(&text);
        if request.token.is_empty() {
            continue;
        }
        debug!("session={} < {}", id, request.log_line());

        let mut cmd_ctx = CommandContext::new(
            Arc::clone(writer),
            Arc::clone(ctx),
            Arc::clone(session),
            id,
            utf8,
        );
        match dispatch(&mut cmd_ctx, request).await {
            Ok(()) => cmd_ctx.uow.end(),
            Err(e) => {
                cmd_ctx.uow.rollback();
                error!("session={} Control connection failed: {}", id, e);
                break;
            }
        }

        if session.lock().await.state == SessionState::Closed {
            break;
        }
    }
    Ok(())
}

enum LineRead {
    Line,
    Overlong,
    Eof,
}

/// Reads one command line of at most [`MAX_COMMAND_LINE`] bytes. Longer
/// lines are drained up to their newline and dropped.
async fn read_command_line(
    reader: &mut BufReader<OwnedReadHalf>,
    line: &mut Vec<u8>,
) -> std::io::Result<LineRead> {
    let limit = MAX_COMMAND_LINE as u64;
    let read = (&mut *reader).take(limit).read_until(b'\n', line).await?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    if line.last() == Some(&b'\n') || read < MAX_COMMAND_LINE {
        return Ok(LineRead::Line);
    }

    loop {
        line.clear();
        let read = (&mut *reader).take(limit).read_until(b'\n', line).await?;
        if read == 0 || line.last() == Some(&b'\n') {
            break;
        }
    }
    line.clear();
    Ok(LineRead::Overlong)
}

async fn close_session(session: &Arc<Mutex<Session>>, writer: &ControlWriter) {
    {
        let mut session = session.lock().await;
        session.state = SessionState::Closed;
        session.rename_from = None;
        session.release_data().await;
    }
    let mut writer = writer.lock().await;
    if let Err(e) = writer.shutdown().await {
        debug!("Control socket shutdown: {}", e);
    }
}
