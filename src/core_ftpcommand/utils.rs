use crate::core_disk::{DiskContext, FileStatus};
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_network::transfer::{self, TransferJob, TransferOutcome};
use crate::core_path::{FtpPath, DIR_SEPARATOR_STR};
use crate::core_share::{Share, TreeConnection};
use crate::server::ServerContext;
use crate::session::{ActiveTransfer, Session};
use log::{debug, warn};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// What the final segment of a request path must name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Any,
}

/// Shares the session can see. Guests only see their own share, everyone
/// else the configured shares filtered once per logon.
pub fn share_list(session: &mut Session, server: &ServerContext) -> Vec<Arc<Share>> {
    if session.is_guest() {
        return session.dynamic_shares.clone();
    }
    if let Some(shares) = &session.shares {
        return shares.clone();
    }
    let shares = match &session.principal {
        Some(principal) => server
            .access_control
            .filter_share_list(principal, &server.shares),
        None => Vec::new(),
    };
    session.shares = Some(shares.clone());
    shares
}

/// Connects the session to `share`. Connections to permanent shares are
/// cached for the rest of the logon.
pub fn tree_connection(
    session: &mut Session,
    server: &ServerContext,
    share: &Arc<Share>,
) -> Option<TreeConnection> {
    if let Some(connection) = session.connections.get(share.name()) {
        return Some(connection.clone());
    }
    let principal = session.principal.as_ref()?;
    let access = server.access_control.check_access_control(principal, share);
    let connection = TreeConnection::new(Arc::clone(share), access);
    if !share.is_temporary() {
        session
            .connections
            .insert(share.name().to_string(), connection.clone());
    }
    Some(connection)
}

/// Whether the session may read (or write) below `path`. The pseudo-root
/// holding the shares is readable but never writeable.
pub fn check_access(
    session: &mut Session,
    server: &ServerContext,
    path: &FtpPath,
    write: bool,
) -> bool {
    let Some(share) = path.share().cloned() else {
        return path.is_root_path() && !write;
    };
    let Some(connection) = tree_connection(session, server, &share) else {
        return false;
    };
    let allowed = if write {
        connection.has_write_access()
    } else {
        connection.has_read_access()
    };
    if !allowed {
        debug!(
            "session={} {:?} access to share {} refuses {}",
            session.id,
            connection.permission(),
            connection.share().name(),
            if write { "writing" } else { "reading" }
        );
    }
    allowed
}

/// The share a bound path lives on and its share-relative form.
pub fn share_target(path: &FtpPath) -> Option<(Arc<Share>, String)> {
    let share = Arc::clone(path.share()?);
    let share_path = path.share_path().unwrap_or(DIR_SEPARATOR_STR).to_string();
    Some((share, share_path))
}

/// Turns a command argument into a path bound to its share.
///
/// `/` is the session root, and for guests so is anything that lands on
/// the pseudo-root. Other arguments are resolved against the current
/// directory, and when that fails a relative argument is retried from the
/// pseudo-root. With `check_exists` the final segment must exist
/// as `kind`, and the directory flag is set from what was found.
pub async fn generate_path_for_request(
    session: &mut Session,
    server: &ServerContext,
    arg: &str,
    kind: PathKind,
    check_exists: bool,
) -> Option<FtpPath> {
    if arg == "/" {
        return Some(session.root_path.clone());
    }

    let mut path = match session.cwd.resolve(arg, kind == PathKind::File) {
        Ok(path) => path,
        Err(e) => {
            debug!("session={} Cannot resolve {}: {}", session.id, arg, e);
            return None;
        }
    };
    if path.is_root_path() {
        // guests never leave their own share
        if session.is_guest() {
            return Some(session.root_path.clone());
        }
        return Some(path);
    }

    let shares = share_list(session, server);
    let disk_ctx = session.disk_context();
    if bind_and_check(&mut path, &shares, disk_ctx.as_ref(), kind, check_exists).await {
        return Some(path);
    }

    if FtpPath::is_relative(arg) {
        let mut path = FtpPath::root().resolve(arg, kind == PathKind::File).ok()?;
        if !path.is_root_path()
            && bind_and_check(&mut path, &shares, disk_ctx.as_ref(), kind, check_exists).await
        {
            return Some(path);
        }
    }
    None
}

async fn bind_and_check(
    path: &mut FtpPath,
    shares: &[Arc<Share>],
    disk_ctx: Option<&DiskContext>,
    kind: PathKind,
    check_exists: bool,
) -> bool {
    if !path.set_shared_device(shares) {
        return false;
    }
    if !check_exists {
        return true;
    }

    let status = if path.is_root_share_path() {
        FileStatus::DirectoryExists
    } else {
        let (Some(share), Some(share_path), Some(disk_ctx)) =
            (path.share(), path.share_path(), disk_ctx)
        else {
            return false;
        };
        share.disk().file_exists(disk_ctx, share_path).await
    };

    let found = matches!(
        (kind, status),
        (PathKind::File, FileStatus::FileExists)
            | (PathKind::Directory, FileStatus::DirectoryExists)
            | (PathKind::Any, FileStatus::FileExists | FileStatus::DirectoryExists)
    );
    if found {
        path.set_dir(status == FileStatus::DirectoryExists);
    }
    found
}

/// Refuses a RETR/STOR/APPE that already has a data channel. The channel
/// is released so no listener stays open behind the error reply.
pub async fn reject_transfer(
    ctx: &CommandContext,
    code: u16,
    text: &str,
) -> Result<(), std::io::Error> {
    ctx.session.lock().await.release_data().await;
    ctx.reply(code, text).await
}

/// Runs a RETR/STOR transfer and sends its final reply.
///
/// With threaded transfers the job moves to a worker task and the command
/// returns at once, so ABOR can be read while data flows. The session lock
/// is held until the transfer is registered, which keeps the worker from
/// finishing before it can be found.
pub async fn run_transfer(ctx: &CommandContext, job: TransferJob) -> Result<(), std::io::Error> {
    if !ctx.config().server.threaded_transfers {
        let outcome = transfer::execute(job).await;
        return transfer::send_outcome(&ctx.writer, &outcome).await;
    }

    let mut session = ctx.session.lock().await;
    let id = job.transfer_id;
    let abort = job.channel.abort_token();
    let bytes = job.channel.byte_counter();

    let writer = Arc::clone(&ctx.writer);
    let worker_session = Arc::clone(&ctx.session);
    let worker_abort = abort.clone();
    let worker_bytes = Arc::clone(&bytes);
    let session_id = ctx.session_id;
    let handle = tokio::spawn(async move {
        let outcome = transfer::execute(job).await;
        {
            let mut session = worker_session.lock().await;
            if session.active_transfer.as_ref().is_some_and(|t| t.id == id) {
                session.active_transfer = None;
            }
        }
        let outcome = if worker_abort.is_cancelled() {
            TransferOutcome::Aborted(worker_bytes.load(Ordering::Relaxed))
        } else {
            outcome
        };
        if let Err(e) = transfer::send_outcome(&writer, &outcome).await {
            warn!("session={} transfer={} Failed to send reply: {}", session_id, id, e);
        }
    });

    session.active_transfer = Some(ActiveTransfer {
        id,
        abort,
        bytes,
        handle,
    });
    Ok(())
}
