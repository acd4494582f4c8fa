use crate::core_disk::FileOpenParams;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{
    check_access, generate_path_for_request, reject_transfer, run_transfer, share_target,
    PathKind,
};
use crate::core_network::transfer::{Direction, TransferJob};
use crate::core_txn::TxnMode;
use log::{info, warn};
use std::sync::Arc;

/// Handles the RETR FTP command.
///
/// Sends a file over the data channel, starting at the REST offset. The
/// offset is consumed by every RETR, whether it succeeds or not.
///
/// # Arguments
///
/// * `ctx` - The command context of the session.
/// * `arg` - Path of the file to send.
pub async fn handle_retr_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let mut session = ctx.session.lock().await;
    let offset = std::mem::take(&mut session.restart_pos);
    if session.active_transfer.is_some() {
        drop(session);
        return ctx.reply(425, "Transfer in progress").await;
    }
    if session.data_channel.is_none() {
        drop(session);
        return ctx.reply(425, "Can't open data connection").await;
    }

    let Some(path) =
        generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::Any, true).await
    else {
        drop(session);
        return reject_transfer(ctx, 500, "Invalid path").await;
    };
    if path.is_dir() {
        drop(session);
        return reject_transfer(ctx, 550, "Not a plain file").await;
    }
    if !check_access(&mut session, &ctx.server, &path, false) {
        drop(session);
        return reject_transfer(ctx, 550, "Access denied").await;
    }
    let disk_ctx = session.disk_context();
    let transfer_id = session.next_transfer_id();
    drop(session);

    let (Some((share, share_path)), Some(disk_ctx)) = (share_target(&path), disk_ctx) else {
        return reject_transfer(ctx, 550, "Access denied").await;
    };

    ctx.uow.begin(TxnMode::ReadOnly);
    let file = match share
        .disk()
        .open_file(&disk_ctx, &FileOpenParams::read(&share_path))
        .await
    {
        Ok(file) => file,
        Err(e) => {
            warn!("session={} Failed to open {}: {}", ctx.session_id, path, e);
            let (code, text) = e.reply();
            return reject_transfer(ctx, code, text).await;
        }
    };
    ctx.uow.end();

    let channel = ctx.session.lock().await.data_channel.take();
    let Some(channel) = channel else {
        if let Err(e) = share.disk().close_file(&disk_ctx, &file).await {
            warn!("session={} Failed to close {}: {}", ctx.session_id, path, e);
        }
        return ctx.reply(425, "Can't open data connection").await;
    };

    info!(
        "session={} Sending {} ({} bytes) from offset {}",
        ctx.session_id, path, file.size, offset
    );
    let job = TransferJob {
        session_id: ctx.session_id,
        transfer_id,
        direction: Direction::Return,
        writer: Arc::clone(&ctx.writer),
        channel,
        disk: Arc::clone(share.disk()),
        disk_ctx,
        transactions: Arc::clone(&ctx.server.transactions),
        file,
        offset,
        buffer_size: ctx.config().server.buffer_size,
    };
    run_transfer(ctx, job).await
}
