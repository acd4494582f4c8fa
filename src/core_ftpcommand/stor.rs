use crate::core_disk::{FileOpenParams, FileStatus, OpenAction};
use crate::core_events::FileAction;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{
    check_access, generate_path_for_request, reject_transfer, run_transfer, share_target,
    PathKind,
};
use crate::core_network::transfer::{Direction, TransferJob};
use crate::core_txn::TxnMode;
use log::{info, warn};
use std::sync::Arc;

/// Handles the STOR FTP command, replacing any existing file.
pub async fn handle_stor_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    store(ctx, arg, OpenAction::Truncate).await
}

/// Handles the APPE FTP command, writing after the end of an existing file.
pub async fn handle_appe_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    store(ctx, arg, OpenAction::Append).await
}

async fn store(
    ctx: &mut CommandContext,
    arg: Option<String>,
    action: OpenAction,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let mut session = ctx.session.lock().await;
    if session.active_transfer.is_some() {
        drop(session);
        return ctx.reply(425, "Transfer in progress").await;
    }
    if session.data_channel.is_none() {
        drop(session);
        return ctx.reply(425, "Can't open data connection").await;
    }

    let Some(path) =
        generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::File, false).await
    else {
        drop(session);
        return reject_transfer(ctx, 500, "Invalid path").await;
    };
    if path.is_root_path()
        || path.is_root_share_path()
        || !check_access(&mut session, &ctx.server, &path, true)
    {
        drop(session);
        return reject_transfer(ctx, 550, "Access denied").await;
    }
    let disk_ctx = session.disk_context();
    let transfer_id = session.next_transfer_id();
    drop(session);

    let (Some((share, share_path)), Some(disk_ctx)) = (share_target(&path), disk_ctx) else {
        return reject_transfer(ctx, 550, "Access denied").await;
    };

    let params = FileOpenParams::write(&share_path, action);
    let status = share.disk().file_exists(&disk_ctx, &share_path).await;
    ctx.uow.begin(TxnMode::ReadWrite);
    let opened = match status {
        FileStatus::DirectoryExists => {
            return reject_transfer(ctx, 550, "Cannot overwrite a directory").await;
        }
        FileStatus::FileExists => share
            .disk()
            .open_file(&disk_ctx, &params)
            .await
            .map(|file| {
                share.notify_file_changed(FileAction::Modified, &share_path);
                file
            }),
        FileStatus::NotExist => share
            .disk()
            .create_file(&disk_ctx, &params)
            .await
            .map(|file| {
                share.notify_file_changed(FileAction::Added, &share_path);
                file
            }),
    };
    let file = match opened {
        Ok(file) => file,
        Err(e) => {
            warn!("session={} Failed to open {} for writing: {}", ctx.session_id, path, e);
            let (code, text) = e.reply();
            return reject_transfer(ctx, code, text).await;
        }
    };
    ctx.uow.end();

    let offset = match action {
        OpenAction::Append => file.size,
        _ => 0,
    };

    let channel = ctx.session.lock().await.data_channel.take();
    let Some(channel) = channel else {
        if let Err(e) = share.disk().close_file(&disk_ctx, &file).await {
            warn!("session={} Failed to close {}: {}", ctx.session_id, path, e);
        }
        return ctx.reply(425, "Can't open data connection").await;
    };

    info!(
        "session={} Receiving {} at offset {}",
        ctx.session_id, path, offset
    );
    let job = TransferJob {
        session_id: ctx.session_id,
        transfer_id,
        direction: Direction::Store,
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
