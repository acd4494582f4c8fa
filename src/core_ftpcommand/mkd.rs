use crate::core_disk::FileStatus;
use crate::core_events::FileAction;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, share_target, PathKind};
use crate::core_txn::TxnMode;
use log::{info, warn};

/// Handles the MKD FTP command. Directories cannot be created in the
/// pseudo-root, that would be a new share.
pub async fn handle_mkd_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let mut session = ctx.session.lock().await;
    let path =
        generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::Directory, false).await;
    let Some(path) = path else {
        drop(session);
        return ctx.reply(550, "Invalid path").await;
    };
    if path.is_root_path()
        || path.is_root_share_path()
        || !check_access(&mut session, &ctx.server, &path, true)
    {
        drop(session);
        return ctx.reply(550, "Access denied").await;
    }
    let disk_ctx = session.disk_context();
    drop(session);

    let (Some((share, share_path)), Some(disk_ctx)) = (share_target(&path), disk_ctx) else {
        return ctx.reply(550, "Access denied").await;
    };
    match share.disk().file_exists(&disk_ctx, &share_path).await {
        FileStatus::DirectoryExists => return ctx.reply(450, "Directory already exists").await,
        FileStatus::FileExists => return ctx.reply(450, "File exists with that name").await,
        FileStatus::NotExist => {}
    }

    ctx.uow.begin(TxnMode::ReadWrite);
    match share.disk().create_directory(&disk_ctx, &share_path).await {
        Ok(()) => {
            info!("session={} Created directory {}", ctx.session_id, path);
            share.notify_file_changed(FileAction::DirectoryAdded, &share_path);
            ctx.reply(250, path.ftp_path()).await
        }
        Err(e) => {
            warn!("session={} Failed to create {}: {}", ctx.session_id, path, e);
            let (code, text) = e.reply();
            ctx.reply(code, text).await
        }
    }
}
