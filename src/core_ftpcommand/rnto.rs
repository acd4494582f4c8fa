use crate::core_disk::FileStatus;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, share_target, PathKind};
use crate::core_txn::TxnMode;
use log::{info, warn};

/// Handles the RNTO FTP command, completing the rename started by RNFR.
/// Both names must be on the same share and the target must not exist.
pub async fn handle_rnto_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let mut session = ctx.session.lock().await;
    let Some(from) = session.rename_from.take() else {
        drop(session);
        return ctx.reply(550, "Rename from not set").await;
    };
    let Some(arg) = arg else {
        drop(session);
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let kind = if from.is_dir() {
        PathKind::Directory
    } else {
        PathKind::File
    };
    let to = generate_path_for_request(&mut session, &ctx.server, &arg, kind, false).await;
    let Some(to) = to.filter(|to| !to.is_root_path() && !to.is_root_share_path()) else {
        drop(session);
        return ctx.reply(550, "Access denied").await;
    };
    let same_share = from
        .share_name()
        .zip(to.share_name())
        .is_some_and(|(a, b)| a.eq_ignore_ascii_case(b));
    if !same_share {
        drop(session);
        return ctx.reply(550, "Cannot rename across shares").await;
    }
    if !check_access(&mut session, &ctx.server, &to, true) {
        drop(session);
        return ctx.reply(550, "Access denied").await;
    }
    let disk_ctx = session.disk_context();
    drop(session);

    let (Some((share, from_path)), Some((_, to_path)), Some(disk_ctx)) =
        (share_target(&from), share_target(&to), disk_ctx)
    else {
        return ctx.reply(550, "Access denied").await;
    };

    match share.disk().file_exists(&disk_ctx, &to_path).await {
        FileStatus::DirectoryExists => return ctx.reply(450, "Directory already exists").await,
        FileStatus::FileExists => return ctx.reply(450, "File exists with that name").await,
        FileStatus::NotExist => {}
    }

    ctx.uow.begin(TxnMode::ReadWrite);
    match share.disk().rename_file(&disk_ctx, &from_path, &to_path).await {
        Ok(()) => {
            info!("session={} Renamed {} to {}", ctx.session_id, from, to);
            share.notify_rename(&from_path, &to_path);
            ctx.reply(250, "Requested file action OK").await
        }
        Err(e) => {
            warn!("session={} Failed to rename {} to {}: {}", ctx.session_id, from, to, e);
            let (code, text) = e.reply();
            ctx.reply(code, text).await
        }
    }
}
