use crate::core_events::FileAction;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, share_target, PathKind};
use crate::core_txn::TxnMode;
use log::{info, warn};

pub async fn handle_dele_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let (target, allowed, disk_ctx) = {
        let mut session = ctx.session.lock().await;
        let path =
            generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::File, true).await;
        let allowed = path
            .as_ref()
            .is_some_and(|p| check_access(&mut session, &ctx.server, p, true));
        (path.as_ref().and_then(share_target), allowed, session.disk_context())
    };
    let (Some((share, share_path)), Some(disk_ctx)) = (target, disk_ctx) else {
        return ctx.reply(550, "File not found").await;
    };
    if !allowed {
        return ctx.reply(550, "Access denied").await;
    }

    ctx.uow.begin(TxnMode::ReadWrite);
    match share.disk().delete_file(&disk_ctx, &share_path).await {
        Ok(()) => {
            info!("session={} Deleted {}{}", ctx.session_id, share.name(), share_path);
            share.notify_file_changed(FileAction::Removed, &share_path);
            ctx.reply(250, "Requested file action OK").await
        }
        Err(e) => {
            warn!("session={} Failed to delete {}: {}", ctx.session_id, arg, e);
            let (code, text) = e.reply();
            ctx.reply(code, text).await
        }
    }
}
