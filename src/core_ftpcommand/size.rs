use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, share_target, PathKind};
use crate::core_txn::TxnMode;
use log::warn;

/// Handles the SIZE FTP command, replying with the byte size of a file.
pub async fn handle_size_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    if !ctx.config().features.size {
        return ctx.reply(502, "Command not implemented").await;
    }
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let (target, allowed, disk_ctx) = {
        let mut session = ctx.session.lock().await;
        let path =
            generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::File, true).await;
        let allowed = path
            .as_ref()
            .is_some_and(|p| check_access(&mut session, &ctx.server, p, false));
        (path.as_ref().and_then(share_target), allowed, session.disk_context())
    };
    let (Some((share, share_path)), Some(disk_ctx)) = (target, disk_ctx) else {
        return ctx.reply(550, "File not found").await;
    };
    if !allowed {
        return ctx.reply(550, "Access denied").await;
    }

    ctx.uow.begin(TxnMode::ReadOnly);
    match share.disk().get_file_information(&disk_ctx, &share_path).await {
        Ok(info) => ctx.reply(213, &info.size.to_string()).await,
        Err(e) => {
            warn!("session={} SIZE {} failed: {}", ctx.session_id, arg, e);
            let (code, text) = e.reply();
            ctx.reply(code, text).await
        }
    }
}
