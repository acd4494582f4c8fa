use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, PathKind};
use log::debug;

/// Handles the RNFR FTP command. The source must exist and be writeable,
/// share roots cannot be renamed.
pub async fn handle_rnfr_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let mut session = ctx.session.lock().await;
    session.rename_from = None;
    let Some(path) =
        generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::Any, true).await
    else {
        drop(session);
        return ctx.reply(550, "File not found").await;
    };
    if path.is_root_path()
        || path.is_root_share_path()
        || !check_access(&mut session, &ctx.server, &path, true)
    {
        drop(session);
        return ctx.reply(550, "Access denied").await;
    }

    debug!("session={} Rename from {}", ctx.session_id, path);
    session.rename_from = Some(path);
    drop(session);
    ctx.reply(350, "File exists, ready for destination name").await
}
