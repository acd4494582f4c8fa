use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, PathKind};
use log::debug;

pub async fn handle_cwd_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let mut session = ctx.session.lock().await;
    let Some(path) =
        generate_path_for_request(&mut session, &ctx.server, &arg, PathKind::Directory, true).await
    else {
        drop(session);
        return ctx.reply(550, "Directory not found").await;
    };
    if !check_access(&mut session, &ctx.server, &path, false) {
        drop(session);
        return ctx.reply(550, "Access denied").await;
    }

    debug!("session={} Changed directory to {}", ctx.session_id, path);
    session.cwd = path;
    drop(session);
    ctx.reply(250, "Requested file action OK").await
}
