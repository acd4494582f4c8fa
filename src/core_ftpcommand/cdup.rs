use crate::core_ftpcommand::handlers::CommandContext;
use log::debug;

/// Handles the CDUP FTP command. The session root is the ceiling, a guest
/// cannot climb out of their home share.
pub async fn handle_cdup_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    let mut session = ctx.session.lock().await;
    if session.cwd.is_root_path() || session.cwd.ftp_path() == session.root_path.ftp_path() {
        drop(session);
        return ctx.reply(550, "Already at root directory").await;
    }

    session.cwd.remove_directory();
    debug!("session={} Changed directory to {}", ctx.session_id, session.cwd);
    drop(session);
    ctx.reply(250, "Requested file action OK").await
}
