use crate::core_ftpcommand::handlers::CommandContext;
use crate::session::SessionState;
use log::info;

/// Handles the QUIT FTP command.
///
/// Says goodbye and marks the session closed, the connection loop then
/// releases the data channel and shuts the control socket down.
pub async fn handle_quit_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    info!("session={} Received QUIT command. Closing connection.", ctx.session_id);
    ctx.session.lock().await.state = SessionState::Closed;
    ctx.reply(221, "Bye").await
}
