use crate::core_ftpcommand::handlers::CommandContext;
use log::debug;

/// Handles the REST FTP command. The offset is used by the next RETR.
pub async fn handle_rest_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(position) = arg.as_deref().and_then(|a| a.trim().parse::<u64>().ok()) else {
        return ctx.reply(501, "Invalid restart position").await;
    };

    ctx.session.lock().await.restart_pos = position;
    debug!("session={} Restart position {}", ctx.session_id, position);
    ctx.reply(350, "Restart OK").await
}
