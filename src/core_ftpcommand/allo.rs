use crate::core_ftpcommand::handlers::CommandContext;

/// Handles the ALLO FTP command. Storage is never reserved up front.
pub async fn handle_allo_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    ctx.reply(202, "Obsolete").await
}
