use crate::core_ftpcommand::handlers::CommandContext;

pub async fn handle_noop_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    ctx.reply(200, "Command OK").await
}
