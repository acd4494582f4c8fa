use crate::core_ftpcommand::handlers::CommandContext;

pub async fn handle_syst_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    ctx.reply(215, "UNIX Type: L8").await
}
