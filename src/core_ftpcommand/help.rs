use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::handlers::CommandContext;

const COMMANDS_PER_LINE: usize = 8;

/// Handles the HELP FTP command by listing every recognized command.
pub async fn handle_help_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    let mut lines = vec![String::from("The following commands are recognized:")];
    for chunk in FtpCommand::ALL.chunks(COMMANDS_PER_LINE) {
        let names: Vec<String> = chunk.iter().map(|c| format!("{:<5}", c.name())).collect();
        lines.push(format!(" {}", names.join(" ").trim_end()));
    }
    lines.push(String::from("Help OK"));
    ctx.reply_lines(214, &lines).await
}
