use crate::core_ftpcommand::handlers::CommandContext;
use log::info;

/// Handles the TYPE FTP command. `A` selects ASCII, `I` and `L` binary.
/// The flag is recorded only, data always moves unchanged.
pub async fn handle_type_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    // only the type letter matters, format and byte size are ignored
    let binary = match arg.trim_start().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('A') => false,
        Some('I' | 'L') => true,
        _ => return ctx.reply(501, "Syntax error in parameters or arguments").await,
    };
    ctx.session.lock().await.binary = binary;
    info!(
        "session={} Transfer type set to {}",
        ctx.session_id,
        if binary { "binary" } else { "ASCII" }
    );
    ctx.reply(200, "Command OK").await
}

/// Handles the STRU FTP command, only file structure is supported.
pub async fn handle_stru_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    match arg.as_deref().map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("F") => ctx.reply(200, "Command OK").await,
        _ => ctx.reply(504, "Obsolete").await,
    }
}

/// Handles the MODE FTP command, only stream mode is supported.
pub async fn handle_mode_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    match arg.as_deref().map(str::trim) {
        Some(m) if m.eq_ignore_ascii_case("S") => ctx.reply(200, "Command OK").await,
        _ => ctx.reply(504, "Obsolete").await,
    }
}
