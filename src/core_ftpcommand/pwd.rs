// src/core_ftpcommand/pwd.rs
use crate::core_ftpcommand::handlers::CommandContext;

pub async fn handle_pwd_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    let current_dir = ctx.session.lock().await.cwd.ftp_path().to_string();
    // embedded quotes are doubled
    let response = format!("\"{}\"", current_dir.replace('"', "\"\""));
    ctx.reply(257, &response).await
}
