use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_listing::FactMask;
use log::debug;

/// Handles the OPTS FTP command for `UTF8 ON|OFF` and `MLST <facts>`.
pub async fn handle_opts_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };
    let (option, value) = match arg.trim().split_once(' ') {
        Some((option, value)) => (option.to_ascii_uppercase(), value.trim().to_string()),
        None => (arg.trim().to_ascii_uppercase(), String::new()),
    };

    match option.as_str() {
        "UTF8" if ctx.config().features.utf8 => {
            let utf8 = match value.to_ascii_uppercase().as_str() {
                "ON" | "" => true,
                "OFF" => false,
                _ => return ctx.reply(501, "OPTS UTF8 Invalid argument").await,
            };
            ctx.session.lock().await.utf8 = utf8;
            debug!("session={} UTF8 {}", ctx.session_id, utf8);
            ctx.reply(200, if utf8 { "OPTS UTF8 ON" } else { "OPTS UTF8 OFF" })
                .await
        }
        "MLST" if ctx.config().features.mlst => match FactMask::parse(&value) {
            Some(mask) => {
                ctx.session.lock().await.mlst_facts = mask;
                ctx.reply(200, &format!("MLST OPTS {}", mask.names())).await
            }
            None => ctx.reply(501, "OPTS MLST Invalid argument").await,
        },
        "UTF8" | "MLST" => ctx.reply(502, "Command not implemented").await,
        _ => ctx.reply(501, "Option not understood").await,
    }
}
