use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::site::site_who::who_lines;
use crate::server::ServerContext;
use async_trait::async_trait;
use log::{info, warn};

/// Reply to a SITE command, sent as a multi-line reply when it has more
/// than one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SiteReply {
    pub fn new(code: u16, text: &str) -> Self {
        Self {
            code,
            lines: vec![text.to_string()],
        }
    }
}

/// Server-specific SITE subcommands.
#[async_trait]
pub trait SiteCommandHandler: Send + Sync {
    async fn handle(
        &self,
        server: &ServerContext,
        user: &str,
        command: &str,
        args: &[String],
    ) -> SiteReply;
}

/// `SITE WHO` and `SITE HELP`.
#[derive(Debug, Default)]
pub struct BuiltinSiteCommands;

#[async_trait]
impl SiteCommandHandler for BuiltinSiteCommands {
    async fn handle(
        &self,
        server: &ServerContext,
        user: &str,
        command: &str,
        _args: &[String],
    ) -> SiteReply {
        match command {
            "WHO" => SiteReply {
                code: 200,
                lines: who_lines(&server.registry),
            },
            "HELP" => SiteReply {
                code: 214,
                lines: vec![
                    String::from("SITE commands:"),
                    String::from(" WHO"),
                    String::from(" HELP"),
                    String::from("Help OK"),
                ],
            },
            _ => {
                warn!("Unknown SITE subcommand from {}: {}", user, command);
                SiteReply::new(500, "Unknown SITE command")
            }
        }
    }
}

pub async fn handle_site_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(handler) = ctx.server.site_handler.clone() else {
        return ctx.reply(501, "SITE commands not implemented").await;
    };
    let mut args: Vec<String> = arg
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect();
    if args.is_empty() {
        warn!("No subcommand provided for SITE command.");
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    }

    let subcommand = args.remove(0).to_ascii_uppercase();
    let user = ctx
        .session
        .lock()
        .await
        .user()
        .unwrap_or_default()
        .to_string();
    info!("Handling SITE {} command with args: {:?}", subcommand, args);

    let reply = handler.handle(&ctx.server, &user, &subcommand, &args).await;
    match reply.lines.as_slice() {
        [] => ctx.reply(reply.code, "OK").await,
        [line] => ctx.reply(reply.code, line).await,
        lines => ctx.reply_lines(reply.code, lines).await,
    }
}
