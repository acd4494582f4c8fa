use crate::core_ftpcommand::handlers::CommandContext;
use crate::session::{ClientInfo, SessionState};
use log::info;

/// Handles the USER FTP command.
///
/// Starts a new logon. Any previous identity is forgotten, and the
/// configured anonymous account switches the session to guest logon.
///
/// # Arguments
///
/// * `ctx` - The command context of the session.
/// * `arg` - The user name provided by the client.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be sent.
pub async fn handle_user_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(username) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let anonymous = &ctx.config().anonymous;
    let guest = anonymous.enabled && username.eq_ignore_ascii_case(&anonymous.account);

    {
        let mut session = ctx.session.lock().await;
        session.reset_logon();
        session.state = SessionState::AwaitingPassword;
        session.client = Some(ClientInfo {
            user: username.clone(),
            guest,
            home: None,
        });
    }

    if guest {
        info!("session={} Guest login initiated as {}", ctx.session_id, username);
        ctx.reply(331, "Guest login ok, send your complete e-mail address as password")
            .await
    } else {
        info!("session={} Username accepted: {}", ctx.session_id, username);
        ctx.reply(331, &format!("User name okay, need password for {}", username))
            .await
    }
}
