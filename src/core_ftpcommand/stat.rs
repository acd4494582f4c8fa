use crate::core_ftpcommand::handlers::CommandContext;

/// Handles the STAT FTP command with a short status of the session,
/// including the progress of a running transfer.
pub async fn handle_stat_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    let mut lines = vec![String::from("shareftpd status:")];
    {
        let session = ctx.session.lock().await;
        lines.push(format!(" Connected to {}", session.remote_addr));
        if let Some(user) = session.user().filter(|_| session.is_logged_on()) {
            lines.push(format!(" Logged in as {}", user));
        }
        lines.push(format!(
            " TYPE: {}",
            if session.binary { "BINARY" } else { "ASCII" }
        ));
        if let Some(transfer) = &session.active_transfer {
            lines.push(format!(
                " Transfer in progress, {} bytes transferred",
                transfer.bytes_transferred()
            ));
        } else if let Some(channel) = &session.data_channel {
            lines.push(format!(" Data connection {:?}", channel.state()));
        }
    }
    lines.push(String::from("End of status"));
    ctx.reply_lines(211, &lines).await
}
