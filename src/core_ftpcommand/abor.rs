use crate::core_ftpcommand::handlers::CommandContext;
use log::info;

/// Handles the ABOR FTP command.
///
/// Cancels the running transfer, whose worker then answers with
/// "226 Transfer aborted". Without a transfer the data channel is released.
pub async fn handle_abor_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    if !ctx.config().server.threaded_transfers {
        return ctx.reply(502, "Command not implemented").await;
    }

    let mut session = ctx.session.lock().await;
    if let Some(transfer) = &session.active_transfer {
        info!(
            "session={} Aborting transfer {} after {} bytes",
            ctx.session_id,
            transfer.id,
            transfer.bytes_transferred()
        );
        transfer.abort.cancel();
        return Ok(());
    }

    session.release_data().await;
    drop(session);
    ctx.reply(226, "Data connection not active").await
}
