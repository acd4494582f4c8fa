use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_network::datachan::DataChannel;
use log::info;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Parses the `h1,h2,h3,h4,p1,p2` argument of PORT.
pub fn parse_port_argument(arg: &str) -> Option<SocketAddrV4> {
    let parts: Vec<u8> = arg
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let [a, b, c, d, p1, p2] = parts[..] else {
        return None;
    };
    let port = (p1 as u16) << 8 | p2 as u16;
    Some(SocketAddrV4::new(Ipv4Addr::new(a, b, c, d), port))
}

/// Handles the PORT (Active Mode) FTP command.
///
/// Any previous data channel, a passive listener included, is closed. The
/// connection to the client is only made when a transfer needs it.
pub async fn handle_port_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let Some(target) = arg.as_deref().and_then(parse_port_argument) else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let mut session = ctx.session.lock().await;
    if session.active_transfer.is_some() {
        drop(session);
        return ctx.reply(425, "Transfer in progress").await;
    }
    if let Some(mut old) = session.data_channel.take() {
        old.close().await;
    }
    let token = session.channel_token();
    session.data_channel = Some(DataChannel::bind_active(
        SocketAddr::V4(target),
        ctx.config().server.active_local_port,
        token,
    ));
    drop(session);

    info!("session={} Active mode to {}", ctx.session_id, target);
    ctx.reply(200, "Port OK").await
}
