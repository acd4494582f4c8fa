use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_network::datachan::DataChannel;
use log::{debug, error, warn};
use std::net::{IpAddr, Ipv4Addr};

/// Formats the `h1,h2,h3,h4,p1,p2` address of a PASV reply.
pub fn format_pasv_address(ip: Ipv4Addr, port: u16) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{},{},{},{},{},{}", a, b, c, d, port >> 8, port & 0xFF)
}

/// IPv4 form of an address, IPv4-mapped IPv6 addresses included.
fn to_ipv4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped(),
    }
}

/// Sets up a passive mode (PASV) listener and sends the response to the client.
///
/// The listener binds on the address the client reached us on. The reply
/// advertises the configured PASV address, or that same address.
pub async fn handle_pasv_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    let mut session = ctx.session.lock().await;
    if session.active_transfer.is_some() {
        drop(session);
        return ctx.reply(425, "Transfer in progress").await;
    }
    if let Some(mut old) = session.data_channel.take() {
        old.close().await;
    }

    let local_ip = session.local_addr.ip();
    let advertised = match ctx.config().server.pasv_address.as_deref() {
        Some(address) => match address.parse::<IpAddr>() {
            Ok(ip) => to_ipv4(ip),
            Err(e) => {
                warn!("Ignoring invalid pasv_address {}: {}", address, e);
                to_ipv4(local_ip)
            }
        },
        None => to_ipv4(local_ip),
    };
    let Some(advertised) = advertised else {
        drop(session);
        error!("session={} PASV needs an IPv4 address", ctx.session_id);
        return ctx.reply(425, "Can't open data connection").await;
    };

    let channel = match DataChannel::bind_passive(
        local_ip,
        ctx.config().server.pasv_port_range,
        session.channel_token(),
    )
    .await
    {
        Ok(channel) => channel,
        Err(e) => {
            drop(session);
            error!("session={} {}", ctx.session_id, e);
            return ctx.reply(425, "Can't open data connection").await;
        }
    };
    let Some(port) = channel.passive_address().map(|addr| addr.port()) else {
        drop(session);
        return ctx.reply(425, "Can't open data connection").await;
    };
    session.data_channel = Some(channel);
    drop(session);

    let address = format_pasv_address(advertised, port);
    debug!("session={} Passive mode on {}", ctx.session_id, address);
    ctx.reply(227, &format!("Entering Passive Mode ({})", address))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_address_and_port() {
        assert_eq!(
            format_pasv_address(Ipv4Addr::new(192, 168, 1, 20), 50_001),
            "192,168,1,20,195,81"
        );
        assert_eq!(format_pasv_address(Ipv4Addr::LOCALHOST, 21), "127,0,0,1,0,21");
    }

    #[test]
    fn mapped_addresses_become_ipv4() {
        let mapped: IpAddr = "::ffff:10.0.0.1".parse().unwrap();
        assert_eq!(to_ipv4(mapped), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(to_ipv4("::1".parse().unwrap()), None);
    }
}
