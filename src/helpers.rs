use crate::config::Config;
use crate::constants::CRLF;
use anyhow::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of a control connection, shared with transfer workers.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Sends a response to the client.
pub async fn send_response(writer: &ControlWriter, message: &[u8]) -> Result<(), std::io::Error> {
    let mut writer = writer.lock().await;
    writer.write_all(message).await?;
    writer.flush().await?;
    Ok(())
}

/// Sends a single `<code> <text>` reply line.
pub async fn send_reply(writer: &ControlWriter, code: u16, text: &str) -> Result<(), std::io::Error> {
    send_response(writer, format!("{} {}{}", code, text, CRLF).as_bytes()).await
}

/// Formats a multi-line reply, every line but the last as `<code>-<text>`.
/// Lines starting with a space are sent unprefixed.
pub fn format_multiline(code: u16, lines: &[String]) -> String {
    let mut reply = String::new();
    let last = lines.len().saturating_sub(1);
    for (idx, line) in lines.iter().enumerate() {
        if idx == last {
            reply.push_str(&format!("{} {}{}", code, line, CRLF));
        } else if line.starts_with(' ') {
            reply.push_str(&format!("{}{}", line, CRLF));
        } else {
            reply.push_str(&format!("{}-{}{}", code, line, CRLF));
        }
    }
    reply
}

pub fn load_banner(path: &Path) -> Result<String> {
    let banner = fs::read_to_string(path)
        .map_err(|e| {
            error!("Failed to read banner file: {:?}: {}", path, e);
            anyhow::Error::new(e)
        })
        .with_context(|| format!("Failed to read banner file: {:?}", path))?;

    if banner.trim().is_empty() {
        error!("Banner file is empty: {:?}", path);
        return Err(anyhow::Error::msg("Banner file is empty."));
    }

    info!("Banner file loaded successfully: {:?}", path);
    Ok(banner)
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!(
        "  Listen Address: {}:{}",
        config.server.listen_address, config.server.listen_port
    );
    info!(
        "  PASV Address: {}",
        config.server.pasv_address.as_deref().unwrap_or("<control address>")
    );
    if let Some((low, high)) = config.server.pasv_port_range {
        info!("  PASV Ports: {}-{}", low, high);
    }
    info!("  Charset: {:?}", config.server.charset);
    info!("  Threaded Transfers: {}", config.server.threaded_transfers);
    info!("  Buffer Size: {} bytes", config.server.buffer_size);
    info!(
        "  Features: utf8={} mdtm={} size={} mlst={}",
        config.features.utf8, config.features.mdtm, config.features.size, config.features.mlst
    );
    info!("  Anonymous: {}", config.anonymous.enabled);
    for share in &config.shares {
        info!(
            "  Share: {} -> {:?}{}",
            share.name,
            share.path,
            if share.read_only { " (read-only)" } else { "" }
        );
    }
}
