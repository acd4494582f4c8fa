use crate::charset::encode_text;
use crate::constants::{CRLF, LIST_OPTION_HIDDEN, LIST_OPTION_PREFIX, MLSD_BUFFER_SIZE};
use crate::core_disk::{DiskContext, FileInfo};
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{
    check_access, generate_path_for_request, share_list, share_target, PathKind,
};
use crate::core_listing::{facts_line, name_only, unix_line, FactMask};
use crate::core_network::datachan::DataChannel;
use crate::core_path::FtpPath;
use crate::core_share::Share;
use crate::core_txn::TxnMode;
use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    /// LIST, `ls -l` style lines.
    Unix,
    /// NLST, names only.
    Names,
    /// MLSD, RFC 3659 facts.
    Facts,
}

/// Splits a leading `-` option token off a listing argument. Returns whether
/// hidden entries were asked for and what is left of the argument.
fn split_list_options(arg: Option<&str>) -> (bool, Option<String>) {
    let Some(arg) = arg.map(str::trim).filter(|arg| !arg.is_empty()) else {
        return (false, None);
    };
    if !arg.starts_with(LIST_OPTION_PREFIX) {
        return (false, Some(arg.to_string()));
    }
    let (options, rest) = arg.split_once(' ').unwrap_or((arg, ""));
    let rest = rest.trim();
    (
        options.contains(LIST_OPTION_HIDDEN),
        (!rest.is_empty()).then(|| rest.to_string()),
    )
}

fn has_wildcards(arg: &str) -> bool {
    arg.contains(['*', '?'])
}

/// Handles the LIST, NLST and MLSD FTP commands.
///
/// Entries are sent over the data channel in the session charset. The
/// pseudo-root lists the visible shares as directories.
pub async fn handle_list_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
    format: ListFormat,
) -> Result<(), std::io::Error> {
    if format == ListFormat::Facts && !ctx.config().features.mlst {
        return ctx.reply(502, "Command not implemented").await;
    }
    let (show_hidden, arg) = split_list_options(arg.as_deref());

    let mut session = ctx.session.lock().await;
    let path = match &arg {
        None => Some(session.cwd.clone()),
        Some(arg) if has_wildcards(arg) => {
            generate_path_for_request(&mut session, &ctx.server, arg, PathKind::File, false).await
        }
        Some(arg) => {
            generate_path_for_request(&mut session, &ctx.server, arg, PathKind::Any, true).await
        }
    };
    let Some(path) = path else {
        drop(session);
        return ctx.reply(550, "File not found").await;
    };
    if !check_access(&mut session, &ctx.server, &path, false) {
        drop(session);
        return ctx.reply(550, "Access denied").await;
    }
    let Some(mut channel) = session.data_channel.take() else {
        drop(session);
        return ctx.reply(425, "Can't open data connection").await;
    };
    let root_shares = path.is_root_path().then(|| share_list(&mut session, &ctx.server));
    let disk_ctx = session.disk_context();
    let mask = session.mlst_facts;
    let utf8 = session.utf8;
    drop(session);

    let result = send_listing(
        ctx,
        &mut channel,
        ListRequest {
            path: &path,
            wildcard: arg.as_deref().is_some_and(has_wildcards),
            root_shares,
            disk_ctx,
            show_hidden,
            format,
            mask,
            utf8,
        },
    )
    .await;
    channel.close().await;

    match result {
        Ok(count) => {
            debug!("session={} Listed {} entries of {}", ctx.session_id, count, path);
            ctx.reply(226, "Closing data connection").await
        }
        Err((code, text)) => ctx.reply(code, text).await,
    }
}

struct ListRequest<'a> {
    path: &'a FtpPath,
    wildcard: bool,
    root_shares: Option<Vec<Arc<Share>>>,
    disk_ctx: Option<DiskContext>,
    show_hidden: bool,
    format: ListFormat,
    mask: FactMask,
    utf8: bool,
}

/// Sends the 150 reply and the entries. The error is the reply to send
/// instead of the final 226.
async fn send_listing(
    ctx: &mut CommandContext,
    channel: &mut DataChannel,
    request: ListRequest<'_>,
) -> Result<usize, (u16, &'static str)> {
    ctx.reply(150, "File status okay, about to open data connection")
        .await
        .map_err(|_| (426, "Connection closed; transfer aborted"))?;
    channel.acquire_socket().await.map_err(|e| {
        warn!("session={} Listing data connection failed: {}", ctx.session_id, e);
        (426, "Connection closed; transfer aborted")
    })?;

    let entries: Vec<FileInfo> = match (request.root_shares, share_target(request.path)) {
        (Some(shares), _) => shares
            .iter()
            .map(|share| FileInfo::directory(share.name()))
            .collect(),
        (None, Some((share, share_path))) => {
            let Some(disk_ctx) = request.disk_ctx else {
                return Err((451, "Error reading file list"));
            };
            let pattern = if request.wildcard || !request.path.is_dir() {
                share_path
            } else {
                request.path.make_share_path_to_file("*")
            };
            ctx.uow.begin(TxnMode::ReadOnly);
            match share.disk().start_search(&disk_ctx, &pattern).await {
                Ok(search) => search.collect(),
                Err(e) => {
                    warn!("session={} Search of {} failed: {}", ctx.session_id, pattern, e);
                    return Err((451, "Error reading file list"));
                }
            }
        }
        (None, None) => return Err((451, "Error reading file list")),
    };

    let now = Utc::now();
    let charset = ctx.charset;
    let socket = channel
        .acquire_socket()
        .await
        .map_err(|_| (426, "Connection closed; transfer aborted"))?;
    let mut buffer = String::new();
    let mut count = 0;
    for info in entries
        .iter()
        .filter(|info| request.show_hidden || !info.hidden)
    {
        let line = match request.format {
            ListFormat::Unix => unix_line(info, now),
            ListFormat::Names => name_only(info),
            ListFormat::Facts => facts_line(info, request.mask, false),
        };
        buffer.push_str(&line);
        buffer.push_str(CRLF);
        count += 1;
        if buffer.len() >= MLSD_BUFFER_SIZE {
            socket
                .write_all(&encode_text(&buffer, request.utf8, charset))
                .await
                .map_err(|_| (426, "Connection closed; transfer aborted"))?;
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        socket
            .write_all(&encode_text(&buffer, request.utf8, charset))
            .await
            .map_err(|_| (426, "Connection closed; transfer aborted"))?;
    }
    socket
        .flush()
        .await
        .map_err(|_| (426, "Connection closed; transfer aborted"))?;
    Ok(count)
}
