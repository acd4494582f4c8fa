use crate::constants::MDTM_DATETIME_MINLEN;
use crate::core_disk::SetFileInfo;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, share_target, PathKind};
use crate::core_listing::mlst_date;
use crate::core_txn::TxnMode;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use log::{info, warn};
use regex::Regex;
use std::sync::LazyLock;

const MDTM_SET_PATTERN: &str = r"^(\d{14})(?:\.(\d{1,3}))? (.+)$";

static MDTM_SET_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(MDTM_SET_PATTERN).ok());

/// Splits `YYYYMMDDHHMMSS[.sss] <path>` into the time to set and the path.
/// `None` when the argument is a plain path.
fn parse_set_request(arg: &str) -> Option<(DateTime<Utc>, String)> {
    if arg.len() <= MDTM_DATETIME_MINLEN {
        return None;
    }
    let caps = MDTM_SET_RE.as_ref()?.captures(arg)?;
    let datetime = NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), "%Y%m%d%H%M%S").ok()?;
    let mut datetime = datetime.and_utc();
    if let Some(fraction) = caps.get(2) {
        let digits = fraction.as_str();
        let millis: i64 = format!("{:0<3}", digits).parse().ok()?;
        datetime += Duration::milliseconds(millis);
    }
    Some((datetime, caps.get(3)?.as_str().to_string()))
}

/// Handles the MDTM FTP command.
///
/// `MDTM <path>` replies with the modification time of a file in UTC.
/// `MDTM YYYYMMDDHHMMSS[.sss] <path>` sets it. An argument that does not
/// parse as a time is treated as a path.
pub async fn handle_mdtm_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    if !ctx.config().features.mdtm {
        return ctx.reply(502, "Command not implemented").await;
    }
    let Some(arg) = arg else {
        return ctx.reply(501, "Syntax error in parameters or arguments").await;
    };

    let (modify, name) = match parse_set_request(&arg) {
        Some((modify, name)) => (Some(modify), name),
        None => (None, arg),
    };

    let (target, allowed, disk_ctx) = {
        let mut session = ctx.session.lock().await;
        let path =
            generate_path_for_request(&mut session, &ctx.server, &name, PathKind::Any, true).await;
        let allowed = path
            .as_ref()
            .is_some_and(|p| check_access(&mut session, &ctx.server, p, modify.is_some()));
        (path.as_ref().and_then(share_target), allowed, session.disk_context())
    };
    let (Some((share, share_path)), Some(disk_ctx)) = (target, disk_ctx) else {
        return ctx.reply(550, "File not found").await;
    };
    if !allowed {
        return ctx.reply(550, "Access denied").await;
    }

    if let Some(modify) = modify {
        ctx.uow.begin(TxnMode::ReadWrite);
        let update = SetFileInfo {
            modify: Some(modify),
        };
        if let Err(e) = share
            .disk()
            .set_file_information(&disk_ctx, &share_path, &update)
            .await
        {
            warn!("session={} MDTM {} failed: {}", ctx.session_id, name, e);
            let (code, text) = e.reply();
            return ctx.reply(code, text).await;
        }
        info!(
            "session={} Set modification time of {} to {}",
            ctx.session_id,
            name,
            mlst_date(modify)
        );
    } else {
        ctx.uow.begin(TxnMode::ReadOnly);
    }

    let date = share
        .disk()
        .get_file_information(&disk_ctx, &share_path)
        .await
        .ok()
        .and_then(|info| info.modify.or(info.create));
    match date {
        Some(date) => ctx.reply(213, &mlst_date(date)).await,
        None => ctx.reply(550, "File not found").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_set_requests() {
        let (date, path) = parse_set_request("20240305140709 report.txt").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap());
        assert_eq!(path, "report.txt");

        let (date, path) = parse_set_request("20240305140709.5 my file.txt").unwrap();
        assert_eq!(date.timestamp_subsec_millis(), 500);
        assert_eq!(path, "my file.txt");
    }

    #[test]
    fn plain_paths_are_not_set_requests() {
        assert!(parse_set_request("report.txt").is_none());
        assert!(parse_set_request("20240305140709").is_none());
        assert!(parse_set_request("20241305140709 bad-month.txt").is_none());
        assert!(parse_set_request("2024030514070 short.txt").is_none());
    }
}
