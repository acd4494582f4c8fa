use crate::core_disk::FileInfo;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::utils::{check_access, generate_path_for_request, share_target, PathKind};
use crate::core_listing::facts_line;
use crate::core_txn::TxnMode;

/// Handles the MLST FTP command with the facts of a single object,
/// the current directory when no argument is given.
pub async fn handle_mlst_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    if !ctx.config().features.mlst {
        return ctx.reply(502, "Command not implemented").await;
    }

    let (path, allowed, disk_ctx, mask) = {
        let mut session = ctx.session.lock().await;
        let path = match &arg {
            Some(arg) => {
                generate_path_for_request(&mut session, &ctx.server, arg, PathKind::Any, true).await
            }
            None => Some(session.cwd.clone()),
        };
        let allowed = path
            .as_ref()
            .is_some_and(|p| check_access(&mut session, &ctx.server, p, false));
        (path, allowed, session.disk_context(), session.mlst_facts)
    };
    let Some(path) = path else {
        return ctx.reply(550, "File not found").await;
    };
    if !allowed {
        return ctx.reply(550, "Access denied").await;
    }

    let mut info = match (share_target(&path), disk_ctx) {
        (Some((share, share_path)), Some(disk_ctx)) => {
            ctx.uow.begin(TxnMode::ReadOnly);
            match share.disk().get_file_information(&disk_ctx, &share_path).await {
                Ok(info) => info,
                Err(e) => {
                    let (code, text) = e.reply();
                    return ctx.reply(code, text).await;
                }
            }
        }
        _ => FileInfo {
            read_only: true,
            ..FileInfo::directory("/")
        },
    };
    info.name = path.ftp_path().to_string();

    let listed = arg.unwrap_or_else(|| path.ftp_path().to_string());
    let lines = vec![
        format!("Listing {}", listed),
        facts_line(&info, mask, true),
        String::from("End"),
    ];
    ctx.reply_lines(250, &lines).await
}
