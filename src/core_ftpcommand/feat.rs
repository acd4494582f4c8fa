use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_listing::FactMask;

/// Handles the FEAT FTP command. Only enabled features are announced, the
/// MLST line marks the facts the session currently returns with `*`.
pub async fn handle_feat_command(
    ctx: &mut CommandContext,
    _arg: Option<String>,
) -> Result<(), std::io::Error> {
    let features = &ctx.config().features;
    let mut lines = vec![String::from("Features supported")];
    if features.mdtm {
        lines.push(String::from(" MDTM"));
    }
    if features.size {
        lines.push(String::from(" SIZE"));
    }
    if features.utf8 {
        lines.push(String::from(" UTF8"));
    }
    if features.mlst {
        let mask = ctx.session.lock().await.mlst_facts;
        let facts: String = FactMask::NAMES
            .iter()
            .map(|(name, bit)| {
                format!("{}{};", name, if mask.contains(*bit) { "*" } else { "" })
            })
            .collect();
        lines.push(format!(" MLST {}", facts));
        lines.push(String::from(" MLSD"));
    }
    lines.push(String::from("END"));
    ctx.reply_lines(211, &lines).await
}
