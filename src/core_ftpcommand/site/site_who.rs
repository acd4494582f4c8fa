// SITE WHO - sessions currently connected

use crate::core_network::registry::SessionRegistry;
use log::info;

/// One line per registered session, in id order.
pub fn who_lines(registry: &SessionRegistry) -> Vec<String> {
    let sessions = registry.snapshot();
    info!("Handling SITE WHO command, {} sessions", sessions.len());

    let mut lines = vec![format!("{} users online:", sessions.len())];
    for info in sessions {
        lines.push(format!(
            " {:>4} {:<16} {:<22} since {}",
            info.id,
            info.user.as_deref().unwrap_or("-"),
            info.remote_addr,
            info.opened.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    lines.push(String::from("End of WHO"));
    lines
}
