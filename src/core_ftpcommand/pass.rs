use crate::core_auth::Principal;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_path::{FtpPath, DIR_SEPARATOR_STR};
use crate::session::SessionState;
use log::{info, warn};

/// Handles the PASS FTP command.
///
/// Authenticates the user named by USER. Guests get their home directory
/// as a session share that also becomes their root. A failed logon closes
/// the connection.
pub async fn handle_pass_command(
    ctx: &mut CommandContext,
    arg: Option<String>,
) -> Result<(), std::io::Error> {
    let client = ctx.session.lock().await.client.clone();
    let Some(client) = client else {
        return ctx.reply(500, "Login with USER first").await;
    };
    let password = arg.unwrap_or_default();

    let authenticated = if client.guest {
        let anonymous = &ctx.config().anonymous;
        ctx.server
            .authenticator
            .authenticate_as_guest(&anonymous.guest_user, anonymous.home_dir.clone())
            .await
    } else {
        ctx.server
            .authenticator
            .authenticate(&client.user, &password)
            .await
    };

    let principal = match authenticated {
        Ok(principal) => principal,
        Err(e) => {
            warn!("session={} Login failed for {}: {}", ctx.session_id, client.user, e);
            return deny(ctx).await;
        }
    };

    if principal.guest {
        if let Err(e) = logon_guest(ctx, principal).await {
            warn!("session={} Guest login failed: {}", ctx.session_id, e);
            return deny(ctx).await;
        }
    } else {
        let root = ctx.server.root_path();
        let mut session = ctx.session.lock().await;
        session.principal = Some(principal);
        session.cwd = root.clone();
        session.root_path = root;
        session.state = SessionState::LoggedOn;
    }

    ctx.server.registry.set_user(ctx.session_id, &client.user);
    info!("session={} User {} logged in", ctx.session_id, client.user);
    ctx.reply(230, "User logged in, proceed").await
}

async fn logon_guest(ctx: &mut CommandContext, principal: Principal) -> anyhow::Result<()> {
    let share = ctx.server.home_factory.create_home_share(&principal).await?;
    let mut root = FtpPath::from_share_path(share.name(), DIR_SEPARATOR_STR)?;
    root.set_share(share.clone());

    let mut session = ctx.session.lock().await;
    session.principal = Some(principal);
    session.dynamic_shares = vec![share];
    session.cwd = root.clone();
    session.root_path = root;
    session.state = SessionState::LoggedOn;
    Ok(())
}

async fn deny(ctx: &mut CommandContext) -> Result<(), std::io::Error> {
    {
        let mut session = ctx.session.lock().await;
        session.reset_logon();
        session.state = SessionState::Closed;
    }
    ctx.reply(530, "Access denied").await
}
