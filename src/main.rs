use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use shareftpd::config::Config;
use shareftpd::constants::DEFAULT_CONFIG_PATH;
use shareftpd::core_auth::{hash_password, PasswdAuthenticator, DEFAULT_COST};
use shareftpd::core_cli::Cli;
use shareftpd::core_events::{ChangeNotifier, LogNotifier};
use shareftpd::core_share::LocalHomeShareFactory;
use shareftpd::helpers::log_config;
use shareftpd::server::{self, build_shares, ServerContext};
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    if let Some(password) = args.hash_password {
        let hashed = hash_password(&password, DEFAULT_COST)?;
        println!("{}", hashed);
        return Ok(());
    }

    let config_path = if args.config.is_empty() {
        DEFAULT_CONFIG_PATH
    } else {
        args.config.as_str()
    };
    let config = Config::load_from_file(config_path)?;
    info!("Configuration loaded from {}", config_path);
    log_config(&config);

    let authenticator = match &config.server.passwd_file {
        Some(path) => PasswdAuthenticator::from_file(path, config.anonymous.enabled)
            .with_context(|| format!("Failed to load passwd file: {:?}", path))?,
        None => PasswdAuthenticator::from_entries(Default::default(), config.anonymous.enabled),
    };

    let notifier: Arc<dyn ChangeNotifier> = Arc::new(LogNotifier);
    let shares = build_shares(&config, Some(Arc::clone(&notifier)));
    let home_factory =
        LocalHomeShareFactory::new(config.anonymous.home_dir.clone()).with_notifier(notifier);

    let ctx = ServerContext::new(config, shares, Arc::new(authenticator))
        .with_home_factory(Arc::new(home_factory));

    // Run the FTP server
    server::run(ctx).await
}
