use crate::config::Config;
use crate::core_auth::Authenticator;
use crate::core_disk::LocalDisk;
use crate::core_events::ChangeNotifier;
use crate::core_ftpcommand::site::{BuiltinSiteCommands, SiteCommandHandler};
use crate::core_network::network;
use crate::core_network::registry::SessionRegistry;
use crate::core_path::FtpPath;
use crate::core_share::{
    AccessControlManager, ConfigAccessControl, HomeShareFactory, LocalHomeShareFactory, Share,
};
use crate::core_txn::{NoTransactions, TransactionService};
use crate::helpers::load_banner;
use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;

/// Collaborators and settings shared by every session of a server.
pub struct ServerContext {
    pub config: Arc<Config>,
    pub shares: Vec<Arc<Share>>,
    pub authenticator: Arc<dyn Authenticator>,
    pub access_control: Arc<dyn AccessControlManager>,
    pub home_factory: Arc<dyn HomeShareFactory>,
    pub transactions: Arc<dyn TransactionService>,
    pub registry: Arc<SessionRegistry>,
    pub site_handler: Option<Arc<dyn SiteCommandHandler>>,
    pub banner: Option<String>,
}

impl ServerContext {
    pub fn new(
        config: Config,
        shares: Vec<Arc<Share>>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let access_control = Arc::new(ConfigAccessControl::from_config(&config.shares));
        let home_factory = Arc::new(LocalHomeShareFactory::new(config.anonymous.home_dir.clone()));
        let site_handler: Option<Arc<dyn SiteCommandHandler>> = if config.server.site_commands {
            Some(Arc::new(BuiltinSiteCommands))
        } else {
            None
        };
        let banner = config
            .server
            .banner_path
            .as_deref()
            .and_then(|path| match load_banner(path) {
                Ok(banner) => Some(banner),
                Err(e) => {
                    warn!("Using the default banner: {:#}", e);
                    None
                }
            });

        Self {
            config: Arc::new(config),
            shares,
            authenticator,
            access_control,
            home_factory,
            transactions: Arc::new(NoTransactions),
            registry: Arc::new(SessionRegistry::new()),
            site_handler,
            banner,
        }
    }

    pub fn with_access_control(mut self, access_control: Arc<dyn AccessControlManager>) -> Self {
        self.access_control = access_control;
        self
    }

    pub fn with_home_factory(mut self, home_factory: Arc<dyn HomeShareFactory>) -> Self {
        self.home_factory = home_factory;
        self
    }

    pub fn with_transactions(mut self, transactions: Arc<dyn TransactionService>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn with_site_handler(mut self, site_handler: Arc<dyn SiteCommandHandler>) -> Self {
        self.site_handler = Some(site_handler);
        self
    }

    /// Initial directory and target of `/` for non-guest sessions.
    pub fn root_path(&self) -> FtpPath {
        let Some(root) = self.config.server.root_path.as_deref() else {
            return FtpPath::root();
        };
        match FtpPath::from_ftp_path(root) {
            Ok(mut path) => {
                if !path.is_root_path() && !path.set_shared_device(&self.shares) {
                    warn!("Root path {} names an unknown share", root);
                }
                path
            }
            Err(e) => {
                warn!("Ignoring root path: {}", e);
                FtpPath::root()
            }
        }
    }
}

/// Builds the configured shares on top of local disks.
pub fn build_shares(config: &Config, notifier: Option<Arc<dyn ChangeNotifier>>) -> Vec<Arc<Share>> {
    config
        .shares
        .iter()
        .map(|share_config| {
            if !share_config.path.is_dir() {
                warn!(
                    "Share {} points at a missing directory: {:?}",
                    share_config.name, share_config.path
                );
            }
            let mut share = Share::new(
                &share_config.name,
                Arc::new(LocalDisk::new(&share_config.path)),
            )
            .with_read_only(share_config.read_only);
            if let Some(notifier) = &notifier {
                share = share.with_notifier(Arc::clone(notifier));
            }
            Arc::new(share)
        })
        .collect()
}

/// Runs the FTP server until interrupted.
pub async fn run(ctx: ServerContext) -> Result<()> {
    let handle = match network::start_server(Arc::new(ctx)).await {
        Ok(handle) => {
            info!("Server started successfully on {}", handle.local_addr());
            handle
        }
        Err(e) => {
            error!("Failed to start server: {:#}", e);
            return Err(e);
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, stopping server");
    handle.stop();
    handle.wait().await;
    Ok(())
}
