use crate::charset::Charset;
use crate::constants::{ANONYMOUS_ACCOUNT, DEFAULT_BUFFER_SIZE, DEFAULT_FTP_PORT, GUEST_USER};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    /// Address advertised in the PASV reply, the control socket's local
    /// address is used when unset.
    pub pasv_address: Option<String>,
    pub pasv_port_range: Option<(u16, u16)>,
    pub active_local_port: Option<u16>,
    pub charset: Charset,
    /// Run RETR/STOR on a worker task so ABOR can interrupt them.
    pub threaded_transfers: bool,
    pub buffer_size: usize,
    pub banner_path: Option<PathBuf>,
    pub root_path: Option<String>,
    pub passwd_file: Option<PathBuf>,
    pub site_commands: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub utf8: bool,
    pub mdtm: bool,
    pub size: bool,
    pub mlst: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnonymousConfig {
    pub enabled: bool,
    pub account: String,
    pub guest_user: String,
    pub home_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShareConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub allowed_users: Option<Vec<String>>,
    #[serde(default)]
    pub writers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub features: FeatureConfig,
    pub anonymous: AnonymousConfig,
    pub shares: Vec<ShareConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: DEFAULT_FTP_PORT,
            pasv_address: None,
            pasv_port_range: None,
            active_local_port: None,
            charset: Charset::Utf8,
            threaded_transfers: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            banner_path: None,
            root_path: None,
            passwd_file: None,
            site_commands: false,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            utf8: true,
            mdtm: true,
            size: true,
            mlst: true,
        }
    }
}

impl Default for AnonymousConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account: String::from(ANONYMOUS_ACCOUNT),
            guest_user: String::from(GUEST_USER),
            home_dir: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.buffer_size == 0 {
            bail!("buffer_size must be greater than zero");
        }
        if let Some((low, high)) = self.server.pasv_port_range {
            if low == 0 || low > high {
                bail!("invalid pasv_port_range [{}, {}]", low, high);
            }
        }
        for (idx, share) in self.shares.iter().enumerate() {
            if share.name.is_empty() || share.name.contains(['/', '\\']) {
                bail!("invalid share name {:?}", share.name);
            }
            if self.shares[..idx]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&share.name))
            {
                bail!("duplicate share name {:?}", share.name);
            }
        }
        if self.anonymous.enabled && self.anonymous.home_dir.is_none() {
            bail!("anonymous access needs anonymous.home_dir");
        }
        Ok(())
    }
}
