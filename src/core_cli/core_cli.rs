use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "shareftpd", about = "An FTP server exposing named shares.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the bcrypt hash of a password for the passwd file and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["shareftpd", "-c", "/tmp/ftp.toml", "-v"]);
        assert_eq!(cli.config, "/tmp/ftp.toml");
        assert!(cli.verbose);
        assert!(cli.hash_password.is_none());

        let cli = Cli::parse_from(["shareftpd", "--hash-password", "secret"]);
        assert_eq!(cli.hash_password.as_deref(), Some("secret"));
        assert!(cli.config.is_empty());
    }
}
