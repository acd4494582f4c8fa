#[allow(clippy::upper_case_acronyms)]
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    ACCT,
    CWD,
    CDUP,
    QUIT,
    PORT,
    PASV,
    TYPE,
    STRU,
    MODE,
    RETR,
    STOR,
    STOU,
    APPE,
    ALLO,
    REST,
    RNFR,
    RNTO,
    ABOR,
    DELE,
    RMD,
    MKD,
    PWD,
    LIST,
    NLST,
    SITE,
    SYST,
    STAT,
    HELP,
    NOOP,
    MDTM,
    SIZE,
    OPTS,
    FEAT,
    MLST,
    MLSD,
    Invalid,
}

impl FtpCommand {
    /// Every valid command, in the order HELP lists them.
    pub const ALL: [FtpCommand; 37] = [
        FtpCommand::USER,
        FtpCommand::PASS,
        FtpCommand::ACCT,
        FtpCommand::CWD,
        FtpCommand::CDUP,
        FtpCommand::QUIT,
        FtpCommand::PORT,
        FtpCommand::PASV,
        FtpCommand::TYPE,
        FtpCommand::STRU,
        FtpCommand::MODE,
        FtpCommand::RETR,
        FtpCommand::STOR,
        FtpCommand::STOU,
        FtpCommand::APPE,
        FtpCommand::ALLO,
        FtpCommand::REST,
        FtpCommand::RNFR,
        FtpCommand::RNTO,
        FtpCommand::ABOR,
        FtpCommand::DELE,
        FtpCommand::RMD,
        FtpCommand::MKD,
        FtpCommand::PWD,
        FtpCommand::LIST,
        FtpCommand::NLST,
        FtpCommand::SITE,
        FtpCommand::SYST,
        FtpCommand::STAT,
        FtpCommand::HELP,
        FtpCommand::NOOP,
        FtpCommand::MDTM,
        FtpCommand::SIZE,
        FtpCommand::OPTS,
        FtpCommand::FEAT,
        FtpCommand::MLST,
        FtpCommand::MLSD,
    ];

    pub fn from_str(cmd: &str) -> FtpCommand {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => FtpCommand::USER,
            "PASS" => FtpCommand::PASS,
            "ACCT" => FtpCommand::ACCT,
            "CWD" | "XCWD" => FtpCommand::CWD,
            "CDUP" | "XCUP" => FtpCommand::CDUP,
            "QUIT" => FtpCommand::QUIT,
            "PORT" => FtpCommand::PORT,
            "PASV" => FtpCommand::PASV,
            "TYPE" => FtpCommand::TYPE,
            "STRU" => FtpCommand::STRU,
            "MODE" => FtpCommand::MODE,
            "RETR" => FtpCommand::RETR,
            "STOR" => FtpCommand::STOR,
            "STOU" => FtpCommand::STOU,
            "APPE" => FtpCommand::APPE,
            "ALLO" => FtpCommand::ALLO,
            "REST" => FtpCommand::REST,
            "RNFR" => FtpCommand::RNFR,
            "RNTO" => FtpCommand::RNTO,
            "ABOR" => FtpCommand::ABOR,
            "DELE" => FtpCommand::DELE,
            "RMD" | "XRMD" => FtpCommand::RMD,
            "MKD" | "XMKD" => FtpCommand::MKD,
            "PWD" | "XPWD" => FtpCommand::PWD,
            "LIST" => FtpCommand::LIST,
            "NLST" => FtpCommand::NLST,
            "SITE" => FtpCommand::SITE,
            "SYST" => FtpCommand::SYST,
            "STAT" => FtpCommand::STAT,
            "HELP" => FtpCommand::HELP,
            "NOOP" => FtpCommand::NOOP,
            "MDTM" => FtpCommand::MDTM,
            "SIZE" => FtpCommand::SIZE,
            "OPTS" => FtpCommand::OPTS,
            "FEAT" => FtpCommand::FEAT,
            "MLST" => FtpCommand::MLST,
            "MLSD" => FtpCommand::MLSD,
            _ => FtpCommand::Invalid,
        }
    }

    /// Canonical token, used in replies and logs.
    pub fn name(&self) -> &'static str {
        match self {
            FtpCommand::USER => "USER",
            FtpCommand::PASS => "PASS",
            FtpCommand::ACCT => "ACCT",
            FtpCommand::CWD => "CWD",
            FtpCommand::CDUP => "CDUP",
            FtpCommand::QUIT => "QUIT",
            FtpCommand::PORT => "PORT",
            FtpCommand::PASV => "PASV",
            FtpCommand::TYPE => "TYPE",
            FtpCommand::STRU => "STRU",
            FtpCommand::MODE => "MODE",
            FtpCommand::RETR => "RETR",
            FtpCommand::STOR => "STOR",
            FtpCommand::STOU => "STOU",
            FtpCommand::APPE => "APPE",
            FtpCommand::ALLO => "ALLO",
            FtpCommand::REST => "REST",
            FtpCommand::RNFR => "RNFR",
            FtpCommand::RNTO => "RNTO",
            FtpCommand::ABOR => "ABOR",
            FtpCommand::DELE => "DELE",
            FtpCommand::RMD => "RMD",
            FtpCommand::MKD => "MKD",
            FtpCommand::PWD => "PWD",
            FtpCommand::LIST => "LIST",
            FtpCommand::NLST => "NLST",
            FtpCommand::SITE => "SITE",
            FtpCommand::SYST => "SYST",
            FtpCommand::STAT => "STAT",
            FtpCommand::HELP => "HELP",
            FtpCommand::NOOP => "NOOP",
            FtpCommand::MDTM => "MDTM",
            FtpCommand::SIZE => "SIZE",
            FtpCommand::OPTS => "OPTS",
            FtpCommand::FEAT => "FEAT",
            FtpCommand::MLST => "MLST",
            FtpCommand::MLSD => "MLSD",
            FtpCommand::Invalid => "<invalid>",
        }
    }
}

/// A received command line split into its command and argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpRequest {
    pub command: FtpCommand,
    /// The command token as the client sent it.
    pub token: String,
    pub arg: Option<String>,
}

impl FtpRequest {
    /// Splits on the first space. Arguments keep inner and trailing spaces,
    /// only the line terminator is removed.
    pub fn parse(line: &str) -> FtpRequest {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = line.trim_start();
        let (token, arg) = match line.split_once(' ') {
            Some((token, arg)) => (token, Some(arg.to_string()).filter(|a| !a.is_empty())),
            None => (line, None),
        };
        FtpRequest {
            command: FtpCommand::from_str(token),
            token: token.to_string(),
            arg,
        }
    }

    /// Line safe to log, PASS arguments are masked.
    pub fn log_line(&self) -> String {
        match (&self.command, &self.arg) {
            (FtpCommand::PASS, Some(_)) => format!("{} ****", self.token),
            (_, Some(arg)) => format!("{} {}", self.token, arg),
            (_, None) => self.token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_argument() {
        let req = FtpRequest::parse("retr my file.txt\r\n");
        assert_eq!(req.command, FtpCommand::RETR);
        assert_eq!(req.arg.as_deref(), Some("my file.txt"));

        let req = FtpRequest::parse("PWD");
        assert_eq!(req.command, FtpCommand::PWD);
        assert!(req.arg.is_none());

        let req = FtpRequest::parse("CWD \r\n");
        assert!(req.arg.is_none());
    }

    #[test]
    fn x_variants_share_handlers() {
        assert_eq!(FtpCommand::from_str("XMKD"), FtpCommand::MKD);
        assert_eq!(FtpCommand::from_str("xpwd"), FtpCommand::PWD);
        assert_eq!(FtpCommand::from_str("XCUP"), FtpCommand::CDUP);
    }

    #[test]
    fn unknown_tokens_are_invalid() {
        let req = FtpRequest::parse("BOGUS arg");
        assert_eq!(req.command, FtpCommand::Invalid);
        assert_eq!(req.token, "BOGUS");
        assert_eq!(FtpRequest::parse("").command, FtpCommand::Invalid);
    }

    #[test]
    fn names_round_trip() {
        for command in FtpCommand::ALL {
            assert_eq!(FtpCommand::from_str(command.name()), command);
        }
    }

    #[test]
    fn masks_password() {
        assert_eq!(FtpRequest::parse("PASS hunter2").log_line(), "PASS ****");
        assert_eq!(FtpRequest::parse("USER bob").log_line(), "USER bob");
    }
}
