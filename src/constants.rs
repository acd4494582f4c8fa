// src/constants.rs

/// Size of the buffer used to move file data across a data connection.
pub const DEFAULT_BUFFER_SIZE: usize = 64000;

/// Control connections listen here unless configured otherwise.
pub const DEFAULT_FTP_PORT: u16 = 21;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/shareftpd.conf";

pub const ANONYMOUS_ACCOUNT: &str = "anonymous";
pub const GUEST_USER: &str = "guest";

pub const CRLF: &str = "\r\n";

/// Longest command line accepted on the control connection, CRLF included.
pub const MAX_COMMAND_LINE: usize = 4096;

/// Leading character of a LIST option token, `-a` asks for hidden entries.
pub const LIST_OPTION_PREFIX: char = '-';
pub const LIST_OPTION_HIDDEN: char = 'a';

/// MDTM set requests start with a YYYYMMDDHHMMSS timestamp.
pub const MDTM_DATETIME_MINLEN: usize = 14;

/// MLSD records are flushed to the data socket once this much text is buffered.
pub const MLSD_BUFFER_SIZE: usize = 4096;

/// Listing dates newer than this many days show the time instead of the year.
pub const UNIX_DATE_RECENT_DAYS: i64 = 183;
