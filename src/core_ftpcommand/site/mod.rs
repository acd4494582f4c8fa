mod handler;

pub mod site_who;

pub use handler::{handle_site_command, BuiltinSiteCommands, SiteCommandHandler, SiteReply};
