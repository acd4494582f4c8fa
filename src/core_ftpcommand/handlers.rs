use crate::charset::{encode_text, Charset};
use crate::config::Config;
use crate::constants::CRLF;
use crate::core_ftpcommand::ftpcommand::{FtpCommand, FtpRequest};
use crate::core_ftpcommand::{
    abor, allo, cdup, cwd, dele, feat, help, list, mdtm, mkd, mlst, noop, opts, pass, pwd, quit,
    rest, retr, rmd, rnfr, rnto, site, size, stat, stor, syst, type_, user,
};
use crate::core_network::{pasv, port};
use crate::core_txn::UnitOfWork;
use crate::helpers::{format_multiline, send_response, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything a command handler works with. Built once per received command,
/// so the unit of work spans exactly one command.
pub struct CommandContext {
    pub writer: ControlWriter,
    pub server: Arc<ServerContext>,
    pub session: Arc<Mutex<Session>>,
    pub uow: UnitOfWork,
    pub session_id: u32,
    /// Whether replies are UTF-8 encoded, as negotiated when the command arrived.
    pub utf8: bool,
    pub charset: Charset,
}

impl CommandContext {
    pub fn new(
        writer: ControlWriter,
        server: Arc<ServerContext>,
        session: Arc<Mutex<Session>>,
        session_id: u32,
        utf8: bool,
    ) -> Self {
        let uow = UnitOfWork::new(Arc::clone(&server.transactions), session_id);
        let charset = server.config.server.charset;
        Self {
            writer,
            server,
            session,
            uow,
            session_id,
            utf8,
            charset,
        }
    }

    pub fn config(&self) -> &Config {
        &self.server.config
    }

    pub async fn reply(&self, code: u16, text: &str) -> Result<(), std::io::Error> {
        debug!("session={} > {} {}", self.session_id, code, text);
        let line = format!("{} {}{}", code, text, CRLF);
        send_response(&self.writer, &encode_text(&line, self.utf8, self.charset)).await
    }

    /// Multi-line reply, see [`format_multiline`].
    pub async fn reply_lines(&self, code: u16, lines: &[String]) -> Result<(), std::io::Error> {
        debug!("session={} > {} ({} lines)", self.session_id, code, lines.len());
        let reply = format_multiline(code, lines);
        send_response(&self.writer, &encode_text(&reply, self.utf8, self.charset)).await
    }
}

/// Commands accepted before the client has logged on.
fn allowed_before_logon(command: FtpCommand) -> bool {
    matches!(
        command,
        FtpCommand::USER
            | FtpCommand::PASS
            | FtpCommand::QUIT
            | FtpCommand::FEAT
            | FtpCommand::SYST
            | FtpCommand::NOOP
            | FtpCommand::HELP
            | FtpCommand::OPTS
    )
}

/// Routes one parsed command to its handler. An `Err` means the control
/// connection is unusable and the session ends.
pub async fn dispatch(ctx: &mut CommandContext, request: FtpRequest) -> Result<(), std::io::Error> {
    let FtpRequest {
        command,
        token,
        arg,
    } = request;

    if command == FtpCommand::Invalid {
        debug!("session={} Unknown command {}", ctx.session_id, token);
        return ctx.reply(502, "Command not implemented").await;
    }

    {
        let mut session = ctx.session.lock().await;
        // a pending rename only survives until the next command
        if !matches!(command, FtpCommand::RNFR | FtpCommand::RNTO) {
            session.rename_from = None;
        }
        if !session.is_logged_on() && !allowed_before_logon(command) {
            drop(session);
            return ctx.reply(500, "Not logged in").await;
        }
    }

    match command {
        FtpCommand::USER => user::handle_user_command(ctx, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(ctx, arg).await,
        FtpCommand::ACCT | FtpCommand::STOU => ctx.reply(502, "Command not implemented").await,
        FtpCommand::CWD => cwd::handle_cwd_command(ctx, arg).await,
        FtpCommand::CDUP => cdup::handle_cdup_command(ctx, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(ctx, arg).await,
        FtpCommand::PORT => port::handle_port_command(ctx, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(ctx, arg).await,
        FtpCommand::TYPE => type_::handle_type_command(ctx, arg).await,
        FtpCommand::STRU => type_::handle_stru_command(ctx, arg).await,
        FtpCommand::MODE => type_::handle_mode_command(ctx, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(ctx, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(ctx, arg).await,
        FtpCommand::APPE => stor::handle_appe_command(ctx, arg).await,
        FtpCommand::ALLO => allo::handle_allo_command(ctx, arg).await,
        FtpCommand::REST => rest::handle_rest_command(ctx, arg).await,
        FtpCommand::RNFR => rnfr::handle_rnfr_command(ctx, arg).await,
        FtpCommand::RNTO => rnto::handle_rnto_command(ctx, arg).await,
        FtpCommand::ABOR => abor::handle_abor_command(ctx, arg).await,
        FtpCommand::DELE => dele::handle_dele_command(ctx, arg).await,
        FtpCommand::RMD => rmd::handle_rmd_command(ctx, arg).await,
        FtpCommand::MKD => mkd::handle_mkd_command(ctx, arg).await,
        FtpCommand::PWD => pwd::handle_pwd_command(ctx, arg).await,
        FtpCommand::LIST => list::handle_list_command(ctx, arg, list::ListFormat::Unix).await,
        FtpCommand::NLST => list::handle_list_command(ctx, arg, list::ListFormat::Names).await,
        FtpCommand::MLSD => list::handle_list_command(ctx, arg, list::ListFormat::Facts).await,
        FtpCommand::SITE => site::handle_site_command(ctx, arg).await,
        FtpCommand::SYST => syst::handle_syst_command(ctx, arg).await,
        FtpCommand::STAT => stat::handle_stat_command(ctx, arg).await,
        FtpCommand::HELP => help::handle_help_command(ctx, arg).await,
        FtpCommand::NOOP => noop::handle_noop_command(ctx, arg).await,
        FtpCommand::MDTM => mdtm::handle_mdtm_command(ctx, arg).await,
        FtpCommand::SIZE => size::handle_size_command(ctx, arg).await,
        FtpCommand::OPTS => opts::handle_opts_command(ctx, arg).await,
        FtpCommand::FEAT => feat::handle_feat_command(ctx, arg).await,
        FtpCommand::MLST => mlst::handle_mlst_command(ctx, arg).await,
        FtpCommand::Invalid => ctx.reply(502, "Command not implemented").await,
    }
}
