use crate::config::{Config, ShareConfig};
use crate::core_auth::{hash_password, PasswdAuthenticator, PasswdEntry};
use crate::core_events::testing::RecordingNotifier;
use crate::core_events::ChangeNotifier;
use crate::core_network::network::{start_server, ServerHandle};
use crate::core_txn::testing::RecordingTransactions;
use crate::server::{build_shares, ServerContext};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

async fn timed<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future)
        .await
        .expect("timed out")
}

struct TestServer {
    handle: ServerHandle,
    events: Arc<RecordingNotifier>,
    public: TempDir,
    _other: TempDir,
    _home: TempDir,
}

impl TestServer {
    async fn start(configure: impl FnOnce(&mut Config, &Path)) -> TestServer {
        Self::start_with(configure, |ctx| ctx).await
    }

    async fn start_with(
        configure: impl FnOnce(&mut Config, &Path),
        customize: impl FnOnce(ServerContext) -> ServerContext,
    ) -> TestServer {
        let public = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join("guest")).unwrap();

        let mut config = Config::default();
        config.server.listen_address = "127.0.0.1".to_string();
        config.server.listen_port = 0;
        config.shares = vec![
            ShareConfig {
                name: "Public".to_string(),
                path: public.path().to_path_buf(),
                read_only: false,
                allowed_users: None,
                writers: None,
            },
            ShareConfig {
                name: "Other".to_string(),
                path: other.path().to_path_buf(),
                read_only: false,
                allowed_users: None,
                writers: None,
            },
        ];
        configure(&mut config, home.path());

        let hashed = hash_password("secret", 4).unwrap();
        let mut entries = HashMap::new();
        entries.insert("alice".to_string(), PasswdEntry::new("alice", &hashed, None));
        let authenticator = PasswdAuthenticator::from_entries(entries, config.anonymous.enabled);

        let events = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn ChangeNotifier> = events.clone();
        let shares = build_shares(&config, Some(notifier));
        let ctx = customize(ServerContext::new(config, shares, Arc::new(authenticator)));
        let handle = start_server(Arc::new(ctx)).await.unwrap();
        TestServer {
            handle,
            events,
            public,
            _other: other,
            _home: home,
        }
    }

    async fn client(&self) -> Client {
        Client::connect(self.handle.local_addr()).await
    }

    async fn login(&self) -> Client {
        let mut client = self.client().await;
        assert_eq!(client.cmd("USER alice").await.0, 331);
        assert_eq!(client.cmd("PASS secret").await.0, 230);
        client
    }

    async fn stop(self) {
        self.handle.stop();
        timed(self.handle.wait()).await;
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Client {
        let stream = timed(TcpStream::connect(addr)).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Client {
            reader: BufReader::new(reader),
            writer,
        };
        let (code, _) = client.reply().await;
        assert_eq!(code, 220);
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        timed(self.reader.read_line(&mut line)).await.unwrap();
        line
    }

    /// Reads one complete reply, multi-line replies included.
    async fn reply(&mut self) -> (u16, String) {
        let first = self.read_line().await;
        assert!(first.len() >= 4, "short reply: {:?}", first);
        let code: u16 = first[..3].parse().unwrap();
        let mut text = first.clone();
        if first.as_bytes()[3] == b'-' {
            let end = format!("{} ", code);
            loop {
                let line = self.read_line().await;
                assert!(!line.is_empty(), "connection closed inside a reply");
                text.push_str(&line);
                if line.starts_with(&end) {
                    break;
                }
            }
        }
        (code, text)
    }

    async fn cmd(&mut self, line: &str) -> (u16, String) {
        self.send(line).await;
        self.reply().await
    }

    async fn pasv(&mut self) -> SocketAddr {
        let (code, text) = self.cmd("PASV").await;
        assert_eq!(code, 227, "{}", text);
        let start = text.find('(').unwrap() + 1;
        let end = text.find(')').unwrap();
        let parts: Vec<u16> = text[start..end]
            .split(',')
            .map(|p| p.parse().unwrap())
            .collect();
        let ip = format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3]);
        SocketAddr::new(ip.parse().unwrap(), parts[4] << 8 | parts[5])
    }

    async fn is_closed(&mut self) -> bool {
        self.read_line().await.is_empty()
    }
}

/// Waits until the file on disk has grown to `len` bytes.
async fn wait_for_len(path: &Path, len: u64) {
    timed(async {
        while std::fs::metadata(path).map(|m| m.len()).unwrap_or(0) < len {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

async fn fetch(client: &mut Client, path: &str) -> Vec<u8> {
    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd(&format!("RETR {}", path)).await.0, 150);
    let mut received = Vec::new();
    timed(data.read_to_end(&mut received)).await.unwrap();
    assert_eq!(client.reply().await.0, 226);
    received
}

async fn put(client: &mut Client, verb: &str, path: &str, content: &[u8]) {
    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd(&format!("{} {}", verb, path)).await.0, 150);
    data.write_all(content).await.unwrap();
    drop(data);
    assert_eq!(client.reply().await.0, 226);
}

#[tokio::test]
async fn failed_login_closes_connection() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.client().await;

    let (code, text) = client.cmd("USER alice").await;
    assert_eq!(code, 331);
    assert!(text.contains("need password for alice"));
    assert_eq!(client.cmd("PASS wrong").await, (530, "530 Access denied\r\n".to_string()));
    assert!(client.is_closed().await);

    server.stop().await;
}

#[tokio::test]
async fn commands_before_logon() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.client().await;

    assert_eq!(client.cmd("PWD").await.0, 500);
    assert_eq!(client.cmd("XYZZY").await.0, 502);
    assert_eq!(client.cmd("SYST").await.1, "215 UNIX Type: L8\r\n");
    assert_eq!(client.cmd("PASS secret").await.0, 500);

    let (code, feat) = client.cmd("FEAT").await;
    assert_eq!(code, 211);
    assert!(feat.starts_with("211-Features supported\r\n"));
    assert!(feat.contains("\r\n MDTM\r\n"));
    assert!(feat.contains(" MLST size*;modify*;create*;type*;unique*;perm*;media-type*;\r\n"));
    assert!(feat.ends_with("211 END\r\n"));

    assert_eq!(client.cmd("QUIT").await.0, 221);
    assert!(client.is_closed().await);
    server.stop().await;
}

#[tokio::test]
async fn unsupported_commands() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;

    assert_eq!(client.cmd("STOU").await.0, 502);
    assert_eq!(client.cmd("ACCT x").await.0, 502);
    // transfers run inline, so there is nothing ABOR could interrupt
    assert_eq!(client.cmd("ABOR").await.0, 502);
    assert_eq!(client.cmd("TYPE E").await.0, 501);
    assert_eq!(client.cmd("TYPE I").await.0, 200);
    assert_eq!(client.cmd("TYPE L").await.0, 200);
    assert_eq!(client.cmd("TYPE L 7").await.0, 200);
    assert_eq!(client.cmd("TYPE A T").await.0, 200);
    assert_eq!(client.cmd("TYPE i n").await.0, 200);
    assert_eq!(client.cmd("OPTS UTF8 MAYBE").await.1, "501 OPTS UTF8 Invalid argument\r\n");
    assert_eq!(client.cmd("OPTS UTF8 OFF").await.1, "200 OPTS UTF8 OFF\r\n");
    assert_eq!(client.cmd("STRU F").await.0, 200);
    assert_eq!(client.cmd("STRU R").await.0, 504);
    assert_eq!(client.cmd("MODE S").await.0, 200);
    assert_eq!(client.cmd("ALLO 100").await.0, 202);
    assert_eq!(client.cmd("SITE WHO").await.0, 501);
    assert_eq!(client.cmd("RETR nothing.txt").await.0, 425);

    server.stop().await;
}

#[tokio::test]
async fn store_size_and_restarted_retrieve() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;
    assert_eq!(client.cmd("CWD Public").await.0, 250);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/Public\"\r\n");

    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("STOR hello.txt").await.0, 150);
    data.write_all(b"hello world").await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, (226, "226 Closing data connection\r\n".to_string()));

    assert_eq!(
        std::fs::read(server.public.path().join("hello.txt")).unwrap(),
        b"hello world"
    );
    assert_eq!(client.cmd("SIZE hello.txt").await.1, "213 11\r\n");
    assert_eq!(client.cmd("SIZE /Public/hello.txt").await.1, "213 11\r\n");

    assert_eq!(client.cmd("REST 6").await.0, 350);
    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("RETR hello.txt").await.0, 150);
    let mut received = Vec::new();
    timed(data.read_to_end(&mut received)).await.unwrap();
    assert_eq!(received, b"world");
    assert_eq!(client.reply().await.0, 226);

    // the restart offset was used up
    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("RETR hello.txt").await.0, 150);
    let mut received = Vec::new();
    timed(data.read_to_end(&mut received)).await.unwrap();
    assert_eq!(received, b"hello world");
    assert_eq!(client.reply().await.0, 226);

    server.stop().await;
}

#[tokio::test]
async fn append_extends_file() {
    let server = TestServer::start(|_, _| {}).await;
    std::fs::write(server.public.path().join("log.txt"), b"one\n").unwrap();
    let mut client = server.login().await;

    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("APPE /Public/log.txt").await.0, 150);
    data.write_all(b"two\n").await.unwrap();
    drop(data);
    assert_eq!(client.reply().await.0, 226);

    assert_eq!(
        std::fs::read(server.public.path().join("log.txt")).unwrap(),
        b"one\ntwo\n"
    );
    server.stop().await;
}

#[tokio::test]
async fn directories_and_share_roots() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;
    assert_eq!(client.cmd("CDUP").await, (550, "550 Already at root directory\r\n".to_string()));
    assert_eq!(client.cmd("CWD /Public").await.0, 250);

    assert_eq!(client.cmd("MKD docs").await.1, "250 /Public/docs\r\n");
    assert!(server.public.path().join("docs").is_dir());
    assert_eq!(client.cmd("MKD docs").await, (450, "450 Directory already exists\r\n".to_string()));
    assert_eq!(
        client.cmd("RMD /Public").await,
        (550, "550 Access denied, cannot delete directory in root\r\n".to_string())
    );
    assert_eq!(client.cmd("MKD /NewShare").await.0, 550);

    assert_eq!(client.cmd("CWD docs").await.0, 250);
    assert_eq!(client.cmd("CDUP").await.0, 250);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/Public\"\r\n");
    assert_eq!(client.cmd("RMD docs").await.1, "250 Directory deleted OK\r\n");
    assert!(!server.public.path().join("docs").exists());
    assert_eq!(client.cmd("CWD docs").await.0, 550);

    server.stop().await;
}

#[tokio::test]
async fn rename_rules() {
    let server = TestServer::start(|_, _| {}).await;
    std::fs::write(server.public.path().join("a.txt"), b"abc").unwrap();
    std::fs::write(server.public.path().join("taken.txt"), b"x").unwrap();
    let mut client = server.login().await;

    assert_eq!(client.cmd("RNTO /Public/b.txt").await.1, "550 Rename from not set\r\n");

    assert_eq!(client.cmd("RNFR /Public/a.txt").await.0, 350);
    assert_eq!(
        client.cmd("RNTO /Other/a.txt").await.1,
        "550 Cannot rename across shares\r\n"
    );

    // any other command drops a pending rename
    assert_eq!(client.cmd("RNFR /Public/a.txt").await.0, 350);
    assert_eq!(client.cmd("NOOP").await.0, 200);
    assert_eq!(client.cmd("RNTO /Public/b.txt").await.1, "550 Rename from not set\r\n");

    assert_eq!(client.cmd("RNFR /Public/a.txt").await.0, 350);
    assert_eq!(
        client.cmd("RNTO /Public/taken.txt").await.1,
        "450 File exists with that name\r\n"
    );

    assert_eq!(client.cmd("RNFR /Public/a.txt").await.0, 350);
    assert_eq!(client.cmd("RNTO /Public/b.txt").await.0, 250);
    assert!(server.public.path().join("b.txt").exists());
    assert!(!server.public.path().join("a.txt").exists());

    assert_eq!(client.cmd("DELE /Public/b.txt").await.0, 250);
    assert!(!server.public.path().join("b.txt").exists());
    assert_eq!(client.cmd("DELE /Public/b.txt").await.0, 550);

    server.stop().await;
}

#[tokio::test]
async fn mlst_with_selected_facts() {
    let server = TestServer::start(|_, _| {}).await;
    std::fs::write(server.public.path().join("a.txt"), b"abc").unwrap();
    let mut client = server.login().await;

    assert_eq!(
        client.cmd("OPTS MLST size;type;").await.1,
        "200 MLST OPTS size;type;\r\n"
    );
    assert_eq!(
        client.cmd("OPTS MLST bogus;").await.1,
        "501 OPTS MLST Invalid argument\r\n"
    );

    let (code, text) = client.cmd("MLST /Public/a.txt").await;
    assert_eq!(code, 250);
    assert_eq!(
        text,
        "250-Listing /Public/a.txt\r\n size=3;type=file; /Public/a.txt\r\n250 End\r\n"
    );

    let (code, text) = client.cmd("MLST").await;
    assert_eq!(code, 250);
    assert!(text.contains("type=dir;"));

    server.stop().await;
}

#[tokio::test]
async fn mdtm_sets_and_reads_time() {
    let server = TestServer::start(|_, _| {}).await;
    std::fs::write(server.public.path().join("a.txt"), b"abc").unwrap();
    let mut client = server.login().await;
    assert_eq!(client.cmd("CWD Public").await.0, 250);

    assert_eq!(
        client.cmd("MDTM 20200102030405 a.txt").await.1,
        "213 20200102030405\r\n"
    );
    assert_eq!(client.cmd("MDTM a.txt").await.1, "213 20200102030405\r\n");
    assert_eq!(client.cmd("MDTM missing.txt").await.0, 550);

    server.stop().await;
}

#[tokio::test]
async fn disabled_features_are_refused() {
    let server = TestServer::start(|config, _| {
        config.features.mdtm = false;
        config.features.size = false;
        config.features.mlst = false;
    })
    .await;
    let mut client = server.login().await;

    assert_eq!(client.cmd("MDTM a.txt").await.0, 502);
    assert_eq!(client.cmd("SIZE a.txt").await.0, 502);
    assert_eq!(client.cmd("MLST").await.0, 502);
    let (_, feat) = client.cmd("FEAT").await;
    assert!(!feat.contains("MDTM"));
    assert!(feat.contains(" UTF8"));

    server.stop().await;
}

#[tokio::test]
async fn list_root_shows_shares() {
    let server = TestServer::start(|_, _| {}).await;
    std::fs::write(server.public.path().join("visible.txt"), b"abc").unwrap();
    let mut client = server.login().await;

    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("LIST").await.0, 150);
    let mut listing = String::new();
    timed(data.read_to_string(&mut listing)).await.unwrap();
    assert_eq!(client.reply().await.0, 226);

    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line.starts_with('d')));
    assert!(listing.contains(" Public\r\n"));
    assert!(listing.contains(" Other\r\n"));

    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("NLST /Public").await.0, 150);
    let mut names = String::new();
    timed(data.read_to_string(&mut names)).await.unwrap();
    assert_eq!(client.reply().await.0, 226);
    assert_eq!(names, "visible.txt\r\n");

    server.stop().await;
}

#[tokio::test]
async fn port_replaces_passive_listener() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;

    let addr = client.pasv().await;
    assert_eq!(client.cmd("PORT 127,0,0,1,4,1").await.1, "200 Port OK\r\n");
    assert!(TcpStream::connect(addr).await.is_err());
    assert_eq!(client.cmd("PORT 1,2,3").await.0, 501);
    assert_eq!(client.cmd("PORT 127,0,0,1,4").await.0, 501);
    assert_eq!(client.cmd("PORT 127,0,0,1,300,1").await.0, 501);
    assert_eq!(client.cmd("PORT 127,0,0,x,4,1").await.0, 501);

    server.stop().await;
}

#[tokio::test]
async fn abort_interrupts_threaded_store() {
    let server = TestServer::start(|config, _| config.server.threaded_transfers = true).await;
    let mut client = server.login().await;
    assert_eq!(client.cmd("ABOR").await.1, "226 Data connection not active\r\n");

    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("STOR /Public/big.bin").await.0, 150);
    let target = server.public.path().join("big.bin");
    data.write_all(&[7u8; 500]).await.unwrap();
    wait_for_len(&target, 500).await;
    data.write_all(&[8u8; 500]).await.unwrap();
    wait_for_len(&target, 1000).await;

    assert_eq!(client.cmd("ABOR").await.1, "226 Transfer aborted\r\n");
    assert_eq!(client.cmd("NOOP").await.0, 200);
    // bytes sent after the abort never reach the file
    let _ = data.write_all(&[9u8; 500]).await;
    let written = std::fs::read(&target).unwrap();
    assert_eq!(written.len(), 1000);
    assert!(written[..500].iter().all(|b| *b == 7));
    assert!(written[500..].iter().all(|b| *b == 8));

    // the next transfer starts cleanly
    let addr = client.pasv().await;
    let mut data = timed(TcpStream::connect(addr)).await.unwrap();
    assert_eq!(client.cmd("STOR /Public/small.txt").await.0, 150);
    data.write_all(b"done").await.unwrap();
    drop(data);
    assert_eq!(client.reply().await.1, "226 Closing data connection\r\n");
    assert_eq!(
        std::fs::read(server.public.path().join("small.txt")).unwrap(),
        b"done"
    );

    server.stop().await;
}

#[tokio::test]
async fn anonymous_guest_is_confined_to_home() {
    let server = TestServer::start(|config, home| {
        config.anonymous.enabled = true;
        config.anonymous.home_dir = Some(home.join("guest"));
    })
    .await;
    let mut client = server.client().await;

    assert_eq!(
        client.cmd("USER anonymous").await.1,
        "331 Guest login ok, send your complete e-mail address as password\r\n"
    );
    assert_eq!(client.cmd("PASS me@example.com").await.0, 230);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/guest\"\r\n");
    assert_eq!(client.cmd("MKD upload").await.1, "250 /guest/upload\r\n");
    assert_eq!(client.cmd("CWD /Public").await.0, 550);
    assert_eq!(client.cmd("CDUP").await.0, 550);
    assert_eq!(client.cmd("RMD /guest").await.0, 550);

    // climbing out of the home share lands back on it
    assert_eq!(client.cmd("CWD upload").await.0, 250);
    assert_eq!(client.cmd("CWD ../..").await.0, 250);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/guest\"\r\n");
    assert_eq!(client.cmd("CWD ..").await.0, 250);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/guest\"\r\n");
    assert_eq!(client.cmd("CWD /").await.0, 250);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/guest\"\r\n");

    server.stop().await;
}

#[tokio::test]
async fn anonymous_refused_when_disabled() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.client().await;

    // without anonymous access the account is an ordinary unknown user
    let (code, text) = client.cmd("USER anonymous").await;
    assert_eq!(code, 331);
    assert!(text.contains("need password for anonymous"));
    assert_eq!(client.cmd("PASS me@example.com").await.0, 530);
    assert!(client.is_closed().await);

    server.stop().await;
}

#[tokio::test]
async fn commands_run_in_transactions() {
    let transactions = Arc::new(RecordingTransactions::default());
    let service = Arc::clone(&transactions);
    let server =
        TestServer::start_with(|_, _| {}, move |ctx| ctx.with_transactions(service)).await;
    let mut client = server.login().await;

    assert_eq!(client.cmd("MKD /Public/docs").await.0, 250);
    assert_eq!(client.cmd("NOOP").await.0, 200);
    assert_eq!(transactions.log(), vec!["begin ReadWrite", "commit ReadWrite"]);

    assert_eq!(client.cmd("SIZE /Public/missing").await.0, 550);
    assert_eq!(client.cmd("NOOP").await.0, 200);
    assert_eq!(transactions.log().len(), 2);

    server.stop().await;
}

#[tokio::test]
async fn site_who_lists_sessions() {
    let server = TestServer::start(|config, _| config.server.site_commands = true).await;
    let mut client = server.login().await;

    let (code, text) = client.cmd("SITE WHO").await;
    assert_eq!(code, 200);
    assert!(text.starts_with("200-1 users online:\r\n"));
    assert!(text.contains("alice"));
    assert!(text.ends_with("200 End of WHO\r\n"));
    assert_eq!(client.cmd("SITE BOGUS").await.0, 500);

    assert_eq!(server.handle.context().registry.len(), 1);
    assert_eq!(client.cmd("QUIT").await.0, 221);
    assert!(client.is_closed().await);

    server.stop().await;
}

#[tokio::test]
async fn stop_closes_sessions() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;

    server.stop().await;
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn failed_transfers_release_data_channel() {
    let server = TestServer::start(|_, _| {}).await;
    std::fs::create_dir(server.public.path().join("sub")).unwrap();
    let mut client = server.login().await;

    let addr = client.pasv().await;
    assert_eq!(client.cmd("RETR /Public/missing.txt").await.1, "500 Invalid path\r\n");
    assert!(TcpStream::connect(addr).await.is_err());

    let addr = client.pasv().await;
    assert_eq!(client.cmd("RETR /Public/sub").await.1, "550 Not a plain file\r\n");
    assert!(TcpStream::connect(addr).await.is_err());

    let addr = client.pasv().await;
    assert_eq!(client.cmd("STOR /Public").await.0, 550);
    assert!(TcpStream::connect(addr).await.is_err());

    let addr = client.pasv().await;
    assert_eq!(
        client.cmd("APPE /Public/sub").await.1,
        "550 Cannot overwrite a directory\r\n"
    );
    assert!(TcpStream::connect(addr).await.is_err());

    // the channel is gone, so the next transfer needs a new PASV
    assert_eq!(client.cmd("RETR /Public/sub").await.0, 425);

    server.stop().await;
}

#[tokio::test]
async fn restart_offset_belongs_to_retrieve() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;

    // STOR leaves a pending offset alone and writes from the start
    assert_eq!(client.cmd("REST 3").await.0, 350);
    put(&mut client, "STOR", "/Public/r.txt", b"abcdef").await;
    assert_eq!(std::fs::read(server.public.path().join("r.txt")).unwrap(), b"abcdef");
    assert_eq!(fetch(&mut client, "/Public/r.txt").await, b"def");
    assert_eq!(fetch(&mut client, "/Public/r.txt").await, b"abcdef");

    // a RETR that fails still uses up the offset
    assert_eq!(client.cmd("REST 2").await.0, 350);
    assert_eq!(client.cmd("RETR /Public/r.txt").await.0, 425);
    assert_eq!(fetch(&mut client, "/Public/r.txt").await, b"abcdef");

    assert_eq!(client.cmd("REST 6").await.0, 350);
    assert_eq!(fetch(&mut client, "/Public/r.txt").await, b"");
    assert_eq!(client.cmd("REST -1").await.0, 501);

    server.stop().await;
}

#[tokio::test]
async fn overlong_command_line_is_refused() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;

    client.send(&format!("NOOP {}", "x".repeat(10_000))).await;
    assert_eq!(client.reply().await.1, "500 Command line too long\r\n");
    assert_eq!(client.cmd("NOOP").await.0, 200);
    assert_eq!(client.cmd("PWD").await.1, "257 \"/\"\r\n");

    server.stop().await;
}

#[tokio::test]
async fn changes_are_notified() {
    let server = TestServer::start(|_, _| {}).await;
    let mut client = server.login().await;

    put(&mut client, "STOR", "/Public/new.txt", b"one").await;
    put(&mut client, "APPE", "/Public/new.txt", b"two").await;
    assert_eq!(client.cmd("MKD /Public/docs").await.0, 250);
    assert_eq!(client.cmd("RNFR /Public/new.txt").await.0, 350);
    assert_eq!(client.cmd("RNTO /Public/docs/moved.txt").await.0, 250);
    assert_eq!(client.cmd("DELE /Public/docs/moved.txt").await.0, 250);
    assert_eq!(client.cmd("RMD /Public/docs").await.0, 250);

    // refused commands leave no trace
    assert_eq!(client.cmd("DELE /Public/docs").await.0, 550);
    assert_eq!(client.cmd("RMD /Other").await.0, 550);

    assert_eq!(
        server.events.events(),
        vec![
            "Added Public\\new.txt",
            "Modified Public\\new.txt",
            "DirectoryAdded Public\\docs",
            "Rename Public\\new.txt \\docs\\moved.txt",
            "Removed Public\\docs\\moved.txt",
            "DirectoryRemoved Public\\docs",
        ]
    );

    server.stop().await;
}
