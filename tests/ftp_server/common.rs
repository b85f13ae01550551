use std::net::SocketAddr;

use ftp_mamont::config::ServerConfig;
use ftp_mamont::encoding::Encoding;
use ftp_mamont::Server;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::watch;

/// A live server bound to an OS-assigned loopback port, backed by a
/// scratch home directory. Dropping the fixture stops the accept loop.
pub struct Fixture {
    pub tempdir: TempDir,
    pub addr: SocketAddr,
    shutdown: watch::Sender<bool>,
}

impl Fixture {
    pub async fn start() -> Self {
        let tempdir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            home_dir: tempdir.path().to_path_buf(),
            bind_addr: "127.0.0.1".parse().unwrap(),
            port: 0,
            native_encoding: Encoding::Utf8,
        };
        let server = Server::bind(&config).await.expect("bind server");
        let addr = server.local_addr().expect("local addr");

        let (tx, rx) = watch::channel(false);
        tokio::spawn(server.run(rx));

        Fixture { tempdir, addr, shutdown: tx }
    }

    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.expect("connect to server")
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
