//! The reactor: owns the listening socket and spawns one task per
//! accepted connection.
//!
//! Grounded in the teacher's `handle_forever`/`process_socket` pair
//! (`src/lib.rs` in the original NFS crate, since deleted from this tree —
//! see DESIGN.md): a `tokio::net::TcpListener` accept loop that hands each
//! socket to its own spawned task rather than the single-threaded
//! `select()` loop spec.md §4.I describes (SPEC_FULL.md §9 Open Question
//! 1 records this as a deliberate upgrade, not a deviation).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

use crate::config::ServerConfig;
use crate::encoding::Encoding;
use crate::error::FtpError;
use crate::fs::{Filesystem, LocalFilesystem};
use crate::session::Session;

pub struct Server {
    listener: TcpListener,
    home_dir: PathBuf,
    native_encoding: Encoding,
    fs: Arc<dyn Filesystem>,
}

impl Server {
    /// Binds the control listener and ensures `home_dir` exists (creating
    /// it, mode `0777` on Unix, if absent) — spec.md §4.I's startup
    /// precondition.
    pub async fn bind(config: &ServerConfig) -> Result<Self, FtpError> {
        prepare_home_dir(&config.home_dir).await?;

        let addr = SocketAddr::new(config.bind_addr, config.port);
        let listener =
            TcpListener::bind(addr).await.map_err(|source| FtpError::Bind { addr, source })?;

        info!(%addr, home_dir = %config.home_dir.display(), "control listener bound");

        Ok(Server {
            listener,
            home_dir: config.home_dir.clone(),
            native_encoding: config.native_encoding,
            fs: Arc::new(LocalFilesystem::new()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` fires, spawning one
    /// `Session::run` task per client. Sessions already in flight are
    /// allowed to finish their current command; this function returns
    /// once the listener itself stops accepting.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let home_dir = self.home_dir.clone();
                            let native_encoding = self.native_encoding;
                            let fs = Arc::clone(&self.fs);
                            let span = info_span!("session", addr = %peer_addr);
                            tokio::spawn(
                                async move {
                                    let session = Session::new(stream, home_dir, native_encoding, fs);
                                    session.run().await;
                                }
                                .instrument(span),
                            );
                        }
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shutdown signal received, stopping accept loop");
                        return;
                    }
                }
            }
        }
    }
}

async fn prepare_home_dir(path: &std::path::Path) -> Result<(), FtpError> {
    if tokio::fs::metadata(path).await.is_ok() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| FtpError::HomeDir { path: path.to_path_buf(), source })?;
    set_world_writable(path).await
}

#[cfg(unix)]
async fn set_world_writable(path: &std::path::Path) -> Result<(), FtpError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777))
        .await
        .map_err(|source| FtpError::HomeDir { path: path.to_path_buf(), source })
}

#[cfg(not(unix))]
async fn set_world_writable(_path: &std::path::Path) -> Result<(), FtpError> {
    Ok(())
}
