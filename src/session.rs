//! Per-connection protocol engine: owns one control connection and
//! drives the command loop for its lifetime.
//!
//! Where spec.md's reactor (§4.I) dispatches one session's commands from
//! inside a shared poll loop, here each `Session::run` is its own
//! `tokio::task` (see SPEC_FULL.md §9 Open Question 1) — but the ordering
//! guarantee spec.md §5 requires (one command fully answered before the
//! next is read) falls out naturally from `run`'s single `.await` chain.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::command::{parse_command, Verb};
use crate::encoding::Encoding;
use crate::fs::Filesystem;
use crate::listing::format_entry;
use crate::nav::Navigator;
use crate::transport::{ControlStream, PassiveListener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferMode {
    Ascii,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelMode {
    Active,
    Passive,
}

pub struct Session {
    control: ControlStream,
    nav: Navigator,
    native_encoding: Encoding,
    encoding: Encoding,
    transfer_mode: TransferMode,
    channel_mode: ChannelMode,
    rename_from: Option<PathBuf>,
    data_listener: Option<PassiveListener>,
    fs: Arc<dyn Filesystem>,
}

impl Session {
    pub fn new(control: TcpStream, root_path: PathBuf, native_encoding: Encoding, fs: Arc<dyn Filesystem>) -> Self {
        Session {
            control: ControlStream::new(control),
            nav: Navigator::new(root_path),
            native_encoding,
            encoding: native_encoding,
            transfer_mode: TransferMode::Binary,
            channel_mode: ChannelMode::Active,
            rename_from: None,
            data_listener: None,
            fs,
        }
    }

    /// Runs the command loop until the client disconnects or a fatal
    /// control-channel I/O error occurs. Errors are logged, not
    /// propagated — a broken session ends quietly, matching spec.md §7
    /// "peer hangup ... session terminated silently".
    pub async fn run(mut self) {
        if let Err(e) = self.control.send_reply("220 lwftp ready").await {
            debug!(error = %e, "failed to send banner");
            return;
        }

        loop {
            let line = match self.control.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("client closed control connection");
                    return;
                }
                Err(e) => {
                    debug!(error = %e, "control read failed");
                    return;
                }
            };

            let command = parse_command(&line);
            if let Err(e) = self.dispatch(command).await {
                debug!(error = %e, "control write failed");
                return;
            }
        }
    }

    async fn dispatch(&mut self, command: crate::command::Command) -> std::io::Result<()> {
        match command.verb {
            Verb::User => self.control.send_reply("331 pretend login accepted").await,
            Verb::Pass => self.control.send_reply("230 fake user logged in").await,
            Verb::Opts => self.handle_opts(&command.argument).await,
            Verb::Pwd => self.handle_pwd().await,
            Verb::Type => self.control.send_reply("200 Type set to I").await,
            Verb::Cwd => self.handle_cwd(&command.argument).await,
            Verb::Pasv => self.handle_pasv().await,
            Verb::List => self.handle_list().await,
            Verb::Syst => self.control.send_reply("215 WIN32 SingularFTP v.0.01").await,
            Verb::Feat => self.control.send_reply("500 command not recognized").await,
            Verb::Help => self.control.send_reply("500 command not recognized").await,
            Verb::Noop => self.control.send_reply("200 OK").await,
            Verb::Dele => self.handle_dele(&command.argument).await,
            Verb::Cdup => self.handle_cdup().await,
            Verb::Retr => self.handle_retr(&command.argument).await,
            Verb::Size => self.handle_size(&command.argument).await,
            Verb::Mkd => self.handle_mkd(&command.argument).await,
            Verb::Rnfr => self.handle_rnfr(&command.argument).await,
            Verb::Rnto => self.handle_rnto(&command.argument).await,
            Verb::Rmd => self.handle_rmd(&command.argument).await,
            Verb::Stor => self.handle_stor(&command.argument).await,
            Verb::Unknown => self.control.send_reply("500 command not recognized").await,
        }
    }

    /// Translates a client-supplied path argument into the native
    /// encoding, then resolves it to a host-absolute path under the
    /// current directory (spec.md §4.G "Path composition for file-arg
    /// commands").
    fn resolve_arg(&self, argument: &str) -> PathBuf {
        let native = self.encoding.translate(argument.as_bytes(), self.native_encoding);
        let native = String::from_utf8_lossy(&native).into_owned();
        self.nav.absolute_path().join(native)
    }

    async fn handle_opts(&mut self, argument: &str) -> std::io::Result<()> {
        if argument == "utf8 on" {
            self.encoding = Encoding::Utf8;
        }
        self.control.send_reply("200 ok").await
    }

    async fn handle_pwd(&mut self) -> std::io::Result<()> {
        let native = format!("/{}", self.nav.relative_path());
        let client_visible = self.native_encoding.translate(native.as_bytes(), self.encoding);
        let client_visible = String::from_utf8_lossy(&client_visible).into_owned();
        self.control.send_reply(&format!("257 \"{client_visible}\"")).await
    }

    async fn handle_cwd(&mut self, argument: &str) -> std::io::Result<()> {
        if argument.starts_with('/') {
            self.nav.move_to_root();
        }
        let native = self.encoding.translate(argument.as_bytes(), self.native_encoding);
        let native = String::from_utf8_lossy(&native).into_owned();

        let (absolute, candidate_stack) = self.nav.resolve(&native);
        match self.fs.stat(&absolute).await {
            Ok(Some(stat)) if stat.kind == crate::fs::EntryKind::Directory => {
                self.nav.commit(candidate_stack);
                self.control.send_reply("250 CWD command successful").await
            }
            _ => self.control.send_reply("550 Could not change directory").await,
        }
    }

    async fn handle_cdup(&mut self) -> std::io::Result<()> {
        let (_, candidate_stack) = self.nav.resolve("..");
        self.nav.commit(candidate_stack);
        self.control.send_reply("200 OK").await
    }

    async fn handle_pasv(&mut self) -> std::io::Result<()> {
        let local_addr = self.control.local_addr()?;
        self.data_listener = None;

        match PassiveListener::bind(local_addr.ip()).await {
            Ok(listener) => {
                let port = listener.port();
                self.channel_mode = ChannelMode::Passive;
                self.data_listener = Some(listener);

                let octets = match local_addr.ip() {
                    std::net::IpAddr::V4(v4) => v4.octets(),
                    std::net::IpAddr::V6(_) => [127, 0, 0, 1],
                };
                let p1 = (port / 256) as u8;
                let p2 = (port % 256) as u8;
                let reply = format!(
                    "227 Entering Passive Mode ({},{},{},{},{},{})",
                    octets[0], octets[1], octets[2], octets[3], p1, p2
                );
                self.control.send_reply(&reply).await
            }
            Err(e) => {
                warn!(error = %e, "passive listener bind failed");
                self.control.send_reply("550 Could not open passive connection").await
            }
        }
    }

    async fn accept_data_connection(&mut self) -> Option<TcpStream> {
        match self.data_listener.take() {
            Some(listener) => match listener.accept_once().await {
                Ok(stream) => Some(stream),
                Err(e) => {
                    warn!(error = %e, "data connection accept failed");
                    None
                }
            },
            None => None,
        }
    }

    async fn handle_list(&mut self) -> std::io::Result<()> {
        self.control.send_reply("150 Opening connection").await?;

        let Some(mut data_sock) = self.accept_data_connection().await else {
            return self.control.send_reply("426 Broken pipe").await;
        };

        let dir = self.nav.absolute_path();
        let result = match self.fs.enumerate(&dir).await {
            Ok(entries) => {
                let mut buf = String::new();
                for entry in &entries {
                    let native_line = format_entry(entry);
                    let translated =
                        self.native_encoding.translate(native_line.as_bytes(), self.encoding);
                    buf.push_str(&String::from_utf8_lossy(&translated));
                    buf.push_str("\r\n");
                }
                data_sock.write_all(buf.as_bytes()).await
            }
            Err(e) => {
                warn!(error = %e, "enumerate failed during LIST");
                Ok(())
            }
        };
        drop(data_sock);

        match result {
            Ok(()) => self.control.send_reply("226 Transfer Complete").await,
            Err(_) => self.control.send_reply("426 Broken pipe").await,
        }
    }

    async fn handle_dele(&mut self, argument: &str) -> std::io::Result<()> {
        let path = self.resolve_arg(argument);
        match self.fs.unlink_file(&path).await {
            Ok(()) => self.control.send_reply("250 DELE command successful").await,
            Err(e) => self.control.send_reply(&format!("550 {e}")).await,
        }
    }

    async fn handle_retr(&mut self, argument: &str) -> std::io::Result<()> {
        self.control.send_reply("150 Opening BINARY mode data connection").await?;

        let Some(mut data_sock) = self.accept_data_connection().await else {
            return self.control.send_reply("426 Broken pipe").await;
        };

        let path = self.resolve_arg(argument);
        let result = async {
            let mut file = tokio::fs::File::open(&path).await?;
            tokio::io::copy(&mut file, &mut data_sock).await
        }
        .await;
        drop(data_sock);

        match result {
            Ok(_) => self.control.send_reply("226 Transfer Complete").await,
            Err(e) => {
                warn!(error = %e, "RETR failed");
                self.control.send_reply("426 Broken pipe").await
            }
        }
    }

    async fn handle_stor(&mut self, argument: &str) -> std::io::Result<()> {
        self.control.send_reply("150 Opening BINARY mode data connection").await?;

        let Some(mut data_sock) = self.accept_data_connection().await else {
            return self.control.send_reply("426 Broken pipe").await;
        };

        let path = self.resolve_arg(argument);
        let result = async {
            let mut file = tokio::fs::File::create(&path).await?;
            tokio::io::copy(&mut data_sock, &mut file).await
        }
        .await;
        drop(data_sock);

        match result {
            Ok(_) => self.control.send_reply("226 Transfer Complete").await,
            Err(e) => self.control.send_reply(&format!("550 {e}")).await,
        }
    }

    async fn handle_size(&mut self, argument: &str) -> std::io::Result<()> {
        let path = self.resolve_arg(argument);
        match self.fs.stat(&path).await {
            Ok(Some(stat)) => self.control.send_reply(&format!("213 {}", stat.size)).await,
            Ok(None) => {
                self.control
                    .send_reply(&format!("550 {}", std::io::Error::from(std::io::ErrorKind::NotFound)))
                    .await
            }
            Err(e) => self.control.send_reply(&format!("550 {e}")).await,
        }
    }

    async fn handle_mkd(&mut self, argument: &str) -> std::io::Result<()> {
        let path = self.resolve_arg(argument);
        match self.fs.mkdir(&path).await {
            Ok(()) => self.control.send_reply("257 Directory created").await,
            Err(e) => self.control.send_reply(&format!("550 {e}")).await,
        }
    }

    async fn handle_rnfr(&mut self, argument: &str) -> std::io::Result<()> {
        let path = self.resolve_arg(argument);
        match self.fs.stat(&path).await {
            Ok(Some(_)) => {
                self.rename_from = Some(path);
                self.control.send_reply("350 File Exists").await
            }
            _ => {
                self.rename_from = None;
                self.control.send_reply("550 Path permission error").await
            }
        }
    }

    async fn handle_rnto(&mut self, argument: &str) -> std::io::Result<()> {
        let Some(from) = self.rename_from.clone() else {
            return self.control.send_reply("550 Path permission error").await;
        };
        let to = self.resolve_arg(argument);
        match self.fs.rename(&from, &to).await {
            Ok(()) => self.control.send_reply("250 RNTO command successful").await,
            Err(e) => self.control.send_reply(&format!("550 {e}")).await,
        }
    }

    async fn handle_rmd(&mut self, argument: &str) -> std::io::Result<()> {
        let path = self.resolve_arg(argument);
        // Always deletes contained files: the original's remove_directory_r
        // with delete_files=false leaves a non-empty directory behind and
        // the final rmdir fails silently (SPEC_FULL.md §9 Open Question 7).
        match self.fs.rmdir_recursive(&path, true).await {
            Ok(()) => self.control.send_reply("250 RMD command successful").await,
            Err(e) => self.control.send_reply(&format!("550 {e}")).await,
        }
    }
}
