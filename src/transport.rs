//! Socket abstractions: a line-reassembling control connection and a
//! single-shot passive-mode data listener.
//!
//! The original ran a hand-rolled `select()` loop and assumed one FTP
//! command arrived per `recv` call (spec.md §9, "single-recv command
//! assumption"). `ControlStream` closes that gap by buffering bytes across
//! reads until a full CRLF- (or bare LF-) terminated line is available,
//! which is the only behavior change the upgrade from a single-task
//! reactor to per-session tasks requires.

use std::net::{IpAddr, SocketAddr};

use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::FtpError;

const PASV_RETRY_ATTEMPTS: u32 = 8;

/// Wraps a control-channel `TcpStream`, reassembling inbound bytes into
/// complete command lines.
pub struct ControlStream {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl ControlStream {
    pub fn new(stream: TcpStream) -> Self {
        ControlStream { stream, buf: Vec::new() }
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// The local address of this control socket, used to build the PASV
    /// reply's host octets (the original's `get_ip_data` reads the
    /// control socket's `getsockname`, not the data socket's).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Reads one command line, stripping the trailing CRLF/LF. Returns
    /// `Ok(None)` on clean peer shutdown (no more data, buffer drained).
    pub async fn read_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop(); // drop LF
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }

            let mut chunk = [0u8; 2048];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buf);
                return Ok(Some(line));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes).await
    }

    pub async fn send_reply(&mut self, reply: &str) -> std::io::Result<()> {
        self.write_all(reply.as_bytes()).await?;
        self.write_all(b"\r\n").await
    }
}

/// A PASV data listener: single-shot, bound to a pseudo-randomly chosen
/// ephemeral port in the same `p1 ∈ [128,191]`, `p2 ∈ [0,254]` range the
/// original draws from (see SPEC_FULL.md §3), retried on bind failure.
pub struct PassiveListener {
    listener: TcpListener,
    port: u16,
}

impl PassiveListener {
    /// Binds a new passive listener, retrying with a fresh port draw on
    /// failure up to `PASV_RETRY_ATTEMPTS` times.
    pub async fn bind(bind_addr: IpAddr) -> Result<Self, FtpError> {
        let mut last_err = None;
        for _ in 0..PASV_RETRY_ATTEMPTS {
            let port = draw_pasv_port();
            let addr = SocketAddr::new(bind_addr, port);
            match TcpListener::bind(addr).await {
                Ok(listener) => return Ok(PassiveListener { listener, port }),
                Err(e) => last_err = Some(e),
            }
        }
        let _ = last_err;
        Err(FtpError::PasvExhausted { attempts: PASV_RETRY_ATTEMPTS })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accepts exactly one data connection, consuming the listener (a new
    /// PASV is required per transfer — see SPEC_FULL.md §4.H).
    pub async fn accept_once(self) -> std::io::Result<TcpStream> {
        let (stream, _) = self.listener.accept().await?;
        Ok(stream)
    }
}

/// `p1 = 128 + rand() % 64` (so `p1 ∈ [128,191]`), `p2 = rand() % 255`
/// (so `p2 ∈ [0,254]`, never 255) — the original's range, off-by-one
/// included, reproduced verbatim rather than "fixed" to `0..=255` since
/// spec.md's open question is about retry behavior, not the port range
/// itself.
fn draw_pasv_port() -> u16 {
    let mut rng = rand::rng();
    let p1: u16 = 128 + rng.random_range(0..64);
    let p2: u16 = rng.random_range(0..255);
    p1 * 256 + p2
}
