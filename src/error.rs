//! Crate-wide error type for failures that abort a session or startup.
//!
//! Per-command filesystem failures are *not* routed through this type —
//! those surface directly as `550 <os error text>` reply strings (see
//! [`crate::session`]). `FtpError` exists for the seams that must fail
//! loudly: binding the control or PASV listener, and preparing the
//! configured home directory at startup.

use std::fmt;
use std::io;
use std::net::SocketAddr;

#[derive(Debug)]
pub enum FtpError {
    /// The control listener could not be bound to `addr`.
    Bind { addr: SocketAddr, source: io::Error },
    /// The configured home directory does not exist and could not be created.
    HomeDir { path: std::path::PathBuf, source: io::Error },
    /// No passive-mode port could be bound after exhausting the retry budget.
    PasvExhausted { attempts: u32 },
    /// A control-channel I/O error that ends the session.
    Io(io::Error),
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpError::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            FtpError::HomeDir { path, source } => {
                write!(f, "failed to prepare home directory {}: {source}", path.display())
            }
            FtpError::PasvExhausted { attempts } => {
                write!(f, "could not bind a passive-mode port after {attempts} attempts")
            }
            FtpError::Io(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for FtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FtpError::Bind { source, .. } => Some(source),
            FtpError::HomeDir { source, .. } => Some(source),
            FtpError::PasvExhausted { .. } => None,
            FtpError::Io(source) => Some(source),
        }
    }
}

impl From<io::Error> for FtpError {
    fn from(source: io::Error) -> Self {
        FtpError::Io(source)
    }
}
