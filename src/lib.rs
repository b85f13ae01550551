//! A minimal RFC 959 FTP server: PASV-only data channel, binary
//! transfers, UTF-8 / Windows-1251 encoding translation, no
//! authentication.

pub mod command;
pub mod config;
pub mod encoding;
pub mod error;
pub mod fs;
pub mod listing;
pub mod nav;
pub mod server;
pub mod session;
pub mod transport;

pub use config::ServerConfig;
pub use error::FtpError;
pub use server::Server;
