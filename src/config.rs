//! Server configuration: CLI flags merged with an optional TOML file.
//!
//! Precedence is CLI flags > file values > built-in defaults. Only two
//! values are strictly required by the core server (`home_dir`,
//! `native_encoding`); the rest (`bind_addr`, `port`) are ambient
//! deployment knobs that didn't exist in the embedded original, where
//! both were compile-time constants.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::encoding::Encoding;

const DEFAULT_PORT: u16 = 21;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

#[derive(Debug, Parser)]
#[command(name = "ftp-mamontd", about = "A minimal RFC 959 FTP server")]
pub struct Cli {
    /// Directory exposed to clients as the virtual root.
    #[arg(long)]
    pub home_dir: Option<PathBuf>,

    /// TCP port the control listener binds to.
    #[arg(long)]
    pub port: Option<u16>,

    /// Address the control listener binds to.
    #[arg(long)]
    pub bind_addr: Option<IpAddr>,

    /// Server-native encoding: "utf8" or "cp1251".
    #[arg(long)]
    pub native_encoding: Option<String>,

    /// Optional TOML file providing defaults below CLI-flag precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Mirrors [`Cli`]'s fields, all optional, for merging from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub home_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_addr: Option<IpAddr>,
    pub native_encoding: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub home_dir: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub native_encoding: Encoding,
}

impl ServerConfig {
    /// Builds a `ServerConfig` from parsed CLI flags, reading `--config`
    /// if present and falling back to built-in defaults for anything
    /// neither source supplies.
    pub fn load(cli: Cli) -> Result<Self, String> {
        let file = match &cli.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|e| format!("reading {}: {e}", path.display()))?;
                toml::from_str(&contents).map_err(|e| format!("parsing {}: {e}", path.display()))?
            }
            None => FileConfig::default(),
        };

        let home_dir = cli
            .home_dir
            .or(file.home_dir)
            .unwrap_or_else(|| PathBuf::from("./ftp-root"));
        let bind_addr = cli
            .bind_addr
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.parse().expect("valid default bind addr"));
        let port = cli.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let native_encoding = match cli.native_encoding.or(file.native_encoding) {
            None => Encoding::Utf8,
            Some(s) => parse_encoding(&s)?,
        };

        Ok(ServerConfig { home_dir, bind_addr, port, native_encoding })
    }
}

fn parse_encoding(s: &str) -> Result<Encoding, String> {
    match s.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => Ok(Encoding::Utf8),
        "cp1251" | "windows-1251" | "win1251" => Ok(Encoding::Cp1251),
        other => Err(format!("unknown encoding '{other}', expected 'utf8' or 'cp1251'")),
    }
}
