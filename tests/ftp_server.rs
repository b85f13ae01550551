#[path = "ftp_server/common.rs"]
mod common;
#[path = "ftp_server/scenarios.rs"]
mod scenarios;
