use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::common::Fixture;

async fn read_reply(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).await.expect("read reply");
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

async fn send_line(stream: &mut TcpStream, line: &str) {
    stream.write_all(line.as_bytes()).await.expect("write command");
}

/// Parses a `227 Entering Passive Mode (a,b,c,d,p1,p2)` reply into a
/// connectable socket address.
fn parse_pasv_addr(reply: &str) -> std::net::SocketAddr {
    let start = reply.find('(').expect("pasv reply has a paren group");
    let end = reply.find(')').expect("pasv reply has a closing paren");
    let nums: Vec<u16> = reply[start + 1..end]
        .split(',')
        .map(|s| s.trim().parse().expect("numeric pasv field"))
        .collect();
    let ip = std::net::Ipv4Addr::new(nums[0] as u8, nums[1] as u8, nums[2] as u8, nums[3] as u8);
    let port = nums[4] * 256 + nums[5];
    std::net::SocketAddr::from((ip, port))
}

#[tokio::test]
async fn login_and_pwd_at_root() {
    let fixture = Fixture::start().await;
    let mut control = fixture.connect().await;

    assert_eq!(read_reply(&mut control).await, "220 lwftp ready\r\n");

    send_line(&mut control, "USER anonymous\r\n").await;
    assert_eq!(read_reply(&mut control).await, "331 pretend login accepted\r\n");

    send_line(&mut control, "PASS x\r\n").await;
    assert_eq!(read_reply(&mut control).await, "230 fake user logged in\r\n");

    send_line(&mut control, "PWD\r\n").await;
    assert_eq!(read_reply(&mut control).await, "257 \"/\"\r\n");
}

#[tokio::test]
async fn negotiate_utf8() {
    let fixture = Fixture::start().await;
    let mut control = fixture.connect().await;
    let _ = read_reply(&mut control).await; // banner

    send_line(&mut control, "opts utf8 on\r\n").await;
    assert_eq!(read_reply(&mut control).await, "200 ok\r\n");
}

#[tokio::test]
async fn unknown_command_gets_500() {
    let fixture = Fixture::start().await;
    let mut control = fixture.connect().await;
    let _ = read_reply(&mut control).await; // banner

    send_line(&mut control, "QUIT\r\n").await;
    assert_eq!(read_reply(&mut control).await, "500 command not recognized\r\n");
}

#[tokio::test]
async fn passive_list_of_empty_root() {
    let fixture = Fixture::start().await;
    let mut control = fixture.connect().await;
    let _ = read_reply(&mut control).await; // banner

    send_line(&mut control, "PASV\r\n").await;
    let pasv_reply = read_reply(&mut control).await;
    assert!(pasv_reply.starts_with("227 Entering Passive Mode ("));
    let data_addr = parse_pasv_addr(&pasv_reply);

    send_line(&mut control, "LIST\r\n").await;
    assert_eq!(read_reply(&mut control).await, "150 Opening connection\r\n");

    let mut data = TcpStream::connect(data_addr).await.expect("connect to pasv port");
    let mut listing = Vec::new();
    data.read_to_end(&mut listing).await.expect("read listing");
    assert!(listing.is_empty());

    assert_eq!(read_reply(&mut control).await, "226 Transfer Complete\r\n");
}

#[tokio::test]
async fn upload_then_download_round_trips_bytes() {
    let fixture = Fixture::start().await;
    let mut control = fixture.connect().await;
    let _ = read_reply(&mut control).await; // banner

    send_line(&mut control, "PASV\r\n").await;
    let pasv_reply = read_reply(&mut control).await;
    let data_addr = parse_pasv_addr(&pasv_reply);

    send_line(&mut control, "STOR a.bin\r\n").await;
    assert_eq!(read_reply(&mut control).await, "150 Opening BINARY mode data connection\r\n");

    let mut upload = TcpStream::connect(data_addr).await.expect("connect to pasv port");
    upload.write_all(b"hello").await.expect("write payload");
    upload.shutdown().await.expect("half-close upload");
    drop(upload);

    assert_eq!(read_reply(&mut control).await, "226 Transfer Complete\r\n");

    send_line(&mut control, "PASV\r\n").await;
    let pasv_reply = read_reply(&mut control).await;
    let data_addr = parse_pasv_addr(&pasv_reply);

    send_line(&mut control, "RETR a.bin\r\n").await;
    assert_eq!(read_reply(&mut control).await, "150 Opening BINARY mode data connection\r\n");

    let mut download = TcpStream::connect(data_addr).await.expect("connect to pasv port");
    let mut received = Vec::new();
    download.read_to_end(&mut received).await.expect("read file contents");
    assert_eq!(received, b"hello");

    assert_eq!(read_reply(&mut control).await, "226 Transfer Complete\r\n");
}

#[tokio::test]
async fn rename_flow() {
    let fixture = Fixture::start().await;
    std::fs::write(fixture.tempdir.path().join("old"), b"data").unwrap();
    let mut control = fixture.connect().await;
    let _ = read_reply(&mut control).await; // banner

    send_line(&mut control, "RNFR old\r\n").await;
    assert_eq!(read_reply(&mut control).await, "350 File Exists\r\n");

    send_line(&mut control, "RNTO new\r\n").await;
    assert_eq!(read_reply(&mut control).await, "250 RNTO command successful\r\n");

    assert!(fixture.tempdir.path().join("new").exists());
    assert!(!fixture.tempdir.path().join("old").exists());
}

#[tokio::test]
async fn rnfr_on_missing_name_replies_path_permission_error() {
    let fixture = Fixture::start().await;
    let mut control = fixture.connect().await;
    let _ = read_reply(&mut control).await; // banner

    send_line(&mut control, "RNFR missing\r\n").await;
    assert_eq!(read_reply(&mut control).await, "550 Path permission error\r\n");
}
