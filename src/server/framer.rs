use crate::server::error::ReadError;
use std::io;
use std::time::{Duration, Instant};
use tokio::io::Interest;
use tokio::net::TcpStream;
use tokio::time;

/// Read one CRLF-terminated line from the connection.
///
/// Bytes are consumed one at a time into an accumulation buffer while
/// tracking the previous byte; when CR then LF is seen at the tail, the
/// bytes before the delimiter are returned as text and the delimiter is
/// discarded. The wait for data is a bounded-interval poll rather than an
/// open-ended blocking read so the idle-timeout check stays live:
/// `poll_interval` is the single tunable every session shares, trading CPU
/// against latency.
///
/// Fails with [`ReadError::Timeout`] when no byte arrives within
/// `idle_timeout` of the previous one, [`ReadError::LineTooLong`] when the
/// buffer outgrows `max_length` before the delimiter appears, and
/// [`ReadError::ConnectionLost`] on peer close or a transport-shaped I/O
/// fault. Anything else is tagged [`ReadError::Unknown`]; already-tagged
/// failures propagate unchanged.
pub async fn read_line(
    stream: &TcpStream,
    max_length: usize,
    idle_timeout: Duration,
    poll_interval: Duration,
) -> Result<String, ReadError> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut prev_byte: u8 = 0;
    let mut last_data = Instant::now();

    loop {
        let mut byte = [0u8; 1];
        match stream.try_read(&mut byte) {
            Ok(0) => return Err(ReadError::ConnectionLost),
            Ok(_) => {
                buffer.push(byte[0]);

                if prev_byte == b'\r' && byte[0] == b'\n' {
                    buffer.truncate(buffer.len() - 2);
                    return Ok(String::from_utf8_lossy(&buffer).into_owned());
                }

                prev_byte = byte[0];

                if buffer.len() > max_length {
                    return Err(ReadError::LineTooLong(max_length));
                }

                last_data = Instant::now();
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                if last_data.elapsed() > idle_timeout {
                    return Err(ReadError::Timeout(idle_timeout.as_millis() as u64));
                }

                // Wait for readability, but never longer than one poll
                // interval so the timeout check above keeps running.
                match time::timeout(poll_interval, stream.ready(Interest::READABLE)).await {
                    Ok(Ok(_)) | Err(_) => {}
                    Ok(Err(e)) => return Err(classify_io_error(e)),
                }
            }
            Err(e) => return Err(classify_io_error(e)),
        }
    }
}

/// Map an I/O fault to the read-failure taxonomy: transport-shaped kinds
/// mean the peer is gone, everything else is an unknown failure.
fn classify_io_error(e: io::Error) -> ReadError {
    match e.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::NotConnected => ReadError::ConnectionLost,
        _ => ReadError::Unknown(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    const POLL: Duration = Duration::from_millis(10);
    const IDLE: Duration = Duration::from_millis(200);

    async fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn test_reads_one_line_and_strips_crlf() {
        let (mut client, server) = tcp_pair().await;
        client.write_all(b"USER bob\r\n").await.unwrap();

        let line = read_line(&server, 512, IDLE, POLL).await.unwrap();
        assert_eq!(line, "USER bob");
    }

    #[tokio::test]
    async fn test_second_read_starts_at_next_byte() {
        let (mut client, server) = tcp_pair().await;
        client.write_all(b"USER bob\r\nPASS secret\r\n").await.unwrap();

        assert_eq!(read_line(&server, 512, IDLE, POLL).await.unwrap(), "USER bob");
        assert_eq!(
            read_line(&server, 512, IDLE, POLL).await.unwrap(),
            "PASS secret"
        );
    }

    #[tokio::test]
    async fn test_delimiter_split_across_writes() {
        let (mut client, server) = tcp_pair().await;

        let reader = tokio::spawn(async move {
            read_line(&server, 512, IDLE, POLL).await
        });

        client.write_all(b"NOOP\r").await.unwrap();
        client.flush().await.unwrap();
        time::sleep(Duration::from_millis(30)).await;
        client.write_all(b"\n").await.unwrap();

        assert_eq!(reader.await.unwrap().unwrap(), "NOOP");
    }

    #[tokio::test]
    async fn test_bare_lf_does_not_terminate() {
        let (mut client, server) = tcp_pair().await;
        client.write_all(b"abc\ndef\r\n").await.unwrap();

        let line = read_line(&server, 512, IDLE, POLL).await.unwrap();
        assert_eq!(line, "abc\ndef");
    }

    #[tokio::test]
    async fn test_overlong_line_fails_with_length_exceeded() {
        let (mut client, server) = tcp_pair().await;
        client.write_all(&[b'a'; 64]).await.unwrap();

        let err = read_line(&server, 16, IDLE, POLL).await.unwrap_err();
        assert!(matches!(err, ReadError::LineTooLong(16)));
    }

    #[tokio::test]
    async fn test_no_data_times_out() {
        let (_client, server) = tcp_pair().await;

        let err = read_line(&server, 512, Duration::from_millis(50), POLL)
            .await
            .unwrap_err();
        assert!(matches!(err, ReadError::Timeout(50)));
    }

    #[tokio::test]
    async fn test_peer_close_is_connection_lost() {
        let (client, server) = tcp_pair().await;
        drop(client);

        let err = read_line(&server, 512, IDLE, POLL).await.unwrap_err();
        assert!(matches!(err, ReadError::ConnectionLost));
    }
}
