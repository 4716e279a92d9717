use rtsp_rtp_client::{Client, Protocol};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read one RTSP request off `stream`: these requests never carry a
/// body, so the blank-line terminator alone delimits them.
async fn read_request(stream: &mut TcpStream, buf: &mut Vec<u8>) -> String {
    loop {
        if let Some(pos) = find_blank_line(buf) {
            let request = String::from_utf8_lossy(&buf[..pos + 4]).to_string();
            buf.drain(..pos + 4);
            return request;
        }
        let mut tmp = [0u8; 4096];
        let n = stream.read(&mut tmp).await.unwrap();
        assert!(n > 0, "peer closed before a full request arrived");
        buf.extend_from_slice(&tmp[..n]);
    }
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn cseq_of(request: &str) -> &str {
    request
        .lines()
        .find_map(|l| l.strip_prefix("CSeq: "))
        .unwrap()
        .trim()
}

#[tokio::test]
async fn full_handshake_then_one_idr_frame_over_interleaved_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("rtsp://{}/stream1", addr);

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();

        let options = read_request(&mut stream, &mut buf).await;
        assert!(options.starts_with("OPTIONS"));
        assert_eq!(cseq_of(&options), "1");
        stream
            .write_all(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n")
            .await
            .unwrap();

        let describe = read_request(&mut stream, &mut buf).await;
        assert!(describe.starts_with("DESCRIBE"));
        let sdp = "v=0\r\no=- 0 0 IN IP4 0.0.0.0\r\n";
        let reply = format!(
            "RTSP/1.0 200 OK\r\nCSeq: 2\r\nContent-Length: {}\r\n\r\n{}",
            sdp.len(),
            sdp
        );
        stream.write_all(reply.as_bytes()).await.unwrap();

        let setup = read_request(&mut stream, &mut buf).await;
        assert!(setup.starts_with("SETUP"));
        assert!(setup.contains("interleaved=0-1"));
        stream
            .write_all(b"RTSP/1.0 200 OK\r\nCSeq: 3\r\nSession: 42;timeout=60\r\n\r\n")
            .await
            .unwrap();

        let play = read_request(&mut stream, &mut buf).await;
        assert!(play.starts_with("PLAY"));
        assert!(play.contains("Session: 42"));

        // PLAY's 200 OK and the first interleaved RTP frame arrive in the
        // same write, exercising the no-cross-contamination framing fix.
        let mut combined = b"RTSP/1.0 200 OK\r\nCSeq: 5\r\n\r\n".to_vec();
        // FU-A start fragment of an IDR (NAL type 5), same bytes as the
        // spec's S4 scenario.
        let rtp_payload: Vec<u8> = {
            let mut header = vec![0u8; 12];
            header[0] = 0x80; // V=2
            header[1] = 96;
            header.extend_from_slice(&[0x7C, 0x85, 0xDE, 0xAD]);
            header
        };
        combined.push(0x24);
        combined.push(0x00);
        combined.extend_from_slice(&(rtp_payload.len() as u16).to_be_bytes());
        combined.extend_from_slice(&rtp_payload);
        stream.write_all(&combined).await.unwrap();

        // Keep the connection open until the client disconnects.
        let mut sink = [0u8; 64];
        loop {
            match stream.read(&mut sink).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let mut client = Client::new(Protocol::Tcp, &url).unwrap();
    let ok = tokio::time::timeout(std::time::Duration::from_secs(5), client.connect())
        .await
        .expect("connect timed out")
        .unwrap();
    assert!(ok, "expected Playing to be reached");

    let frame = tokio::time::timeout(std::time::Duration::from_secs(5), client.read_frame())
        .await
        .expect("read_frame timed out")
        .expect("expected a frame, got stream end");

    assert_eq!(frame.0, vec![0, 0, 0, 1, 0x65, 0xDE, 0xAD]);

    client.disconnect();
    server.abort();
}

#[tokio::test]
async fn non_200_options_reply_fails_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("rtsp://{}/stream1", addr);

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let _options = read_request(&mut stream, &mut buf).await;
        stream
            .write_all(b"RTSP/1.0 404 Not Found\r\nCSeq: 1\r\n\r\n")
            .await
            .unwrap();
    });

    let mut client = Client::new(Protocol::Tcp, &url).unwrap();
    let ok = tokio::time::timeout(std::time::Duration::from_secs(5), client.connect())
        .await
        .expect("connect timed out")
        .unwrap();
    assert!(!ok);

    server.await.unwrap();
}

#[tokio::test]
async fn malformed_url_fails_construction() {
    assert!(Client::new(Protocol::Tcp, "not a url").is_err());
}
