use thiserror::Error;

/// Every failure mode the client can produce, matching the RTSP/RTP error
/// table this crate is built against: URL parsing, connection setup, the
/// RTSP handshake, and packet-level decode failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("malformed RTSP url {url:?}: {detail}")]
    UrlMalformed { url: String, detail: String },

    #[error("failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("RTSP {method} (CSeq {cseq}) did not return 200 OK: {status}")]
    RtspNonOk {
        method: &'static str,
        cseq: u32,
        status: String,
    },

    #[error("failed to parse RTSP reply: {detail}")]
    RtspParseError { detail: String },

    #[error("malformed RTP packet: {detail}")]
    RtpMalformed { detail: String },

    #[error("socket closed by peer")]
    SocketClosed,
}

pub type Result<T> = std::result::Result<T, ClientError>;
