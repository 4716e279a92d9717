pub mod demux;
pub mod tcp;
pub mod udp;

pub use demux::{DemuxItem, InterleavedDemux};

use crate::error::{ClientError, Result};
use crate::queue::FrameSender;
use crate::rtp::{NalReassembler, RtpPacket};
use crate::rtsp::{framed_reply_len, RtspSession, State};
use bytes::BytesMut;
use log::warn;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Minimum read-buffer size for control/interleaved sockets (spec.md §4.5).
pub(crate) const MAX_BUFFER_LEN: usize = 10240;

async fn write_request(stream: &mut TcpStream, req: &str) -> Result<()> {
    stream
        .write_all(req.as_bytes())
        .await
        .map_err(|e| ClientError::RtspParseError {
            detail: format!("write failed: {e}"),
        })
}

/// Drive the RTSP handshake (OPTIONS → DESCRIBE → SETUP → PLAY) over an
/// already-connected control socket, writing each request from within
/// the reply handler (spec.md §4.4, §9 single-owner rule). Returns any
/// bytes read past the last consumed reply — in TCP-interleaved mode
/// this may already contain the start of the RTP stream.
pub(crate) async fn drive_handshake(stream: &mut TcpStream, session: &mut RtspSession) -> Result<BytesMut> {
    let mut buf = BytesMut::with_capacity(MAX_BUFFER_LEN);
    let first = session.start();
    write_request(stream, &first).await?;

    loop {
        while let Some(n) = framed_reply_len(&buf) {
            let chunk = buf.split_to(n);
            let text = String::from_utf8_lossy(&chunk).to_string();
            if let Some(next) = session.on_reply(&text)? {
                write_request(stream, &next).await?;
            }
            if session.state == State::Playing {
                return Ok(buf);
            }
        }

        let mut tmp = [0u8; MAX_BUFFER_LEN];
        let n = stream.read(&mut tmp).await.map_err(|e| ClientError::RtspParseError {
            detail: format!("socket error during handshake: {e}"),
        })?;
        if n == 0 {
            return Err(ClientError::SocketClosed);
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}

/// Apply a batch of demultiplexed items: RTSP text advances the control
/// state machine (and writes the next request, if any); RTP binary is
/// decoded and reassembled onto the frame queue. Returns `false` when the
/// caller should stop reading (fatal RTSP error, closed queue, write
/// failure).
pub(crate) async fn process_items(
    items: Vec<DemuxItem>,
    session: &mut RtspSession,
    stream: &mut TcpStream,
    reassembler: &mut NalReassembler,
    frame_tx: &FrameSender,
) -> bool {
    for item in items {
        match item {
            DemuxItem::Rtsp(text) => match session.on_reply(&text) {
                Ok(Some(next)) => {
                    if write_request(stream, &next).await.is_err() {
                        return false;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("RTSP control error: {e}");
                    return false;
                }
            },
            DemuxItem::Rtp(bytes) => {
                decode_and_forward(bytes, reassembler, frame_tx).await;
            }
        }
    }
    true
}

/// Like [`process_items`] but for a control-only connection (UDP mode's
/// RTSP TCP socket) that never carries `$`-framed RTP: an `Rtp` item here
/// would indicate a misbehaving peer, so it's logged and dropped rather
/// than silently decoded.
pub(crate) async fn process_control_items(
    items: Vec<DemuxItem>,
    session: &mut RtspSession,
    stream: &mut TcpStream,
) -> bool {
    for item in items {
        match item {
            DemuxItem::Rtsp(text) => match session.on_reply(&text) {
                Ok(Some(next)) => {
                    if write_request(stream, &next).await.is_err() {
                        return false;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("RTSP control error: {e}");
                    return false;
                }
            },
            DemuxItem::Rtp(_) => {
                warn!("unexpected binary frame on UDP control connection, dropping");
            }
        }
    }
    true
}

pub(crate) async fn decode_and_forward(
    bytes: bytes::Bytes,
    reassembler: &mut NalReassembler,
    frame_tx: &FrameSender,
) -> bool {
    match RtpPacket::decode(bytes) {
        Ok(pkt) => {
            for frame in reassembler.process(&pkt) {
                if frame_tx.send(frame).await.is_err() {
                    return false;
                }
            }
        }
        Err(e) => warn!("dropping malformed RTP packet: {e}"),
    }
    true
}
