use super::{drive_handshake, process_items, InterleavedDemux, MAX_BUFFER_LEN};
use crate::error::{ClientError, Result};
use crate::keepalive::KeepAlive;
use crate::queue::FrameSender;
use crate::rtp::NalReassembler;
use crate::rtsp::RtspSession;
use log::{info, warn};
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

/// Run the TCP-interleaved transport: one socket, one task, owning both
/// the RTSP control exchange and the demultiplexed RTP stream (spec.md
/// §4.5/§5). Reports handshake success/failure via `ready_tx`, then keeps
/// reading until the socket closes or an RTSP error occurs.
pub async fn run(
    addr: SocketAddr,
    mut session: RtspSession,
    frame_tx: FrameSender,
    ready_tx: oneshot::Sender<Result<bool>>,
) {
    let mut stream = match TcpStream::connect(addr).await {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(ClientError::ConnectFailed {
                addr: addr.to_string(),
                source: e,
            }));
            return;
        }
    };

    let leftover = match drive_handshake(&mut stream, &mut session).await {
        Ok(buf) => buf,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let _ = ready_tx.send(Ok(true));

    let mut demux = InterleavedDemux::new();
    let mut reassembler = NalReassembler::new();
    let mut keepalive = KeepAlive::new(session.session_timeout_secs).await;

    if !process_items(
        demux.feed(&leftover),
        &mut session,
        &mut stream,
        &mut reassembler,
        &frame_tx,
    )
    .await
    {
        return;
    }

    let mut buf = [0u8; MAX_BUFFER_LEN];
    loop {
        tokio::select! {
            _ = keepalive.tick() => {
                let req = session.build_get_parameter();
                use tokio::io::AsyncWriteExt;
                if stream.write_all(req.as_bytes()).await.is_err() {
                    warn!("keep-alive write failed, closing session");
                    break;
                }
            }
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        info!("RTSP/RTP TCP socket closed by peer");
                        break;
                    }
                    Ok(n) => {
                        let items = demux.feed(&buf[..n]);
                        if !process_items(items, &mut session, &mut stream, &mut reassembler, &frame_tx).await {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("socket read error: {e}");
                        break;
                    }
                }
            }
        }
    }
}
