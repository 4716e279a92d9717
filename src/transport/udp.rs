use super::{
    decode_and_forward, drive_handshake, process_control_items, InterleavedDemux, MAX_BUFFER_LEN,
};
use crate::error::{ClientError, Result};
use crate::keepalive::KeepAlive;
use crate::queue::FrameSender;
use crate::rtp::NalReassembler;
use crate::rtsp::RtspSession;
use log::{info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::oneshot;

fn bind_error(port: u16, source: std::io::Error) -> ClientError {
    ClientError::ConnectFailed {
        addr: format!("0.0.0.0:{port}"),
        source,
    }
}

/// Bind the RTP datagram socket (`SO_REUSEADDR`, ≥1 MiB receive buffer —
/// spec.md §4.5) and the RTCP socket, which is opened but never read.
pub fn bind_sockets(rtp_port: u16, rtcp_port: u16) -> Result<(UdpSocket, UdpSocket)> {
    let rtp = bind_one(rtp_port, 1024 * 1024)?;
    let rtcp = bind_one(rtcp_port, 0)?;
    Ok((rtp, rtcp))
}

fn bind_one(port: u16, recv_buffer: usize) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| bind_error(port, e))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| bind_error(port, e))?;
    if recv_buffer > 0 {
        socket
            .set_recv_buffer_size(recv_buffer)
            .map_err(|e| bind_error(port, e))?;
    }
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    socket.bind(&addr.into()).map_err(|e| bind_error(port, e))?;
    socket.set_nonblocking(true).map_err(|e| bind_error(port, e))?;
    UdpSocket::from_std(socket.into()).map_err(|e| bind_error(port, e))
}

/// Read RTP datagrams off the dedicated UDP socket: each datagram is one
/// complete RTP packet (spec.md §4.5), decoded and reassembled straight
/// onto the frame queue.
pub async fn run_rtp_reader(socket: UdpSocket, frame_tx: FrameSender) {
    let mut reassembler = NalReassembler::new();
    let mut buf = [0u8; 2048];
    loop {
        match socket.recv(&mut buf).await {
            Ok(n) => {
                let bytes = bytes::Bytes::copy_from_slice(&buf[..n]);
                if !decode_and_forward(bytes, &mut reassembler, &frame_tx).await {
                    break;
                }
            }
            Err(e) => {
                warn!("RTP datagram socket error: {e}");
                break;
            }
        }
    }
}

/// Run the UDP mode's RTSP control connection: a plain (non-interleaved)
/// TCP socket carrying only text replies, plus the keep-alive timer.
pub async fn run_control(
    addr: SocketAddr,
    mut session: RtspSession,
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
    let mut keepalive = KeepAlive::new(session.session_timeout_secs).await;

    if !process_control_items(demux.feed(&leftover), &mut session, &mut stream).await {
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
                        info!("RTSP control socket closed by peer");
                        break;
                    }
                    Ok(n) => {
                        let items = demux.feed(&buf[..n]);
                        if !process_control_items(items, &mut session, &mut stream).await {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("control socket read error: {e}");
                        break;
                    }
                }
            }
        }
    }
}
