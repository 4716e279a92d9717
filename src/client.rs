use crate::queue::{self, FrameReceiver};
use crate::rtsp::{RtspSession, TransportKind};
use crate::transport;
use crate::url::RtspUrl;
use log::warn;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Which wire transport carries RTP for this connection (spec.md §1/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// RTP/RTCP interleaved into the RTSP TCP session.
    Tcp,
    /// RTP/RTCP carried over their own UDP sockets.
    Udp,
}

const DEFAULT_CLIENT_RTP_PORT: u16 = 61234;
const DEFAULT_CLIENT_RTCP_PORT: u16 = 61235;

/// Public facade (spec.md §4.6 / C6): `connect`, `read_frame`,
/// `disconnect`. Bridges the reader task(s) to the consumer through a
/// bounded frame queue.
pub struct Client {
    protocol: Protocol,
    url: RtspUrl,
    client_rtp_port: u16,
    client_rtcp_port: u16,
    frame_rx: Option<FrameReceiver>,
    control_task: Option<JoinHandle<()>>,
    rtp_task: Option<JoinHandle<()>>,
    /// UDP mode's RTCP socket: bound and held open for the life of the
    /// session but never read (spec.md §4.5). Dropped on disconnect.
    rtcp_socket: Option<UdpSocket>,
}

impl Client {
    /// Parse `url` and prepare a client for the given transport. A
    /// malformed URL fails construction without opening any socket
    /// (spec.md §7).
    pub fn new(protocol: Protocol, url: &str) -> anyhow::Result<Self> {
        let url = RtspUrl::parse(url)?;
        Ok(Client {
            protocol,
            url,
            client_rtp_port: DEFAULT_CLIENT_RTP_PORT,
            client_rtcp_port: DEFAULT_CLIENT_RTCP_PORT,
            frame_rx: None,
            control_task: None,
            rtp_task: None,
            rtcp_socket: None,
        })
    }

    /// Override the local UDP ports advertised in `SETUP`'s
    /// `client_port=` range (default 61234-61235, spec.md §4.5). Ignored
    /// in TCP-interleaved mode.
    pub fn with_client_ports(mut self, rtp_port: u16, rtcp_port: u16) -> Self {
        self.client_rtp_port = rtp_port;
        self.client_rtcp_port = rtcp_port;
        self
    }

    /// Open sockets and run the RTSP handshake to completion. Returns
    /// `Ok(true)` once the Playing state is reached, `Ok(false)` if the
    /// connection or handshake failed (spec.md §4.6's facade contract).
    pub async fn connect(&mut self) -> anyhow::Result<bool> {
        let addr = self.url.resolve().await?;
        let (frame_tx, frame_rx) = queue::bounded(queue::DEFAULT_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();

        match self.protocol {
            Protocol::Tcp => {
                let session = RtspSession::new(
                    self.url.clone(),
                    TransportKind::TcpInterleaved {
                        channel_video: 0,
                        channel_rtcp: 1,
                    },
                );
                self.control_task = Some(tokio::spawn(transport::tcp::run(
                    addr, session, frame_tx, ready_tx,
                )));
            }
            Protocol::Udp => {
                let (rtp_socket, rtcp_socket) =
                    transport::udp::bind_sockets(self.client_rtp_port, self.client_rtcp_port)?;
                self.rtcp_socket = Some(rtcp_socket);
                self.rtp_task = Some(tokio::spawn(transport::udp::run_rtp_reader(
                    rtp_socket,
                    frame_tx,
                )));

                let session = RtspSession::new(
                    self.url.clone(),
                    TransportKind::Udp {
                        rtp_port: self.client_rtp_port,
                        rtcp_port: self.client_rtcp_port,
                    },
                );
                self.control_task = Some(tokio::spawn(transport::udp::run_control(
                    addr, session, ready_tx,
                )));
            }
        }

        self.frame_rx = Some(frame_rx);

        match ready_rx.await {
            Ok(Ok(ready)) => Ok(ready),
            Ok(Err(e)) => {
                warn!("connect failed: {e}");
                Ok(false)
            }
            Err(_) => {
                warn!("control task ended before reporting handshake result");
                Ok(false)
            }
        }
    }

    /// Block until a frame is available. Returns `None` once the session
    /// has closed and no further frames will arrive (spec.md §5's "poison
    /// sentinel" — here, the closed channel itself).
    pub async fn read_frame(&mut self) -> Option<(Vec<u8>, Vec<u32>)> {
        let rx = self.frame_rx.as_mut()?;
        rx.recv().await.map(|frame| (frame.bytes, frame.extension_words))
    }

    /// Close all sockets. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(handle) = self.control_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.rtp_task.take() {
            handle.abort();
        }
        self.frame_rx = None;
        self.rtcp_socket = None;
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}
