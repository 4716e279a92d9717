//! RTSP control client coupled to an RTP depacketizer for H.264 video
//! streaming. Speaks the OPTIONS/DESCRIBE/SETUP/PLAY handshake, then
//! demultiplexes either an interleaved TCP byte stream or a dedicated UDP
//! pair into Annex-B H.264 access-unit fragments delivered through a
//! bounded frame queue.
//!
//! ```no_run
//! use rtsp_rtp_client::{Client, Protocol};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut client = Client::new(Protocol::Tcp, "rtsp://camera.local:554/stream1")?;
//! if client.connect().await? {
//!     while let Some((nal_bytes, extension_words)) = client.read_frame().await {
//!         let _ = (nal_bytes, extension_words);
//!     }
//! }
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod keepalive;
pub mod queue;
pub mod rtp;
pub mod rtsp;
pub mod transport;
pub mod url;

pub use client::{Client, Protocol};
pub use error::ClientError;
pub use rtp::{NalReassembler, OutputFrame, RtpPacket};
pub use rtsp::{RtspSession, State as RtspState, TransportKind};
