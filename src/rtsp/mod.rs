pub mod reply;

pub use reply::{framed_reply_len, Reply};

use crate::error::{ClientError, Result};
use crate::url::RtspUrl;
use log::{info, warn};

const USER_AGENT: &str = "Lavf57.83.100";

pub const CSEQ_OPTIONS: u32 = 1;
pub const CSEQ_DESCRIBE: u32 = 2;
pub const CSEQ_SETUP_VIDEO: u32 = 3;
#[allow(dead_code)]
pub const CSEQ_SETUP_AUDIO: u32 = 4;
pub const CSEQ_PLAY: u32 = 5;

/// RTSP control state machine states (spec.md §3/§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Connecting,
    OptionsSent,
    DescribeSent,
    SetupVideoSent,
    /// Reserved: audio SETUP (CSeq 4) is never issued by this client.
    SetupAudioSent,
    Playing,
    Closed,
}

/// Which wire transport carries RTP/RTCP (spec.md §3 `transport`).
#[derive(Debug, Clone, Copy)]
pub enum TransportKind {
    TcpInterleaved { channel_video: u8, channel_rtcp: u8 },
    Udp { rtp_port: u16, rtcp_port: u16 },
}

impl TransportKind {
    fn header_line(&self) -> String {
        match self {
            TransportKind::TcpInterleaved {
                channel_video,
                channel_rtcp,
            } => format!(
                "Transport: RTP/AVP/TCP;unicast;interleaved={}-{}\r\n",
                channel_video, channel_rtcp
            ),
            TransportKind::Udp { rtp_port, rtcp_port } => format!(
                "Transport: RTP/AVP;unicast;client_port={}-{}\r\n",
                rtp_port, rtcp_port
            ),
        }
    }
}

fn state_method_name(state: State) -> &'static str {
    match state {
        State::OptionsSent => "OPTIONS",
        State::DescribeSent => "DESCRIBE",
        State::SetupVideoSent => "SETUP",
        State::Playing => "PLAY",
        _ => "UNKNOWN",
    }
}

/// RTSP control session: tracks state, session id/timeout, and builds the
/// next request from the prior reply (spec.md §4.4).
#[derive(Debug)]
pub struct RtspSession {
    pub url: RtspUrl,
    pub state: State,
    pub transport: TransportKind,
    pub session_id: Option<String>,
    pub session_timeout: Option<String>,
    pub session_timeout_secs: Option<u64>,
    pending_cseq: u32,
    next_cseq: u32,
}

impl RtspSession {
    pub fn new(url: RtspUrl, transport: TransportKind) -> Self {
        RtspSession {
            url,
            state: State::Connecting,
            transport,
            session_id: None,
            session_timeout: None,
            session_timeout_secs: None,
            pending_cseq: 0,
            next_cseq: CSEQ_PLAY + 1,
        }
    }

    /// Build the first request of the handshake (OPTIONS) and advance
    /// the state machine (spec.md §4.4: Connecting --send OPTIONS--> Options-Sent).
    pub fn start(&mut self) -> String {
        self.state = State::OptionsSent;
        self.pending_cseq = CSEQ_OPTIONS;
        format!(
            "OPTIONS {} RTSP/1.0\r\nCSeq: {}\r\nUser-Agent: {}\r\n\r\n",
            self.url.raw, CSEQ_OPTIONS, USER_AGENT
        )
    }

    fn build_describe(&self) -> String {
        format!(
            "DESCRIBE {} RTSP/1.0\r\nCSeq: {}\r\nUser-Agent: {}\r\n\r\n",
            self.url.raw, CSEQ_DESCRIBE, USER_AGENT
        )
    }

    fn build_setup_video(&self) -> String {
        format!(
            "SETUP {}/trackID=1 RTSP/1.0\r\n{}CSeq: {}\r\nUser-Agent: {}\r\nSession: {}\r\n\r\n",
            self.url.raw,
            self.transport.header_line(),
            CSEQ_SETUP_VIDEO,
            USER_AGENT,
            self.session_id.as_deref().unwrap_or(""),
        )
    }

    fn build_play(&self) -> String {
        format!(
            "PLAY {} RTSP/1.0\r\nRange: npt=0.000-\r\nCSeq: {}\r\nUser-Agent: {}\r\nSession: {}\r\n\r\n",
            self.url.raw,
            CSEQ_PLAY,
            USER_AGENT,
            self.session_id.as_deref().unwrap_or(""),
        )
    }

    /// Build a `GET_PARAMETER` keep-alive request (spec.md §9 Open
    /// Question 3 / SPEC_FULL.md §4.6a). Only valid once Playing.
    pub fn build_get_parameter(&mut self) -> String {
        let cseq = self.next_cseq;
        self.next_cseq += 1;
        self.pending_cseq = cseq;
        format!(
            "GET_PARAMETER {} RTSP/1.0\r\nCSeq: {}\r\nUser-Agent: {}\r\nSession: {}\r\n\r\n",
            self.url.raw,
            cseq,
            USER_AGENT,
            self.session_id.as_deref().unwrap_or(""),
        )
    }

    /// Feed one parsed reply to the state machine. Returns the next
    /// request to send, or `None` if no further request follows
    /// automatically (Playing reached, or a keep-alive reply handled).
    /// A non-200 reply, an unexpected CSeq, or a missing Session header
    /// on SETUP all transition to Closed (spec.md §7).
    pub fn on_reply(&mut self, raw: &str) -> Result<Option<String>> {
        let reply = Reply::parse(raw)?;

        if reply.is_announce {
            info!("ignoring server-initiated ANNOUNCE");
            return Ok(None);
        }

        let cseq = reply.cseq.ok_or_else(|| {
            self.state = State::Closed;
            ClientError::RtspParseError {
                detail: "reply missing CSeq".to_string(),
            }
        })?;

        if cseq != self.pending_cseq {
            self.state = State::Closed;
            return Err(ClientError::RtspParseError {
                detail: format!("unexpected CSeq {cseq}, expected {}", self.pending_cseq),
            });
        }

        if !reply.ok {
            let method = state_method_name(self.state);
            self.state = State::Closed;
            warn!("RTSP {method} (CSeq {cseq}) failed");
            return Err(ClientError::RtspNonOk {
                method,
                cseq,
                status: "non-200".to_string(),
            });
        }

        match self.state {
            State::OptionsSent => {
                self.state = State::DescribeSent;
                self.pending_cseq = CSEQ_DESCRIBE;
                Ok(Some(self.build_describe()))
            }
            State::DescribeSent => {
                if let Some(id) = &reply.session_id {
                    self.session_id = Some(id.clone());
                }
                self.state = State::SetupVideoSent;
                self.pending_cseq = CSEQ_SETUP_VIDEO;
                Ok(Some(self.build_setup_video()))
            }
            State::SetupVideoSent => {
                let id = reply.session_id.clone().ok_or_else(|| {
                    self.state = State::Closed;
                    ClientError::RtspParseError {
                        detail: "SETUP reply missing Session".to_string(),
                    }
                })?;
                self.session_id = Some(id);
                if let Some(t) = &reply.session_timeout {
                    self.session_timeout = Some(t.clone());
                    self.session_timeout_secs = t.parse().ok();
                }
                self.state = State::Playing;
                self.pending_cseq = CSEQ_PLAY;
                Ok(Some(self.build_play()))
            }
            State::Playing => {
                // Reply to a PLAY or a keep-alive GET_PARAMETER; stays Playing.
                Ok(None)
            }
            State::Idle | State::Connecting | State::SetupAudioSent | State::Closed => {
                self.state = State::Closed;
                Err(ClientError::RtspParseError {
                    detail: "reply received outside the handshake".to_string(),
                })
            }
        }
    }
}
