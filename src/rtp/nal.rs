use super::header::RtpPacket;
use log::{debug, trace, warn};

const ANNEXB_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

const NAL_TYPE_SEI: u8 = 6;
const NAL_TYPE_SPS: u8 = 7;
const NAL_TYPE_PPS: u8 = 8;
const NAL_TYPE_IDR: u8 = 5;
const FRAGMENT_TYPE_FUA: u8 = 28;
const SINGLE_NAL_MAX: u8 = 23;

/// An Annex-B-prefixed NAL slice, with the header-extension words that
/// accompanied the RTP packet that started the access unit (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    pub bytes: Vec<u8>,
    pub extension_words: Vec<u32>,
}

impl OutputFrame {
    fn annexb(payload: &[u8], extension_words: Vec<u32>) -> Self {
        let mut bytes = Vec::with_capacity(ANNEXB_START_CODE.len() + payload.len());
        bytes.extend_from_slice(&ANNEXB_START_CODE);
        bytes.extend_from_slice(payload);
        OutputFrame {
            bytes,
            extension_words,
        }
    }
}

/// Reassembles H.264 NAL units from RTP payloads (single-NAL and FU-A
/// fragments, RFC 6184), gated on the first IDR fragment seen (spec.md
/// §4.2). SPS/PPS single-NAL packets observed before the latch are cached
/// rather than dropped and flushed just ahead of the IDR that sets the
/// latch (spec.md §9 Open Question 2).
#[derive(Debug, Default)]
pub struct NalReassembler {
    idr_seen: bool,
    cached_sps: Option<Vec<u8>>,
    cached_pps: Option<Vec<u8>>,
}

impl NalReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idr_seen(&self) -> bool {
        self.idr_seen
    }

    /// Process one RTP packet's payload, returning zero or more frames to
    /// place on the output queue in order.
    pub fn process(&mut self, pkt: &RtpPacket) -> Vec<OutputFrame> {
        let payload = &pkt.payload;
        if payload.is_empty() {
            warn!("dropping RTP packet with empty payload (seq {})", pkt.sequence);
            return Vec::new();
        }

        let indicator = payload[0];
        let nal_type = indicator & 0x1F;

        if nal_type == FRAGMENT_TYPE_FUA {
            return self.process_fua(indicator, payload, &pkt.extension_words);
        }

        if nal_type >= 1 && nal_type <= SINGLE_NAL_MAX {
            return self.process_single_nal(nal_type, payload);
        }

        warn!(
            "dropping RTP packet with unsupported fragment type {} (seq {})",
            nal_type, pkt.sequence
        );
        Vec::new()
    }

    fn process_single_nal(&mut self, nal_type: u8, payload: &[u8]) -> Vec<OutputFrame> {
        if !self.idr_seen {
            match nal_type {
                NAL_TYPE_SPS => {
                    trace!("caching SPS ({} bytes)", payload.len());
                    self.cached_sps = Some(payload.to_vec());
                    return Vec::new();
                }
                NAL_TYPE_PPS => {
                    trace!("caching PPS ({} bytes)", payload.len());
                    self.cached_pps = Some(payload.to_vec());
                    return Vec::new();
                }
                _ => return Vec::new(),
            }
        }

        if nal_type == NAL_TYPE_SEI {
            debug!("passthrough SEI unit ({} bytes)", payload.len());
        }
        vec![OutputFrame::annexb(payload, Vec::new())]
    }

    fn process_fua(
        &mut self,
        indicator: u8,
        payload: &[u8],
        extension_words: &[u32],
    ) -> Vec<OutputFrame> {
        if payload.len() < 2 {
            warn!("dropping truncated FU-A fragment");
            return Vec::new();
        }

        let fu_header = payload[1];
        let start = fu_header & 0x80 != 0;
        let fu_nal_type = fu_header & 0x1F;

        let was_idr_seen = self.idr_seen;
        if fu_nal_type == NAL_TYPE_IDR {
            self.idr_seen = true;
        }

        if !self.idr_seen {
            return Vec::new();
        }

        let mut out = Vec::new();

        if !was_idr_seen {
            if let Some(sps) = self.cached_sps.take() {
                out.push(OutputFrame::annexb(&sps, Vec::new()));
            }
            if let Some(pps) = self.cached_pps.take() {
                out.push(OutputFrame::annexb(&pps, Vec::new()));
            }
        }

        if start {
            let reconstructed_header = (indicator & 0xE0) | fu_nal_type;
            let mut bytes = Vec::with_capacity(ANNEXB_START_CODE.len() + 1 + payload.len() - 2);
            bytes.extend_from_slice(&ANNEXB_START_CODE);
            bytes.push(reconstructed_header);
            bytes.extend_from_slice(&payload[2..]);
            out.push(OutputFrame {
                bytes,
                extension_words: extension_words.to_vec(),
            });
        } else {
            out.push(OutputFrame {
                bytes: payload[2..].to_vec(),
                extension_words: Vec::new(),
            });
        }

        out
    }
}
