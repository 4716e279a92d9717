use crate::error::{ClientError, Result};
use bytes::Bytes;

/// A decoded RTP packet header plus a zero-copy view of the payload
/// (RFC 3550 §5.1, with the optional extension header of §5.3.1).
#[derive(Debug, Clone)]
pub struct RtpPacket {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub csrc_count: u8,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc_ids: Vec<u32>,
    /// Extension words surfaced verbatim; empty when no extension header
    /// is present.
    pub extension_words: Vec<u32>,
    pub payload: Bytes,
}

const FIXED_HEADER_LEN: usize = 12;

impl RtpPacket {
    /// Decode a complete RTP packet: one UDP datagram, or one interleaved
    /// frame body (spec.md §4.1).
    pub fn decode(packet: Bytes) -> Result<Self> {
        if packet.len() < FIXED_HEADER_LEN {
            return Err(ClientError::RtpMalformed {
                detail: format!("packet too short: {} bytes", packet.len()),
            });
        }

        let b0 = packet[0];
        let b1 = packet[1];

        let version = (b0 >> 6) & 0x03;
        let padding = (b0 >> 5) & 0x01 == 1;
        let extension = (b0 >> 4) & 0x01 == 1;
        let csrc_count = b0 & 0x0F;
        let marker = (b1 >> 7) & 0x01 == 1;
        let payload_type = b1 & 0x7F;

        let sequence = u16::from_be_bytes([packet[2], packet[3]]);
        let timestamp = u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]);
        let ssrc = u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]]);

        let mut offset = FIXED_HEADER_LEN;
        let csrc_needed = csrc_count as usize * 4;
        if packet.len() < offset + csrc_needed {
            return Err(ClientError::RtpMalformed {
                detail: "truncated CSRC list".to_string(),
            });
        }

        let mut csrc_ids = Vec::with_capacity(csrc_count as usize);
        for i in 0..csrc_count as usize {
            let start = offset + i * 4;
            csrc_ids.push(u32::from_be_bytes([
                packet[start],
                packet[start + 1],
                packet[start + 2],
                packet[start + 3],
            ]));
        }
        offset += csrc_needed;

        let mut extension_words = Vec::new();
        if extension {
            if packet.len() < offset + 4 {
                return Err(ClientError::RtpMalformed {
                    detail: "truncated extension header".to_string(),
                });
            }
            // profile (2 bytes) is carried but not interpreted further.
            let _profile = u16::from_be_bytes([packet[offset], packet[offset + 1]]);
            let word_count =
                u16::from_be_bytes([packet[offset + 2], packet[offset + 3]]) as usize;
            offset += 4;

            let words_len = word_count * 4;
            if packet.len() < offset + words_len {
                return Err(ClientError::RtpMalformed {
                    detail: "truncated extension words".to_string(),
                });
            }
            extension_words.reserve(word_count);
            for i in 0..word_count {
                let start = offset + i * 4;
                extension_words.push(u32::from_be_bytes([
                    packet[start],
                    packet[start + 1],
                    packet[start + 2],
                    packet[start + 3],
                ]));
            }
            offset += words_len;
        }

        let payload = packet.slice(offset..);

        Ok(RtpPacket {
            version,
            padding,
            extension,
            csrc_count,
            marker,
            payload_type,
            sequence,
            timestamp,
            ssrc,
            csrc_ids,
            extension_words,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_header(extension: bool, csrc_count: u8) -> Vec<u8> {
        let mut v = vec![0u8; 12];
        v[0] = (2 << 6) | ((extension as u8) << 4) | csrc_count;
        v[1] = 96; // marker=0, PT=96
        v[2..4].copy_from_slice(&1u16.to_be_bytes());
        v[4..8].copy_from_slice(&1000u32.to_be_bytes());
        v[8..12].copy_from_slice(&0xABCDu32.to_be_bytes());
        v
    }

    #[test]
    fn decodes_fixed_header_and_payload() {
        let mut raw = base_header(false, 0);
        raw.extend_from_slice(&[0x41, 0xAA, 0xBB]);
        let pkt = RtpPacket::decode(Bytes::from(raw)).unwrap();
        assert_eq!(pkt.version, 2);
        assert_eq!(pkt.sequence, 1);
        assert_eq!(pkt.timestamp, 1000);
        assert_eq!(pkt.ssrc, 0xABCD);
        assert_eq!(&pkt.payload[..], &[0x41, 0xAA, 0xBB]);
        assert!(pkt.extension_words.is_empty());
    }

    #[test]
    fn decodes_extension_words() {
        let mut raw = base_header(true, 0);
        raw.extend_from_slice(&0u16.to_be_bytes()); // profile
        raw.extend_from_slice(&2u16.to_be_bytes()); // 2 words
        raw.extend_from_slice(&111u32.to_be_bytes());
        raw.extend_from_slice(&222u32.to_be_bytes());
        raw.extend_from_slice(&[0x65, 0x01]);
        let pkt = RtpPacket::decode(Bytes::from(raw)).unwrap();
        assert_eq!(pkt.extension_words, vec![111, 222]);
        assert_eq!(&pkt.payload[..], &[0x65, 0x01]);
    }

    #[test]
    fn decodes_csrc_list() {
        let mut raw = base_header(false, 2);
        raw.extend_from_slice(&1u32.to_be_bytes());
        raw.extend_from_slice(&2u32.to_be_bytes());
        raw.push(0x41);
        let pkt = RtpPacket::decode(Bytes::from(raw)).unwrap();
        assert_eq!(pkt.csrc_ids, vec![1, 2]);
    }

    #[test]
    fn rejects_truncated_packet() {
        let raw = vec![0u8; 4];
        assert!(RtpPacket::decode(Bytes::from(raw)).is_err());
    }
}
