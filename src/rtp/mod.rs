pub mod header;
pub mod nal;

pub use header::RtpPacket;
pub use nal::{NalReassembler, OutputFrame};
