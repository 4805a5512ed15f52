//! Decoder for libpcap capture files. Every record becomes a `DecodedPacket` describing its link,
//! network and transport layers, and the packets of a capture can be summarized as `Statistics`.

pub mod analysis;
pub mod common;
pub mod errors;
pub mod file;
pub mod filter;
pub mod global_header;
pub mod layer2;
pub mod layer3;
pub mod layer4;
pub mod nom_error;
pub mod packet;
pub mod record;
pub mod statistics;

pub use errors::Error;
pub use file::CaptureFile;
pub use global_header::GlobalHeader;
pub use packet::{DecodedPacket, FrameResult, PacketBuilder};
pub use statistics::Statistics;

use log::*;
use thiserror::Error as ThisError;

use std::io::Read;
use std::path::Path;

///
/// All packets of a capture that was read to the end
///
#[derive(Clone, Debug)]
pub struct DecodedCapture {
    header: GlobalHeader,
    packets: Vec<DecodedPacket>,
}

impl DecodedCapture {
    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }
    pub fn packets(&self) -> &[DecodedPacket] {
        &self.packets
    }
    pub fn into_packets(self) -> Vec<DecodedPacket> {
        self.packets
    }
    pub fn statistics(&self) -> Statistics {
        Statistics::from_packets(&self.packets)
    }
}

///
/// A capture that stopped on a fatal error. The packets decoded before the failure are kept, the
/// header is missing when the capture could not be opened.
///
#[derive(Debug, ThisError)]
#[error("Capture stopped after {decoded} packets: {error}")]
pub struct PartialCapture {
    pub header: Option<GlobalHeader>,
    pub packets: Vec<DecodedPacket>,
    pub decoded: usize,
    #[source]
    pub error: Error,
}

impl PartialCapture {
    fn new(header: Option<GlobalHeader>, packets: Vec<DecodedPacket>, error: Error) -> PartialCapture {
        PartialCapture {
            header: header,
            decoded: packets.len(),
            packets: packets,
            error: error
        }
    }
}

///
/// Drives a `CaptureFile` through a `PacketBuilder`, producing one packet per record
///
pub struct CaptureParser;

impl CaptureParser {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<DecodedCapture, PartialCapture> {
        let capture = CaptureFile::open(path).map_err(|e| PartialCapture::new(None, vec![], e))?;

        CaptureParser::parse_capture(capture)
    }

    pub fn parse_reader<R: Read>(reader: R) -> Result<DecodedCapture, PartialCapture> {
        let capture = CaptureFile::new(reader).map_err(|e| PartialCapture::new(None, vec![], e))?;

        CaptureParser::parse_capture(capture)
    }

    fn parse_capture<R: Read>(capture: CaptureFile<R>) -> Result<DecodedCapture, PartialCapture> {
        let header = capture.global_header().clone();

        debug!(
            "Capture version {}.{}, link type {}, snap length {}",
            header.version_major(),
            header.version_minor(),
            header.link_type(),
            header.snap_length()
        );

        let mut builder = PacketBuilder::new(header.link_type());
        let mut packets = vec![];
        let mut diagnostics = 0usize;

        for record in capture {
            match record {
                Ok(r) => {
                    let res = builder.build(&r);
                    if res.is_diagnostic() {
                        diagnostics += 1;
                    }
                    packets.push(res.into_packet());
                }
                Err(e) => {
                    #[cfg(not(feature = "log-errors"))]
                    warn!("Capture stopped after {} records: {}", packets.len(), e);
                    #[cfg(feature = "log-errors")]
                    error!("Capture stopped after {} records: {}", packets.len(), e);

                    return Err(PartialCapture::new(Some(header), packets, e));
                }
            }
        }

        debug!("Decoded {} packets, {} diagnostics", packets.len(), diagnostics);

        Ok(DecodedCapture {
            header: header,
            packets: packets
        })
    }
}
