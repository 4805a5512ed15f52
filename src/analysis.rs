use crate::file::CaptureFile;
use crate::global_header::GlobalHeader;
use crate::packet::{DecodedPacket, PROTOCOL_ERROR};
use crate::statistics::Statistics;
use crate::CaptureParser;

use log::*;
use serde::Serialize;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

///
/// Everything known about one capture file: its packets, their statistics and the problems met
/// while reading it
///
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    path: PathBuf,
    analyzed_at: SystemTime,
    #[serde(skip)]
    header: Option<GlobalHeader>,
    packets: Vec<DecodedPacket>,
    statistics: Statistics,
    warnings: Vec<String>,
}

impl Analysis {
    pub fn path(&self) -> &Path { &self.path }
    pub fn analyzed_at(&self) -> SystemTime { self.analyzed_at }
    pub fn header(&self) -> Option<&GlobalHeader> { self.header.as_ref() }
    pub fn packets(&self) -> &[DecodedPacket] { &self.packets }
    pub fn statistics(&self) -> &Statistics { &self.statistics }
    pub fn warnings(&self) -> &[String] { &self.warnings }

    ///
    /// Analyze the capture at `path`. A capture that cannot be read to the end still produces an
    /// analysis: the failure is recorded as a warning and the packets decoded before it are kept.
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Analysis {
        let path = path.as_ref();
        let analyzed_at = SystemTime::now();

        let (header, packets, mut warnings) = match CaptureParser::parse_file(path) {
            Ok(capture) => {
                let header = capture.header().clone();
                (Some(header), capture.into_packets(), vec![])
            }
            Err(partial) => {
                warn!("{:?}: {}", path, partial);
                let warning = partial.to_string();
                (partial.header, partial.packets, vec![warning])
            }
        };

        warnings.extend(
            packets.iter()
                .filter(|p| p.protocol() == PROTOCOL_ERROR)
                .map(|p| format!("Frame {}: {}", p.frame_number(), p.info()))
        );

        let statistics = Statistics::from_packets(&packets);

        debug!("Analyzed {:?}: {} packets, {} warnings", path, packets.len(), warnings.len());

        Analysis {
            path: path.to_path_buf(),
            analyzed_at: analyzed_at,
            header: header,
            packets: packets,
            statistics: statistics,
            warnings: warnings,
        }
    }
}

///
/// True when `path` can be opened and starts with a valid capture header
///
pub fn is_valid_capture_file<P: AsRef<Path>>(path: P) -> bool {
    match CaptureFile::open(path) {
        Ok(_) => true,
        Err(e) => {
            debug!("Not a capture: {}", e);
            false
        }
    }
}
