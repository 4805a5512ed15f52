use crate::global_header::TimestampResolution;

use nom::*;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const RECORD_HEADER_LENGTH: usize = 16;

///
/// Per record header preceding every frame of a libpcap capture
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    timestamp: SystemTime,
    captured_length: u32,
    original_length: u32
}

impl RecordHeader {
    pub fn timestamp(&self) -> &SystemTime {
        &self.timestamp
    }
    pub fn captured_length(&self) -> u32 {
        self.captured_length
    }
    pub fn original_length(&self) -> u32 {
        self.original_length
    }

    pub fn new(timestamp: SystemTime, captured_length: u32, original_length: u32) -> RecordHeader {
        RecordHeader {
            timestamp,
            captured_length,
            original_length
        }
    }

    pub fn convert_packet_time(
        ts_seconds: u32,
        ts_fraction: u32,
        resolution: TimestampResolution
    ) -> SystemTime {
        let offset = Duration::from_secs(ts_seconds as u64) + resolution.fraction_to_duration(ts_fraction);
        UNIX_EPOCH + offset
    }

    pub fn parse(
        input: &[u8],
        endianness: Endianness,
        resolution: TimestampResolution
    ) -> IResult<&[u8], RecordHeader> {
        do_parse!(input,

            ts_seconds: u32!(endianness) >>
            ts_fraction: u32!(endianness) >>
            captured_length: u32!(endianness) >>
            original_length: u32!(endianness) >>

            (
                RecordHeader {
                    timestamp: RecordHeader::convert_packet_time(ts_seconds, ts_fraction, resolution),
                    captured_length: captured_length,
                    original_length: original_length
                }
            )
        )
    }
}

///
/// Pcap record associated with a libpcap capture: the record header and the captured frame bytes
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcapRecord {
    header: RecordHeader,
    payload: Vec<u8>
}

impl PcapRecord {
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }
    pub fn timestamp(&self) -> &SystemTime {
        self.header.timestamp()
    }
    pub fn actual_length(&self) -> u32 {
        self.header.captured_length()
    }
    pub fn original_length(&self) -> u32 {
        self.header.original_length()
    }
    pub fn payload(&self) -> &[u8] { &self.payload }

    pub fn new(header: RecordHeader, payload: Vec<u8>) -> PcapRecord {
        PcapRecord {
            header,
            payload
        }
    }
}

impl std::fmt::Display for PcapRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.timestamp().duration_since(UNIX_EPOCH)
            .map_err(|_| {
                std::fmt::Error
            })
            .and_then(|d| {
                write!(f, "Timestamp={}{:03}   Length={}   Original Length={}",
                       d.as_secs(),
                       d.subsec_millis(),
                       self.actual_length(),
                       self.original_length()
                )
            })
    }
}
