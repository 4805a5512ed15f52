use crate::errors::Error;
use crate::layer2::LinkType;
use crate::nom_error;

use byteorder::{BigEndian, ByteOrder};
use log::*;
use nom::*;
use serde::Serialize;

use std::time::Duration;

pub const GLOBAL_HEADER_LENGTH: usize = 24;
const MAGIC_LENGTH: usize = 4;

const MAGIC_MICROSECONDS: u32 = 0xa1b2c3d4u32;
const MAGIC_MICROSECONDS_SWAPPED: u32 = 0xd4c3b2a1u32;
const MAGIC_NANOSECONDS: u32 = 0xa1b23c4du32;
const MAGIC_NANOSECONDS_SWAPPED: u32 = 0x4d3cb2a1u32;

///
/// Unit of the fractional part of every record timestamp, selected by the magic number
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TimestampResolution {
    Microsecond,
    Nanosecond
}

impl TimestampResolution {
    pub fn fraction_to_duration(&self, fraction: u32) -> Duration {
        match self {
            TimestampResolution::Microsecond => Duration::from_micros(fraction as u64),
            TimestampResolution::Nanosecond => Duration::from_nanos(fraction as u64),
        }
    }
}

///
/// Global header of a libpcap capture (https://wiki.wireshark.org/Development/LibpcapFileFormat)
///
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalHeader {
    endianness: Endianness,
    resolution: TimestampResolution,
    version_major: u16,
    version_minor: u16,
    zone: i32,
    sig_figs: u32,
    snap_length: u32,
    link_type: LinkType
}

impl GlobalHeader {
    pub fn endianness(&self) -> Endianness { self.endianness }
    pub fn resolution(&self) -> TimestampResolution { self.resolution }
    pub fn version_major(&self) -> u16 { self.version_major }
    pub fn version_minor(&self) -> u16 { self.version_minor }
    pub fn zone(&self) -> i32 { self.zone }
    pub fn sig_figs(&self) -> u32 { self.sig_figs }
    pub fn snap_length(&self) -> u32 {
        self.snap_length
    }
    pub fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn resolve_magic(magic: u32) -> Result<(Endianness, TimestampResolution), Error> {
        match magic {
            MAGIC_MICROSECONDS => Ok( (Endianness::Big, TimestampResolution::Microsecond) ),
            MAGIC_MICROSECONDS_SWAPPED => Ok( (Endianness::Little, TimestampResolution::Microsecond) ),
            MAGIC_NANOSECONDS => Ok( (Endianness::Big, TimestampResolution::Nanosecond) ),
            MAGIC_NANOSECONDS_SWAPPED => Ok( (Endianness::Little, TimestampResolution::Nanosecond) ),
            _ => Err(Error::InvalidMagicNumber { magic: magic })
        }
    }

    fn parse_fields(
        input: &[u8],
        endianness: Endianness,
        resolution: TimestampResolution
    ) -> IResult<&[u8], GlobalHeader> {
        do_parse!(input,

            version_major: u16!(endianness) >>
            version_minor: u16!(endianness) >>
            zone: i32!(endianness) >>
            sig_figs: u32!(endianness) >>
            snap_length: u32!(endianness) >>
            network: u32!(endianness) >>

            (
                GlobalHeader {
                    endianness: endianness,
                    resolution: resolution,
                    version_major: version_major,
                    version_minor: version_minor,
                    zone: zone,
                    sig_figs: sig_figs,
                    snap_length: snap_length,
                    link_type: LinkType::new(network)
                }
            )
        )
    }

    ///
    /// Parse the 24 byte global header. The magic number is checked before anything else, so a
    /// short file that does not start with a capture magic is reported as such.
    ///
    pub fn parse(input: &[u8]) -> Result<(&[u8], GlobalHeader), Error> {
        if input.len() < MAGIC_LENGTH {
            return Err(Error::TruncatedHeader {
                expected: GLOBAL_HEADER_LENGTH,
                available: input.len()
            });
        }

        let magic = BigEndian::read_u32(&input[..MAGIC_LENGTH]);
        let (endianness, resolution) = GlobalHeader::resolve_magic(magic)?;

        if input.len() < GLOBAL_HEADER_LENGTH {
            return Err(Error::TruncatedHeader {
                expected: GLOBAL_HEADER_LENGTH,
                available: input.len()
            });
        }

        let (rem, header) = GlobalHeader::parse_fields(&input[MAGIC_LENGTH..], endianness, resolution)
            .map_err(nom_error::Error::from)?;

        debug!(
            "Global header version {}.{}, with endianness {:?}, resolution {:?}, link type {}",
            header.version_major,
            header.version_minor,
            header.endianness,
            header.resolution,
            header.link_type
        );

        Ok( (rem, header) )
    }
}
