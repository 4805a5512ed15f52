use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::*;
use serde::Serialize;

pub mod ethernet;

use ethernet::{Ethernet, Layer3Id};

const LOOPBACK_HEADER_LENGTH: usize = 4;
const LINUX_SLL_HEADER_LENGTH: usize = 16;
const LINUX_SLL_PROTOCOL_OFFSET: usize = 14;

///
/// Link layer type declared in the capture's global header (http://www.tcpdump.org/linktypes.html)
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LinkType {
    Null,
    Ethernet,
    Raw(u32),
    Loop,
    LinuxSll,
    Other(u32)
}

impl LinkType {
    pub fn new(code: u32) -> LinkType {
        match code {
            0 => LinkType::Null,
            1 => LinkType::Ethernet,
            12 | 14 | 101 | 228 | 229 => LinkType::Raw(code),
            108 => LinkType::Loop,
            113 => LinkType::LinuxSll,
            x => LinkType::Other(x)
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            LinkType::Null => 0,
            LinkType::Ethernet => 1,
            LinkType::Raw(x) => *x,
            LinkType::Loop => 108,
            LinkType::LinuxSll => 113,
            LinkType::Other(x) => *x,
        }
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LinkType::Null => write!(f, "null"),
            LinkType::Ethernet => write!(f, "ethernet"),
            LinkType::Raw(x) => write!(f, "raw({})", x),
            LinkType::Loop => write!(f, "loop"),
            LinkType::LinuxSll => write!(f, "linux_sll"),
            LinkType::Other(x) => write!(f, "unknown({})", x),
        }
    }
}

///
/// Frame that carries a network packet with no link addresses of interest. `layer3` is `None` when
/// the network protocol has to be read from the packet itself.
///
#[derive(Debug)]
pub struct Raw<'a> {
    pub link_type: LinkType,
    pub layer3: Option<Layer3Id>,
    pub payload: &'a [u8]
}

///
/// Frame whose link layer could not be classified. Not an error, the frame is reported as unknown.
///
#[derive(Debug, PartialEq)]
pub struct Unrecognized {
    pub link_type: LinkType,
    pub reason: String
}

///
/// Result of decoding the link layer of a frame
///
#[derive(Debug)]
pub enum Layer2<'a> {
    Ethernet(Ethernet<'a>),
    Raw(Raw<'a>),
    Unrecognized(Unrecognized)
}

fn loopback_family(link_type: LinkType, header: &[u8]) -> Option<Layer3Id> {
    // DLT_NULL stores the family in the capturing host's byte order
    let family = match link_type {
        LinkType::Loop => BigEndian::read_u32(header),
        _ => {
            let le = LittleEndian::read_u32(header);
            if le > 0xFFFF {
                BigEndian::read_u32(header)
            } else {
                le
            }
        }
    };

    match family {
        2 => Some(Layer3Id::IPv4),
        24 | 28 | 30 => Some(Layer3Id::IPv6),
        _ => None
    }
}

impl<'a> Layer2<'a> {
    fn unrecognized(link_type: LinkType, reason: String) -> Layer2<'a> {
        debug!("Unrecognized {} frame: {}", link_type, reason);

        Layer2::Unrecognized(Unrecognized {
            link_type: link_type,
            reason: reason
        })
    }

    fn truncated(link_type: LinkType, expected: usize, available: usize) -> Layer2<'a> {
        Layer2::unrecognized(
            link_type,
            format!("Truncated {} header: {} of {} bytes", link_type, available, expected)
        )
    }

    ///
    /// Strip the link header of `frame` according to the capture's link type
    ///
    pub fn decode(link_type: LinkType, frame: &'a [u8]) -> Layer2<'a> {
        trace!("Decoding {} frame of {}B", link_type, frame.len());

        match link_type {
            LinkType::Ethernet => {
                match Ethernet::parse(frame) {
                    Ok(l2) => Layer2::Ethernet(l2),
                    Err(e) => Layer2::unrecognized(link_type, format!("Truncated ethernet header: {}", e))
                }
            }
            LinkType::Raw(code) => {
                let layer3 = match code {
                    228 => Some(Layer3Id::IPv4),
                    229 => Some(Layer3Id::IPv6),
                    _ => None
                };

                Layer2::Raw(Raw {
                    link_type: link_type,
                    layer3: layer3,
                    payload: frame
                })
            }
            LinkType::Null | LinkType::Loop => {
                if frame.len() < LOOPBACK_HEADER_LENGTH {
                    return Layer2::truncated(link_type, LOOPBACK_HEADER_LENGTH, frame.len());
                }

                Layer2::Raw(Raw {
                    link_type: link_type,
                    layer3: loopback_family(link_type, &frame[..LOOPBACK_HEADER_LENGTH]),
                    payload: &frame[LOOPBACK_HEADER_LENGTH..]
                })
            }
            LinkType::LinuxSll => {
                if frame.len() < LINUX_SLL_HEADER_LENGTH {
                    return Layer2::truncated(link_type, LINUX_SLL_HEADER_LENGTH, frame.len());
                }

                let protocol = BigEndian::read_u16(&frame[LINUX_SLL_PROTOCOL_OFFSET..LINUX_SLL_HEADER_LENGTH]);

                Layer2::Raw(Raw {
                    link_type: link_type,
                    layer3: Some(Layer3Id::new(protocol)),
                    payload: &frame[LINUX_SLL_HEADER_LENGTH..]
                })
            }
            LinkType::Other(code) => {
                Layer2::unrecognized(link_type, format!("Unsupported link type {}", code))
            }
        }
    }
}
