use log::*;
use serde::Serialize;

pub mod ipv4;
pub mod ipv6;

pub use ipv4::IPv4;
pub use ipv6::IPv6;

///
/// IP version of a decoded packet
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IpVersion {
    Unknown,
    IPv4,
    IPv6
}

impl Default for IpVersion {
    fn default() -> Self {
        IpVersion::Unknown
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IpVersion::Unknown => write!(f, "Unknown"),
            IpVersion::IPv4 => write!(f, "IPv4"),
            IpVersion::IPv6 => write!(f, "IPv6"),
        }
    }
}

///
/// Protocol numbers carried in the IPv4 protocol and IPv6 next header fields
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InternetProtocolId {
    HopByHop,
    Icmp,
    Igmp,
    Tcp,
    Udp,
    IPv6Route,
    IPv6Fragment,
    Gre,
    Esp,
    Ah,
    IcmpV6,
    NoNextHeader,
    IPv6Options,
    Ospf,
    Sctp,
    Other(u8)
}

impl InternetProtocolId {
    pub fn new(value: u8) -> InternetProtocolId {
        match value {
            0 => InternetProtocolId::HopByHop,
            1 => InternetProtocolId::Icmp,
            2 => InternetProtocolId::Igmp,
            6 => InternetProtocolId::Tcp,
            17 => InternetProtocolId::Udp,
            43 => InternetProtocolId::IPv6Route,
            44 => InternetProtocolId::IPv6Fragment,
            47 => InternetProtocolId::Gre,
            50 => InternetProtocolId::Esp,
            51 => InternetProtocolId::Ah,
            58 => InternetProtocolId::IcmpV6,
            59 => InternetProtocolId::NoNextHeader,
            60 => InternetProtocolId::IPv6Options,
            89 => InternetProtocolId::Ospf,
            132 => InternetProtocolId::Sctp,
            x => InternetProtocolId::Other(x)
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            InternetProtocolId::HopByHop => 0,
            InternetProtocolId::Icmp => 1,
            InternetProtocolId::Igmp => 2,
            InternetProtocolId::Tcp => 6,
            InternetProtocolId::Udp => 17,
            InternetProtocolId::IPv6Route => 43,
            InternetProtocolId::IPv6Fragment => 44,
            InternetProtocolId::Gre => 47,
            InternetProtocolId::Esp => 50,
            InternetProtocolId::Ah => 51,
            InternetProtocolId::IcmpV6 => 58,
            InternetProtocolId::NoNextHeader => 59,
            InternetProtocolId::IPv6Options => 60,
            InternetProtocolId::Ospf => 89,
            InternetProtocolId::Sctp => 132,
            InternetProtocolId::Other(x) => *x,
        }
    }
}

impl std::fmt::Display for InternetProtocolId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InternetProtocolId::HopByHop => write!(f, "HOPOPT"),
            InternetProtocolId::Icmp => write!(f, "ICMPv4"),
            InternetProtocolId::Igmp => write!(f, "IGMP"),
            InternetProtocolId::Tcp => write!(f, "TCP"),
            InternetProtocolId::Udp => write!(f, "UDP"),
            InternetProtocolId::IPv6Route => write!(f, "IPv6-Route"),
            InternetProtocolId::IPv6Fragment => write!(f, "IPv6-Frag"),
            InternetProtocolId::Gre => write!(f, "GRE"),
            InternetProtocolId::Esp => write!(f, "ESP"),
            InternetProtocolId::Ah => write!(f, "AH"),
            InternetProtocolId::IcmpV6 => write!(f, "ICMPv6"),
            InternetProtocolId::NoNextHeader => write!(f, "IPv6-NoNxt"),
            InternetProtocolId::IPv6Options => write!(f, "IPv6-Opts"),
            InternetProtocolId::Ospf => write!(f, "OSPF"),
            InternetProtocolId::Sctp => write!(f, "SCTP"),
            InternetProtocolId::Other(x) => write!(f, "{}", x),
        }
    }
}

///
/// Errors that make a network header unusable. They never fail a frame, the packet is reported
/// with an unknown IP version instead.
///
pub mod errors {
    use crate::nom_error;
    use thiserror::Error as ThisError;

    #[derive(Debug, ThisError)]
    pub enum Error {
        #[error("Expected IP version {expected}, version was {actual}")]
        Version {
            expected: u8,
            actual: u8
        },
        #[error("Invalid IPv4 header length {length}")]
        HeaderLength {
            length: usize
        },
        #[error("Truncated header: {0}")]
        Nom(#[from] nom_error::Error),
    }
}

#[derive(Debug, PartialEq)]
pub struct Unrecognized {
    pub reason: String
}

///
/// Result of decoding the network layer of a frame
///
#[derive(Debug)]
pub enum Layer3<'a> {
    IPv4(IPv4<'a>),
    IPv6(IPv6<'a>),
    Unrecognized(Unrecognized)
}

impl<'a> Layer3<'a> {
    ///
    /// Decode `input` as the given IP version, or as whatever version its first nibble declares
    /// when `expected` is `None`.
    ///
    pub fn decode(expected: Option<IpVersion>, input: &'a [u8]) -> Layer3<'a> {
        let version = match expected {
            Some(v) => v,
            None => match input.first().map(|b| b >> 4) {
                Some(4) => IpVersion::IPv4,
                Some(6) => IpVersion::IPv6,
                Some(v) => {
                    return Layer3::Unrecognized(Unrecognized {
                        reason: format!("Unknown IP version {}", v)
                    });
                }
                None => {
                    return Layer3::Unrecognized(Unrecognized {
                        reason: "Empty network payload".to_string()
                    });
                }
            }
        };

        let res = match version {
            IpVersion::IPv4 => IPv4::parse(input).map(Layer3::IPv4),
            IpVersion::IPv6 => IPv6::parse(input).map(Layer3::IPv6),
            IpVersion::Unknown => {
                return Layer3::Unrecognized(Unrecognized {
                    reason: "Unknown IP version".to_string()
                });
            }
        };

        res.unwrap_or_else(|e| {
            debug!("Could not decode {} header: {}", version, e);
            Layer3::Unrecognized(Unrecognized {
                reason: format!("Malformed {} header: {}", version, e)
            })
        })
    }

    pub fn version(&self) -> IpVersion {
        match self {
            Layer3::IPv4(_) => IpVersion::IPv4,
            Layer3::IPv6(_) => IpVersion::IPv6,
            Layer3::Unrecognized(_) => IpVersion::Unknown,
        }
    }
}
