use crate::common::Port;
use crate::layer3::{InternetProtocolId, IpVersion};

use byteorder::{BigEndian, ByteOrder};
use log::*;

pub mod icmp;
pub mod icmpv6;
pub mod tcp;
pub mod udp;

pub use icmp::Icmp;
pub use icmpv6::IcmpV6;
pub use tcp::Tcp;
pub use udp::Udp;

///
/// Network payload that is not decoded further. The label is the protocol it was carried as.
///
#[derive(Debug)]
pub struct Raw<'a> {
    pub protocol: InternetProtocolId,
    pub payload: &'a [u8],
}

///
/// Available Layer 4 representations
///
#[derive(Debug)]
pub enum Layer4<'a> {
    Tcp(Tcp<'a>),
    Udp(Udp<'a>),
    Icmp(Icmp<'a>),
    IcmpV6(IcmpV6<'a>),
    Raw(Raw<'a>),
}

impl<'a> Layer4<'a> {
    pub fn protocol_label(&self) -> String {
        match self {
            Layer4::Tcp(_) => InternetProtocolId::Tcp.to_string(),
            Layer4::Udp(_) => InternetProtocolId::Udp.to_string(),
            Layer4::Icmp(_) => InternetProtocolId::Icmp.to_string(),
            Layer4::IcmpV6(_) => InternetProtocolId::IcmpV6.to_string(),
            Layer4::Raw(r) => r.protocol.to_string(),
        }
    }

    /// Source and destination port
    pub fn ports(&self) -> Option<(Port, Port)> {
        match self {
            Layer4::Tcp(t) => Some((t.src_port, t.dst_port)),
            Layer4::Udp(u) => Some((u.src_port, u.dst_port)),
            _ => None,
        }
    }

    pub fn payload(&self) -> &'a [u8] {
        match self {
            Layer4::Tcp(t) => t.payload,
            Layer4::Udp(u) => u.payload,
            Layer4::Icmp(i) => i.payload,
            Layer4::IcmpV6(i) => i.payload,
            Layer4::Raw(r) => r.payload,
        }
    }
}

///
/// Transport layer of a packet, with a note when the header could only be partially decoded
///
#[derive(Debug)]
pub struct Transport<'a> {
    pub layer4: Layer4<'a>,
    pub note: Option<String>,
}

impl<'a> Transport<'a> {
    fn complete(layer4: Layer4<'a>) -> Transport<'a> {
        Transport {
            layer4: layer4,
            note: None
        }
    }
}

const EMPTY: &[u8] = &[];

fn leading_ports(input: &[u8]) -> Option<(Port, Port)> {
    if input.len() < 4 {
        None
    } else {
        Some((BigEndian::read_u16(&input[0..2]), BigEndian::read_u16(&input[2..4])))
    }
}

fn failure_note(protocol: InternetProtocolId, available: usize, err: &nom::Err<&[u8]>) -> String {
    match err {
        nom::Err::Incomplete(_) => format!("Truncated {} header: {} bytes available", protocol, available),
        _ => format!("Malformed {} header", protocol),
    }
}

fn raw(protocol: InternetProtocolId, payload: &[u8]) -> Layer4<'_> {
    Layer4::Raw(Raw {
        protocol: protocol,
        payload: payload
    })
}

fn decode_tcp(input: &[u8]) -> Transport<'_> {
    match Tcp::parse(input) {
        Ok((_, tcp)) => Transport::complete(Layer4::Tcp(tcp)),
        Err(ref e) => {
            let note = failure_note(InternetProtocolId::Tcp, input.len(), e);
            debug!("{}", note);
            let layer4 = match leading_ports(input) {
                Some((src_port, dst_port)) => Layer4::Tcp(Tcp {
                    dst_port: dst_port,
                    src_port: src_port,
                    header_length: 0,
                    payload: EMPTY
                }),
                None => raw(InternetProtocolId::Tcp, EMPTY),
            };
            Transport {
                layer4: layer4,
                note: Some(note)
            }
        }
    }
}

fn decode_udp(input: &[u8]) -> Transport<'_> {
    match Udp::parse(input) {
        Ok((_, udp)) => {
            let declared = (udp.length as usize).saturating_sub(udp::HEADER_LENGTH);
            let note = if declared > udp.payload.len() {
                Some(format!(
                    "UDP length {} exceeds {} available bytes",
                    udp.length,
                    input.len()
                ))
            } else {
                None
            };
            Transport {
                layer4: Layer4::Udp(udp),
                note: note
            }
        }
        Err(ref e) => {
            let note = failure_note(InternetProtocolId::Udp, input.len(), e);
            debug!("{}", note);
            let layer4 = match leading_ports(input) {
                Some((src_port, dst_port)) => Layer4::Udp(Udp {
                    dst_port: dst_port,
                    src_port: src_port,
                    length: 0,
                    payload: EMPTY
                }),
                None => raw(InternetProtocolId::Udp, EMPTY),
            };
            Transport {
                layer4: layer4,
                note: Some(note)
            }
        }
    }
}

fn decode_icmp(input: &[u8]) -> Transport<'_> {
    match Icmp::parse(input) {
        Ok((_, icmp)) => Transport::complete(Layer4::Icmp(icmp)),
        Err(ref e) => {
            let note = failure_note(InternetProtocolId::Icmp, input.len(), e);
            debug!("{}", note);
            let layer4 = if input.len() >= 2 {
                Layer4::Icmp(Icmp {
                    type_: input[0],
                    code: input[1],
                    payload: EMPTY
                })
            } else {
                raw(InternetProtocolId::Icmp, EMPTY)
            };
            Transport {
                layer4: layer4,
                note: Some(note)
            }
        }
    }
}

fn decode_icmpv6(input: &[u8]) -> Transport<'_> {
    match IcmpV6::parse(input) {
        Ok((_, icmp)) => Transport::complete(Layer4::IcmpV6(icmp)),
        Err(ref e) => {
            let note = failure_note(InternetProtocolId::IcmpV6, input.len(), e);
            debug!("{}", note);
            let layer4 = match input.first() {
                Some(type_) => Layer4::IcmpV6(IcmpV6 {
                    type_: *type_,
                    payload: EMPTY
                }),
                None => raw(InternetProtocolId::IcmpV6, EMPTY),
            };
            Transport {
                layer4: layer4,
                note: Some(note)
            }
        }
    }
}

///
/// Decode the transport layer carried by an IP packet. Never fails: headers that do not fit in
/// `input` keep whatever fields are present, an empty payload, and a note describing the problem.
///
pub fn decode(protocol: InternetProtocolId, ip_version: IpVersion, input: &[u8]) -> Transport<'_> {
    trace!("Decoding {} over {}, available={}", protocol, ip_version, input.len());

    match (protocol, ip_version) {
        (InternetProtocolId::Tcp, _) => decode_tcp(input),
        (InternetProtocolId::Udp, _) => decode_udp(input),
        (InternetProtocolId::Icmp, IpVersion::IPv4) => decode_icmp(input),
        (InternetProtocolId::IcmpV6, IpVersion::IPv6) => decode_icmpv6(input),
        (p, _) => Transport::complete(raw(p, input)),
    }
}
