use crate::common::{Port, NOT_AVAILABLE};
use crate::layer2::ethernet::{EthernetTypeId, Layer3Id};
use crate::layer2::{Layer2, LinkType};
use crate::layer3::{IpVersion, Layer3};
use crate::layer4::{self, Layer4};
use crate::record::PcapRecord;

use log::*;
use serde::Serialize;

use std::time::{SystemTime, UNIX_EPOCH};

pub const PROTOCOL_UNKNOWN: &str = "Unknown";
pub const PROTOCOL_ERROR: &str = "Error";

pub mod errors {
    use thiserror::Error as ThisError;

    ///
    /// Problems that turn a single frame into a diagnostic record
    ///
    #[derive(Debug, ThisError)]
    pub enum Error {
        #[error("Captured length {captured} exceeds original length {original}")]
        LengthMismatch {
            captured: u32,
            original: u32
        },
    }
}

///
/// One decoded frame of a capture. Every record read from a capture yields exactly one of these.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodedPacket {
    frame_number: u64,
    timestamp: SystemTime,
    packet_size: u32,
    captured_length: u32,
    ip_version: IpVersion,
    source_address: String,
    destination_address: String,
    protocol: String,
    source_port: Option<Port>,
    destination_port: Option<Port>,
    payload: Vec<u8>,
    info: String,
}

impl DecodedPacket {
    /// Frame number, starting at 1
    pub fn frame_number(&self) -> u64 { self.frame_number }
    pub fn timestamp(&self) -> &SystemTime { &self.timestamp }
    /// Length of the frame on the wire
    pub fn packet_size(&self) -> u32 { self.packet_size }
    pub fn captured_length(&self) -> u32 { self.captured_length }
    pub fn ip_version(&self) -> IpVersion { self.ip_version }
    pub fn source_address(&self) -> &str { &self.source_address }
    pub fn destination_address(&self) -> &str { &self.destination_address }
    pub fn protocol(&self) -> &str { &self.protocol }
    pub fn source_port(&self) -> Option<Port> { self.source_port }
    pub fn destination_port(&self) -> Option<Port> { self.destination_port }
    pub fn payload(&self) -> &[u8] { &self.payload }
    pub fn info(&self) -> &str { &self.info }

    ///
    /// Payload as upper case hex bytes separated by spaces
    ///
    pub fn payload_hex(&self) -> String {
        self.payload.iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    ///
    /// Payload with printable ascii kept and everything else replaced by '.'
    ///
    pub fn payload_ascii(&self) -> String {
        self.payload.iter()
            .map(|b| if *b >= 32 && *b <= 126 { *b as char } else { '.' })
            .collect()
    }

    fn new(frame_number: u64, record: &PcapRecord) -> DecodedPacket {
        DecodedPacket {
            frame_number: frame_number,
            timestamp: *record.timestamp(),
            packet_size: record.original_length(),
            captured_length: record.actual_length(),
            ip_version: IpVersion::Unknown,
            source_address: NOT_AVAILABLE.to_string(),
            destination_address: NOT_AVAILABLE.to_string(),
            protocol: PROTOCOL_UNKNOWN.to_string(),
            source_port: None,
            destination_port: None,
            payload: vec![],
            info: String::new(),
        }
    }

    fn append_note(&mut self, note: Option<String>) {
        if let Some(note) = note {
            if self.info.is_empty() {
                self.info = note;
            } else {
                self.info = format!("{}; {}", self.info, note);
            }
        }
    }
}

impl std::fmt::Display for DecodedPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let ts = self.timestamp.duration_since(UNIX_EPOCH).map_err(|_| std::fmt::Error)?;

        write!(f, "#{} {}.{:06} {} {} -> {} {}B {}",
               self.frame_number,
               ts.as_secs(),
               ts.subsec_micros(),
               self.protocol,
               self.source_address,
               self.destination_address,
               self.packet_size,
               self.info
        )
    }
}

///
/// Outcome of building a single frame
///
#[derive(Clone, Debug, PartialEq)]
pub enum FrameResult {
    Decoded(DecodedPacket),
    /// The frame violated a record invariant and is reported with protocol "Error"
    Diagnostic(DecodedPacket),
}

impl FrameResult {
    pub fn packet(&self) -> &DecodedPacket {
        match self {
            FrameResult::Decoded(p) => p,
            FrameResult::Diagnostic(p) => p,
        }
    }

    pub fn into_packet(self) -> DecodedPacket {
        match self {
            FrameResult::Decoded(p) => p,
            FrameResult::Diagnostic(p) => p,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        match self {
            FrameResult::Diagnostic(_) => true,
            _ => false,
        }
    }
}

///
/// Turns the records of one capture into decoded packets, numbering frames as it goes
///
pub struct PacketBuilder {
    link_type: LinkType,
    frame_number: u64,
}

impl PacketBuilder {
    pub fn new(link_type: LinkType) -> PacketBuilder {
        PacketBuilder {
            link_type: link_type,
            frame_number: 0
        }
    }

    /// Number of frames built so far
    pub fn frames(&self) -> u64 {
        self.frame_number
    }

    fn check(record: &PcapRecord) -> Result<(), errors::Error> {
        if record.actual_length() > record.original_length() {
            return Err(errors::Error::LengthMismatch {
                captured: record.actual_length(),
                original: record.original_length()
            });
        }
        Ok(())
    }

    ///
    /// Build the packet for the next record. Decode problems never escape: the packet describes
    /// them in its protocol and info instead.
    ///
    pub fn build(&mut self, record: &PcapRecord) -> FrameResult {
        self.frame_number += 1;

        let mut packet = DecodedPacket::new(self.frame_number, record);

        if let Err(e) = PacketBuilder::check(record) {
            #[cfg(not(feature = "log-errors"))]
            warn!("Frame {}: {}", self.frame_number, e);
            #[cfg(feature = "log-errors")]
            error!("Frame {}: {}", self.frame_number, e);

            packet.protocol = PROTOCOL_ERROR.to_string();
            packet.payload = record.payload().to_vec();
            packet.info = format!("Parse error: {}", e);
            return FrameResult::Diagnostic(packet);
        }

        self.decode_link(&mut packet, record.payload());

        debug!("Frame {}: {} {}", packet.frame_number, packet.protocol, packet.info);

        FrameResult::Decoded(packet)
    }

    fn decode_link(&self, packet: &mut DecodedPacket, frame: &[u8]) {
        match Layer2::decode(self.link_type, frame) {
            Layer2::Ethernet(eth) => {
                match eth.ether_type {
                    EthernetTypeId::L3(Layer3Id::IPv4) => {
                        PacketBuilder::decode_network(packet, Some(IpVersion::IPv4), eth.payload)
                    }
                    EthernetTypeId::L3(Layer3Id::IPv6) => {
                        PacketBuilder::decode_network(packet, Some(IpVersion::IPv6), eth.payload)
                    }
                    other => {
                        packet.source_address = eth.src_mac.to_string();
                        packet.destination_address = eth.dst_mac.to_string();
                        PacketBuilder::non_ip(packet, other.to_string(), eth.payload)
                    }
                }
            }
            Layer2::Raw(raw) => {
                match raw.layer3 {
                    Some(Layer3Id::IPv4) => {
                        PacketBuilder::decode_network(packet, Some(IpVersion::IPv4), raw.payload)
                    }
                    Some(Layer3Id::IPv6) => {
                        PacketBuilder::decode_network(packet, Some(IpVersion::IPv6), raw.payload)
                    }
                    Some(other) => PacketBuilder::non_ip(packet, other.to_string(), raw.payload),
                    None => PacketBuilder::decode_network(packet, None, raw.payload),
                }
            }
            Layer2::Unrecognized(u) => {
                packet.payload = frame.to_vec();
                packet.info = format!("Could not parse packet: {}", u.reason);
            }
        }
    }

    fn non_ip(packet: &mut DecodedPacket, label: String, payload: &[u8]) {
        packet.info = format!("Non-IP: {}", label);
        packet.protocol = label;
        packet.payload = payload.to_vec();
    }

    fn decode_network(packet: &mut DecodedPacket, expected: Option<IpVersion>, input: &[u8]) {
        let l3 = Layer3::decode(expected, input);
        let ip_version = l3.version();

        let (protocol, payload, note) = match l3 {
            Layer3::IPv4(ip) => {
                packet.source_address = ip.src_ip.to_string();
                packet.destination_address = ip.dst_ip.to_string();
                (ip.protocol, ip.payload, ip.note)
            }
            Layer3::IPv6(ip) => {
                packet.source_address = ip.src_ip.to_string();
                packet.destination_address = ip.dst_ip.to_string();
                (ip.protocol, ip.payload, ip.note)
            }
            Layer3::Unrecognized(u) => {
                packet.payload = input.to_vec();
                packet.info = format!("Could not parse packet: {}", u.reason);
                return;
            }
        };

        packet.ip_version = ip_version;

        let transport = layer4::decode(protocol, ip_version, payload);
        let l4 = &transport.layer4;

        packet.protocol = l4.protocol_label();
        packet.payload = l4.payload().to_vec();

        if let Some((src_port, dst_port)) = l4.ports() {
            packet.source_port = Some(src_port);
            packet.destination_port = Some(dst_port);
        }

        packet.info = match l4 {
            Layer4::Tcp(_) | Layer4::Udp(_) => {
                format!("{} {} \u{2192} {}",
                        packet.protocol,
                        packet.source_port.unwrap_or(0),
                        packet.destination_port.unwrap_or(0))
            }
            Layer4::Icmp(icmp) => icmp.to_string(),
            Layer4::IcmpV6(icmp) => icmp.to_string(),
            Layer4::Raw(_) => format!("{} {}", ip_version, packet.protocol),
        };

        packet.append_note(note);
        packet.append_note(transport.note);
    }
}
