//! Selections over decoded packets. Each filter borrows the matching packets in capture order.

use crate::layer3::IpVersion;
use crate::packet::DecodedPacket;

/// Packets whose protocol label matches `protocol`, ignoring case
pub fn by_protocol<'a>(packets: &'a [DecodedPacket], protocol: &str) -> Vec<&'a DecodedPacket> {
    packets.iter()
        .filter(|p| p.protocol().eq_ignore_ascii_case(protocol))
        .collect()
}

pub fn by_ip_version(packets: &[DecodedPacket], version: IpVersion) -> Vec<&DecodedPacket> {
    packets.iter()
        .filter(|p| p.ip_version() == version)
        .collect()
}

/// Packets sent from or to `address`, ignoring case
pub fn by_address<'a>(packets: &'a [DecodedPacket], address: &str) -> Vec<&'a DecodedPacket> {
    packets.iter()
        .filter(|p| {
            p.source_address().eq_ignore_ascii_case(address) ||
                p.destination_address().eq_ignore_ascii_case(address)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer2::LinkType;
    use crate::layer2::ethernet::tests::ARP_RAW_DATA;
    use crate::layer3::ipv6::tests::RAW_DATA as IPV6_RAW_DATA;
    use crate::packet::PacketBuilder;
    use crate::record::{PcapRecord, RecordHeader};
    use crate::tests::util::ETHERNET_TCP_FRAME;

    use std::time::UNIX_EPOCH;

    fn packets() -> Vec<DecodedPacket> {
        let mut ethernet = PacketBuilder::new(LinkType::Ethernet);
        let mut raw = PacketBuilder::new(LinkType::Raw(101));

        let record = |frame: &[u8]| {
            PcapRecord::new(
                RecordHeader::new(UNIX_EPOCH, frame.len() as u32, frame.len() as u32),
                frame.to_vec()
            )
        };

        vec![
            ethernet.build(&record(ETHERNET_TCP_FRAME)).into_packet(),
            ethernet.build(&record(ARP_RAW_DATA)).into_packet(),
            raw.build(&record(IPV6_RAW_DATA)).into_packet(),
        ]
    }

    #[test]
    fn filter_protocol() {
        let packets = packets();

        let tcp = by_protocol(&packets, "tcp");
        assert_eq!(tcp.len(), 1);
        assert_eq!(tcp[0].protocol(), "TCP");

        assert_eq!(by_protocol(&packets, "Arp").len(), 1);
        assert!(by_protocol(&packets, "GRE").is_empty());
    }

    #[test]
    fn filter_ip_version() {
        let packets = packets();

        assert_eq!(by_ip_version(&packets, IpVersion::IPv4).len(), 1);
        assert_eq!(by_ip_version(&packets, IpVersion::IPv6).len(), 1);
        assert_eq!(by_ip_version(&packets, IpVersion::Unknown).len(), 1);
    }

    #[test]
    fn filter_address() {
        let packets = packets();

        assert_eq!(by_address(&packets, "192.168.1.2").len(), 1);
        assert_eq!(by_address(&packets, "FE80::1").len(), 1);
        assert!(by_address(&packets, "10.0.0.1").is_empty());
    }
}
