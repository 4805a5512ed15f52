use crate::common::{MacAddress, Vlan, MAC_LENGTH};
use crate::nom_error;

use arrayref::array_ref;
use log::*;
use nom::*;

pub const HEADER_LENGTH: usize = 2 * MAC_LENGTH + 2;
const ETHERNET_PAYLOAD: u16 = 1500u16;
/// 802.1ad outer tag plus 802.1Q inner tag
pub const MAX_VLAN_TAGS: usize = 2;

///
/// Network layer protocols identified by an ethertype
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer3Id {
    Lldp,
    IPv4,
    IPv6,
    Arp,
    Other(u16)
}

impl Layer3Id {
    pub fn new(value: u16) -> Layer3Id {
        match value {
            0x88cc => Layer3Id::Lldp,
            0x0800 => Layer3Id::IPv4,
            0x86dd => Layer3Id::IPv6,
            0x0806 => Layer3Id::Arp,
            x => Layer3Id::Other(x)
        }
    }
}

impl std::fmt::Display for Layer3Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Layer3Id::Lldp => write!(f, "LLDP"),
            Layer3Id::IPv4 => write!(f, "IPv4"),
            Layer3Id::IPv6 => write!(f, "IPv6"),
            Layer3Id::Arp => write!(f, "ARP"),
            Layer3Id::Other(x) => write!(f, "0x{:04X}", x),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VlanTypeId {
    VlanTagId,
    ProviderBridging,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EthernetTypeId {
    PayloadLength(u16),
    Vlan(VlanTypeId),
    L3(Layer3Id)
}

impl EthernetTypeId {
    pub fn new(value: u16) -> EthernetTypeId {
        match value {
            0x8100 => EthernetTypeId::Vlan(VlanTypeId::VlanTagId),
            0x88a8 => EthernetTypeId::Vlan(VlanTypeId::ProviderBridging),
            x if x <= ETHERNET_PAYLOAD => EthernetTypeId::PayloadLength(x),
            x => EthernetTypeId::L3(Layer3Id::new(x))
        }
    }
}

impl std::fmt::Display for EthernetTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EthernetTypeId::PayloadLength(_) => write!(f, "LLC"),
            EthernetTypeId::Vlan(_) => write!(f, "VLAN"),
            EthernetTypeId::L3(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VlanTag {
    pub vlan_type: VlanTypeId,
    pub tci: u16
}

impl VlanTag {
    pub fn vlan(&self) -> Vlan {
        self.tci & 0x0FFF
    }
}

#[derive(Debug)]
pub struct Ethernet<'a> {
    pub dst_mac: MacAddress,
    pub src_mac: MacAddress,
    pub ether_type: EthernetTypeId,
    pub vlans: Vec<VlanTag>,
    pub payload: &'a [u8]
}

fn to_mac_address(i: &[u8]) -> MacAddress {
    MacAddress(*array_ref![i, 0, MAC_LENGTH])
}

named!(mac_address<&[u8], MacAddress>, map!(take!(MAC_LENGTH), to_mac_address));

impl<'a> Ethernet<'a> {
    pub fn vlan(&self) -> Vlan {
        self.vlans.first().map(|v| v.vlan()).unwrap_or(0)
    }

    fn parse_vlan_tags(
        input: &'a [u8],
        ether_type: EthernetTypeId
    ) -> IResult<&'a [u8], (EthernetTypeId, Vec<VlanTag>)> {
        let mut rem = input;
        let mut ether_type = ether_type;
        let mut vlans = vec![];

        while let EthernetTypeId::Vlan(vlan_type) = ether_type {
            if vlans.len() == MAX_VLAN_TAGS {
                debug!("More than {} vlan tags, leaving payload undecoded", MAX_VLAN_TAGS);
                break;
            }

            let (next, (tci, inner)) = do_parse!(rem,
                tci: be_u16 >>
                inner: be_u16 >>

                ( (tci, inner) )
            )?;

            vlans.push(VlanTag {
                vlan_type: vlan_type,
                tci: tci
            });

            rem = next;
            ether_type = EthernetTypeId::new(inner);
        }

        Ok( (rem, (ether_type, vlans)) )
    }

    ///
    /// Parse the ethernet header, skipping up to `MAX_VLAN_TAGS` 802.1Q/802.1ad tags. Everything
    /// after the header is the payload, whatever the ethertype. A frame with more tags keeps a vlan
    /// ether type.
    ///
    pub fn parse(input: &'a [u8]) -> Result<Ethernet<'a>, nom_error::Error> {
        trace!("Available={}", input.len());

        let (rem, (dst_mac, src_mac, ether_type)) = do_parse!(input,
            dst_mac: mac_address >>
            src_mac: mac_address >>
            ether_type: map!(be_u16, EthernetTypeId::new) >>

            ( (dst_mac, src_mac, ether_type) )
        ).map_err(nom_error::Error::from)?;

        let (payload, (ether_type, vlans)) = Ethernet::parse_vlan_tags(rem, ether_type)
            .map_err(nom_error::Error::from)?;

        Ok(Ethernet {
            dst_mac: dst_mac,
            src_mac: src_mac,
            ether_type: ether_type,
            vlans: vlans,
            payload: payload
        })
    }
}

#[cfg(test)]
pub mod tests {
    use hex_slice::AsHex;

    use super::*;

    pub const ARP_RAW_DATA: &'static [u8] = &[
        0xFFu8, 0xFFu8, 0xFFu8, 0xFFu8, 0xFFu8, 0xFFu8, //dst mac ff:ff:ff:ff:ff:ff
        0x00u8, 0x0Cu8, 0x29u8, 0x34u8, 0x0Bu8, 0xDEu8, //src mac 00:0c:29:34:0b:de
        0x08u8, 0x06u8, //arp
        0x00u8, 0x01u8, //hardware type, ethernet
        0x08u8, 0x00u8, //protocol type, ipv4
        0x06u8, 0x04u8, //hardware and protocol size
        0x00u8, 0x01u8, //request
        0x00u8, 0x0Cu8, 0x29u8, 0x34u8, 0x0Bu8, 0xDEu8, //sender mac
        0xC0u8, 0xA8u8, 0x01u8, 0x01u8, //sender ip 192.168.1.1
        0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, //target mac
        0xC0u8, 0xA8u8, 0x01u8, 0x02u8, //target ip 192.168.1.2
    ];

    #[test]
    fn parse_ethernet_payload() {
        let _ = env_logger::try_init();

        let data = [
            0x01u8, 0x02u8, 0x03u8, 0x04u8, 0x05u8, 0x06u8, //dst mac 01:02:03:04:05:06
            0xFFu8, 0xFEu8, 0xFDu8, 0xFCu8, 0xFBu8, 0xFAu8, //src mac FF:FE:FD:FC:FB:FA
            0x00u8, 0x04u8, //payload ethernet
            0x01u8, 0x02u8, 0x03u8, 0x04u8
        ];

        let l2 = Ethernet::parse(&data).expect("Could not parse");

        assert_eq!(l2.dst_mac.0, [0x01u8, 0x02u8, 0x03u8, 0x04u8, 0x05u8, 0x06u8]);
        assert_eq!(l2.src_mac.0, [0xFFu8, 0xFEu8, 0xFDu8, 0xFCu8, 0xFBu8, 0xFAu8]);
        assert!(l2.vlans.is_empty());
        assert_eq!(l2.ether_type, EthernetTypeId::PayloadLength(4));
        assert_eq!(l2.payload, [0x01u8, 0x02u8, 0x03u8, 0x04u8], "Payload Mismatch: {:x}", l2.payload.as_hex());
    }

    #[test]
    fn parse_arp() {
        let _ = env_logger::try_init();

        let l2 = Ethernet::parse(ARP_RAW_DATA).expect("Could not parse");

        assert_eq!(l2.ether_type, EthernetTypeId::L3(Layer3Id::Arp));
        assert_eq!(format!("{}", l2.ether_type), "ARP");
        assert_eq!(l2.payload.len(), 28);
    }

    #[test]
    fn test_single_vlan() {
        let _ = env_logger::try_init();

        let data = [
            0x01u8, 0x02u8, 0x03u8, 0x04u8, 0x05u8, 0x06u8, //dst mac 01:02:03:04:05:06
            0xFFu8, 0xFEu8, 0xFDu8, 0xFCu8, 0xFBu8, 0xFAu8, //src mac FF:FE:FD:FC:FB:FA
            0x81u8, 0x00u8, //vlan tag
            0x20u8, 0x64u8, //priority 1, vlan 100
            0x86u8, 0xDDu8, //ipv6
            0x60u8, 0x00u8, 0x00u8, 0x00u8
        ];

        let l2 = Ethernet::parse(&data).expect("Could not parse");

        assert_eq!(l2.vlans.len(), 1);
        assert_eq!(l2.vlan(), 100);
        assert_eq!(l2.ether_type, EthernetTypeId::L3(Layer3Id::IPv6));
        assert_eq!(l2.payload, [0x60u8, 0x00u8, 0x00u8, 0x00u8]);
    }

    #[test]
    fn test_multiple_vlans() {
        let _ = env_logger::try_init();

        let data = [
            0x01u8, 0x02u8, 0x03u8, 0x04u8, 0x05u8, 0x06u8, //dst mac 01:02:03:04:05:06
            0xFFu8, 0xFEu8, 0xFDu8, 0xFCu8, 0xFBu8, 0xFAu8, //src mac FF:FE:FD:FC:FB:FA
            0x88u8, 0xA8u8, //provider bridging
            0x00u8, 0x0Au8, //vlan 10
            0x81u8, 0x00u8, //vlan tag
            0x00u8, 0x14u8, //vlan 20
            0x08u8, 0x00u8, //ipv4
            0x45u8
        ];

        let l2 = Ethernet::parse(&data).expect("Could not parse");

        assert_eq!(l2.vlans.len(), 2);
        assert_eq!(l2.vlans[0].vlan_type, VlanTypeId::ProviderBridging);
        assert_eq!(l2.vlan(), 10);
        assert_eq!(l2.vlans[1].vlan(), 20);
        assert_eq!(l2.ether_type, EthernetTypeId::L3(Layer3Id::IPv4));
        assert_eq!(l2.payload, [0x45u8]);
    }

    #[test]
    fn stacked_vlans_stop_at_limit() {
        let _ = env_logger::try_init();

        let mut data = vec![0u8; 2 * crate::common::MAC_LENGTH];
        for _ in 0..131_000 {
            data.extend_from_slice(&[0x81u8, 0x00u8]);
        }

        let l2 = Ethernet::parse(&data).expect("Could not parse");

        assert_eq!(l2.vlans.len(), MAX_VLAN_TAGS);
        assert_eq!(l2.ether_type, EthernetTypeId::Vlan(VlanTypeId::VlanTagId));
        assert_eq!(format!("{}", l2.ether_type), "VLAN");
        assert_eq!(l2.payload.len(), data.len() - HEADER_LENGTH - 4 * MAX_VLAN_TAGS);
    }

    #[test]
    fn truncated_header() {
        let data = [0x01u8, 0x02u8, 0x03u8, 0x04u8, 0x05u8, 0x06u8, 0xFFu8];

        match Ethernet::parse(&data) {
            Err(nom_error::Error::Incomplete { .. }) => {}
            Err(e) => panic!("Unexpected error {:?}", e),
            Ok(_) => panic!("Parsed truncated header"),
        }
    }
}
