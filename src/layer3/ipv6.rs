use crate::layer3::errors::Error;
use crate::layer3::InternetProtocolId;
use crate::nom_error;

use arrayref::array_ref;
use log::*;
use nom::*;

use std::net::{IpAddr, Ipv6Addr};

const ADDRESS_LENGTH: usize = 16;
pub const HEADER_LENGTH: usize = 40;

///
/// IPv6 packet. Only the fixed header is decoded: `protocol` is the immediate next header value,
/// extension header chains are not walked.
///
#[derive(Debug)]
pub struct IPv6<'a> {
    pub payload_length: u16,
    pub protocol: InternetProtocolId,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub payload: &'a [u8],
    pub note: Option<String>,
}

fn to_ip_address(i: &[u8]) -> IpAddr {
    let ipv6 = Ipv6Addr::from(*array_ref![i, 0, ADDRESS_LENGTH]);
    IpAddr::V6(ipv6)
}

named!(
    ipv6_address<&[u8], IpAddr>,
    map!(take!(ADDRESS_LENGTH), to_ip_address)
);

impl<'a> IPv6<'a> {
    fn parse_header(input: &[u8]) -> IResult<&[u8], (u16, InternetProtocolId, IpAddr, IpAddr)> {
        do_parse!(input,

            take!(4) >> //version, traffic class and flow label
            payload_length: be_u16 >>
            next_header: map!(be_u8, InternetProtocolId::new) >>
            be_u8 >> //hop limit
            src_ip: ipv6_address >>
            dst_ip: ipv6_address >>

            ( (payload_length, next_header, src_ip, dst_ip) )
        )
    }

    pub fn parse(input: &'a [u8]) -> Result<IPv6<'a>, Error> {
        trace!("Available={}", input.len());

        let (_, version_class) = be_u8(input).map_err(nom_error::Error::from)?;
        let version = version_class >> 4;

        if version != 6 {
            return Err(Error::Version {
                expected: 6,
                actual: version
            });
        }

        let (rem, (payload_length, protocol, src_ip, dst_ip)) = IPv6::parse_header(input)
            .map_err(nom_error::Error::from)?;

        trace!("Payload Length={}", payload_length);

        let length = payload_length as usize;

        let (payload, note) = if length > rem.len() {
            debug!("{} -> {}: payload length {} exceeds {}B", src_ip, dst_ip, length, rem.len());
            (
                &rem[..0],
                Some(format!("IPv6 payload length {} exceeds {} captured bytes", length, rem.len()))
            )
        } else {
            (&rem[..length], None)
        };

        Ok(IPv6 {
            payload_length: payload_length,
            protocol: protocol,
            src_ip: src_ip,
            dst_ip: dst_ip,
            payload: payload,
            note: note
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub const RAW_DATA: &'static [u8] = &[
        0x60u8, //version and traffic class
        0x00u8, 0x00u8, 0x00u8, //traffic class and label
        0x00u8, 0x0Cu8, //payload length, 12
        0x11u8, //next header, udp
        0x40u8, //hop limit
        0x01u8, 0x02u8, 0x03u8, 0x04u8, 0x05u8, 0x06u8, 0x07u8, 0x08u8, 0x09u8, 0x0Au8, 0x0Bu8,
        0x0Cu8, 0x0Du8, 0x0Eu8, 0x0Fu8, 0x0Fu8, //src ip 102:304:506:708:90a:b0c:d0e:f0f
        0xFEu8, 0x80u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x00u8,
        0x00u8, 0x00u8, 0x00u8, 0x00u8, 0x01u8, //dst ip fe80::1
        //udp
        0x02u8, 0x22u8, //src port, 546
        0x02u8, 0x23u8, //dst port, 547
        0x00u8, 0x0Cu8, //length, 12
        0x00u8, 0x00u8, //checksum
        0xdeu8, 0xadu8, 0xbeu8, 0xefu8, //payload
    ];

    #[test]
    fn parse_ipv6() {
        let _ = env_logger::try_init();

        let l3 = IPv6::parse(RAW_DATA).expect("Unable to parse");

        assert_eq!(
            l3.src_ip,
            "102:304:506:708:90A:B0C:D0E:F0F"
                .parse::<IpAddr>()
                .expect("Could not parse ip address")
        );
        assert_eq!(format!("{}", l3.src_ip), "102:304:506:708:90a:b0c:d0e:f0f");
        assert_eq!(format!("{}", l3.dst_ip), "fe80::1");
        assert_eq!(l3.protocol, InternetProtocolId::Udp);
        assert_eq!(l3.payload.len(), 12);
        assert!(l3.note.is_none());
    }

    #[test]
    fn clamp_payload_length() {
        let _ = env_logger::try_init();

        let mut raw = RAW_DATA.to_vec();
        raw[5] = 0x40; //64 bytes, only 12 captured

        let l3 = IPv6::parse(&raw).expect("Unable to parse");

        assert!(l3.payload.is_empty());
        assert_eq!(l3.note, Some("IPv6 payload length 64 exceeds 12 captured bytes".to_string()));
    }

    #[test]
    fn reject_truncated_header() {
        match IPv6::parse(&RAW_DATA[..30]) {
            Err(Error::Nom(_)) => {}
            Err(e) => panic!("Unexpected error {:?}", e),
            Ok(_) => panic!("Parsed truncated header"),
        }
    }

    #[test]
    fn reject_wrong_version() {
        match IPv6::parse(&[0x45u8, 0x00u8]) {
            Err(Error::Version { expected, actual }) => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 4);
            }
            Err(e) => panic!("Unexpected error {:?}", e),
            Ok(_) => panic!("Parsed wrong version"),
        }
    }
}
