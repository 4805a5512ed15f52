use crate::layer3::errors::Error;
use crate::layer3::InternetProtocolId;
use crate::nom_error;

use arrayref::array_ref;
use log::*;
use nom::*;

use std::net::{IpAddr, Ipv4Addr};

const ADDRESS_LENGTH: usize = 4;
pub const MIN_HEADER_LENGTH: usize = 20;

#[derive(Debug)]
pub struct IPv4<'a> {
    pub header_length: usize,
    pub total_length: u16,
    pub protocol: InternetProtocolId,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub payload: &'a [u8],
    /// Set when the total length field could not be honoured and the payload was clamped to zero
    pub note: Option<String>,
}

fn to_ip_address(i: &[u8]) -> IpAddr {
    let ipv4 = Ipv4Addr::from(*array_ref![i, 0, ADDRESS_LENGTH]);
    IpAddr::V4(ipv4)
}

named!(
    ipv4_address<&[u8], IpAddr>,
    map!(take!(ADDRESS_LENGTH), to_ip_address)
);

impl<'a> IPv4<'a> {
    fn parse_header(
        input: &[u8],
        header_length: usize
    ) -> IResult<&[u8], (u16, InternetProtocolId, IpAddr, IpAddr)> {
        do_parse!(input,

            be_u8 >> //tos
            total_length: be_u16 >>
            take!(4) >> //id, flags and fragment offset
            be_u8 >> //ttl
            protocol: map!(be_u8, InternetProtocolId::new) >>
            be_u16 >> //checksum
            src_ip: ipv4_address >>
            dst_ip: ipv4_address >>
            take!(header_length - MIN_HEADER_LENGTH) >> //options

            ( (total_length, protocol, src_ip, dst_ip) )
        )
    }

    ///
    /// Parse an IPv4 header. The payload is exactly `total length - header length` bytes, or empty
    /// with a note when that length is negative or runs past the captured bytes.
    ///
    pub fn parse(input: &'a [u8]) -> Result<IPv4<'a>, Error> {
        trace!("Available={}", input.len());

        let (rem, version_ihl) = be_u8(input).map_err(nom_error::Error::from)?;
        let version = version_ihl >> 4;

        if version != 4 {
            return Err(Error::Version {
                expected: 4,
                actual: version
            });
        }

        let header_length = ((version_ihl & 0x0F) as usize) * 4;

        if header_length < MIN_HEADER_LENGTH {
            return Err(Error::HeaderLength {
                length: header_length
            });
        }

        let (rem, (total_length, protocol, src_ip, dst_ip)) = IPv4::parse_header(rem, header_length)
            .map_err(nom_error::Error::from)?;

        let (payload, note) = if (total_length as usize) < header_length {
            (
                &rem[..0],
                Some(format!("IPv4 total length {} shorter than header length {}", total_length, header_length))
            )
        } else {
            let length = total_length as usize - header_length;

            if length > rem.len() {
                (
                    &rem[..0],
                    Some(format!("IPv4 payload length {} exceeds {} captured bytes", length, rem.len()))
                )
            } else {
                (&rem[..length], None)
            }
        };

        if let Some(ref n) = note {
            debug!("{} -> {}: {}", src_ip, dst_ip, n);
        }

        Ok(IPv4 {
            header_length: header_length,
            total_length: total_length,
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
    use hex_slice::AsHex;

    use super::*;

    pub const RAW_DATA: &'static [u8] = &[
        0x45u8, //version and header length
        0x00u8, //tos
        0x00u8, 0x30u8, //length, 20 bytes for header, 28 bytes for payload
        0x00u8, 0x00u8, //id
        0x00u8, 0x00u8, //flags
        0x64u8, //ttl
        0x06u8, //protocol, tcp
        0x00u8, 0x00u8, //checksum
        0x01u8, 0x02u8, 0x03u8, 0x04u8, //src ip 1.2.3.4
        0x0Au8, 0x0Bu8, 0x0Cu8, 0x0Du8, //dst ip 10.11.12.13
        //tcp
        0xC6u8, 0xB7u8, //src port, 50871
        0x00u8, 0x50u8, //dst port, 80
        0x00u8, 0x00u8, 0x00u8, 0x01u8, //sequence number, 1
        0x00u8, 0x00u8, 0x00u8, 0x02u8, //acknowledgement number, 2
        0x50u8, 0x00u8, //header and flags, 0
        0x00u8, 0x00u8, //window
        0x00u8, 0x00u8, //check
        0x00u8, 0x00u8, //urgent
        //payload
        0x01u8, 0x02u8, 0x03u8, 0x04u8,
        0xfcu8, 0xfdu8, 0xfeu8, 0xffu8,
        //ethernet padding
        0x00u8, 0x00u8
    ];

    #[test]
    fn parse_ipv4() {
        let _ = env_logger::try_init();

        let l3 = IPv4::parse(RAW_DATA).expect("Unable to parse");

        assert_eq!(l3.src_ip, "1.2.3.4".parse::<IpAddr>().expect("Could not parse ip address"));
        assert_eq!(l3.dst_ip, "10.11.12.13".parse::<IpAddr>().expect("Could not parse ip address"));
        assert_eq!(l3.protocol, InternetProtocolId::Tcp);
        assert_eq!(l3.header_length, 20);
        assert_eq!(l3.payload.len(), 28, "Payload Mismatch: {:x}", l3.payload.as_hex());
        assert_eq!(&l3.payload[24..], [0xfcu8, 0xfdu8, 0xfeu8, 0xffu8]);
        assert!(l3.note.is_none());
    }

    #[test]
    fn parse_ipv4_options() {
        let _ = env_logger::try_init();

        let raw = [
            0x46u8, //version and header length, 6 words
            0x00u8, //tos
            0x00u8, 0x1Au8, //length, 24 bytes for header, 2 bytes for payload
            0x00u8, 0x00u8, //id
            0x00u8, 0x00u8, //flags
            0x01u8, //ttl
            0x02u8, //protocol, igmp
            0x00u8, 0x00u8, //checksum
            0xC0u8, 0xA8u8, 0x01u8, 0x01u8, //src ip 192.168.1.1
            0xE0u8, 0x00u8, 0x00u8, 0x01u8, //dst ip 224.0.0.1
            0x94u8, 0x04u8, 0x00u8, 0x00u8, //router alert option
            0x11u8, 0x64u8
        ];

        let l3 = IPv4::parse(&raw).expect("Unable to parse");

        assert_eq!(l3.header_length, 24);
        assert_eq!(l3.protocol, InternetProtocolId::Igmp);
        assert_eq!(l3.payload, [0x11u8, 0x64u8]);
    }

    #[test]
    fn clamp_short_total_length() {
        let _ = env_logger::try_init();

        let mut raw = RAW_DATA.to_vec();
        raw[2] = 0x00;
        raw[3] = 0x10; //16 bytes, less than the header

        let l3 = IPv4::parse(&raw).expect("Unable to parse");

        assert!(l3.payload.is_empty());
        assert_eq!(l3.note, Some("IPv4 total length 16 shorter than header length 20".to_string()));
    }

    #[test]
    fn clamp_long_total_length() {
        let _ = env_logger::try_init();

        let mut raw = RAW_DATA.to_vec();
        raw[2] = 0xFF;
        raw[3] = 0x48; //header length too large

        let l3 = IPv4::parse(&raw).expect("Unable to parse");

        assert!(l3.payload.is_empty());
        assert_eq!(l3.note, Some("IPv4 payload length 65332 exceeds 30 captured bytes".to_string()));
    }

    #[test]
    fn reject_bad_header_length() {
        let mut raw = RAW_DATA.to_vec();
        raw[0] = 0x44;

        match IPv4::parse(&raw) {
            Err(Error::HeaderLength { length }) => assert_eq!(length, 16),
            Err(e) => panic!("Unexpected error {:?}", e),
            Ok(_) => panic!("Parsed invalid header length"),
        }
    }

    #[test]
    fn reject_truncated_header() {
        match IPv4::parse(&RAW_DATA[..12]) {
            Err(Error::Nom(_)) => {}
            Err(e) => panic!("Unexpected error {:?}", e),
            Ok(_) => panic!("Parsed truncated header"),
        }
    }
}
