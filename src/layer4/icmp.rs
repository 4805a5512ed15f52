use log::*;
use nom::*;

pub const HEADER_LENGTH: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    // 1 & 2 are Reserved
    DestinationUnreachable = 3,
    SourceQuench = 4,
    RedirectMessage = 5,
    AlternateHostAddress = 6,
    // 7 is Reserved
    EchoRequest = 8,
    RouterAdvertisement = 9,
    RouterSolicitation = 10,
    TimeExceeded = 11,
    BadIpHeader = 12,
    Timestamp = 13,
    TimestampReply = 14,
    InformationRequest = 15,
    InformationReply = 16,
    AddressMaskRequest = 17,
    AddressMaskReply = 18,
    // 19 - 29 are reserved
    Traceroute = 30,
    DatagramConversionError = 31,
    MobileHostRedirect = 32,
    WhereAreYou = 33,
    HereIAm = 34,
    MobileRegistrationRequest = 35,
    MobileRegistrationReply = 36,
    DomainNameRequest = 37,
    DomainNameReply = 38,
    SkipDiscovery = 39,
    Photuris = 40,
    IcmpExperimentalMobility = 41,
    ExtendedEchoRequest = 42,
    ExtendedEchoReply = 43,
    // 44 - 252 are reserved
    Rfc3692Experiment1 = 253,
    Rfc3692Experiment2 = 254,
    // 255 is reserved
}

impl IcmpType {
    pub fn new(value: u8) -> Option<IcmpType> {
        match value {
            0 => Some(IcmpType::EchoReply),
            3 => Some(IcmpType::DestinationUnreachable),
            4 => Some(IcmpType::SourceQuench),
            5 => Some(IcmpType::RedirectMessage),
            6 => Some(IcmpType::AlternateHostAddress),
            8 => Some(IcmpType::EchoRequest),
            9 => Some(IcmpType::RouterAdvertisement),
            10 => Some(IcmpType::RouterSolicitation),
            11 => Some(IcmpType::TimeExceeded),
            12 => Some(IcmpType::BadIpHeader),
            13 => Some(IcmpType::Timestamp),
            14 => Some(IcmpType::TimestampReply),
            15 => Some(IcmpType::InformationRequest),
            16 => Some(IcmpType::InformationReply),
            17 => Some(IcmpType::AddressMaskRequest),
            18 => Some(IcmpType::AddressMaskReply),
            30 => Some(IcmpType::Traceroute),
            31 => Some(IcmpType::DatagramConversionError),
            32 => Some(IcmpType::MobileHostRedirect),
            33 => Some(IcmpType::WhereAreYou),
            34 => Some(IcmpType::HereIAm),
            35 => Some(IcmpType::MobileRegistrationRequest),
            36 => Some(IcmpType::MobileRegistrationReply),
            37 => Some(IcmpType::DomainNameRequest),
            38 => Some(IcmpType::DomainNameReply),
            39 => Some(IcmpType::SkipDiscovery),
            40 => Some(IcmpType::Photuris),
            41 => Some(IcmpType::IcmpExperimentalMobility),
            42 => Some(IcmpType::ExtendedEchoRequest),
            43 => Some(IcmpType::ExtendedEchoReply),
            253 => Some(IcmpType::Rfc3692Experiment1),
            254 => Some(IcmpType::Rfc3692Experiment2),
            _ => None
        }
    }
}

///
/// ICMPv4 message. The payload starts after a fixed 8 byte header, even for types whose header is
/// longer.
///
#[derive(Debug)]
pub struct Icmp<'a> {
    pub type_: u8,
    pub code: u8,
    pub payload: &'a [u8],
}

impl<'a> Icmp<'a> {
    pub fn type_enum(&self) -> Option<IcmpType> {
        IcmpType::new(self.type_)
    }

    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], Icmp<'a>> {
        trace!("Available={}", input.len());

        let (payload, (type_, code)) = do_parse!(input,
            type_: be_u8 >>
            code: be_u8 >>
            take!(HEADER_LENGTH - 2) >> //checksum and rest of header
            ( (type_, code) )
        )?;

        Ok( (&payload[payload.len()..], Icmp {
            type_: type_,
            code: code,
            payload: payload,
        }) )
    }
}

impl<'a> std::fmt::Display for Icmp<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.type_enum() {
            Some(t) => write!(f, "ICMP Type: {} ({:?}) Code: {}", self.type_, t, self.code),
            None => write!(f, "ICMP Type: {} Code: {}", self.type_, self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer2::ethernet::{self, Ethernet};
    use crate::layer3::IPv4;
    use crate::tests::util::parse_hex_dump;

    // From https://www.cloudshark.org/captures/fe65ed807bc3
    const ECHO_REQUEST: &'static str = r##"
        # Frame 1: 74 bytes on wire (592 bits), 74 bytes captured (592 bits)
        # Ethernet II, Src: Vmware_34:0b:de (00:0c:29:34:0b:de), Dst: Vmware_e0:14:49 (00:50:56:e0:14:49)
        # Internet Protocol Version 4, Src: 192.168.158.139, Dst: 174.137.42.77
        # Internet Control Message Protocol
        #     Type: 8 (Echo (ping) request)
        #     Code: 0
        #     Checksum: 0x2a5c [correct]
        #     Data (32 bytes)
        0000   00 50 56 e0 14 49 00 0c 29 34 0b de 08 00 45 00  .PV..I..)4....E.
        0010   00 3c d7 43 00 00 80 01 2b 73 c0 a8 9e 8b ae 89  .<.C....+s......
        0020   2a 4d 08 00 2a 5c 02 00 21 00 61 62 63 64 65 66  *M..*\..!.abcdef
        0030   67 68 69 6a 6b 6c 6d 6e 6f 70 71 72 73 74 75 76  ghijklmnopqrstuv
        0040   77 61 62 63 64 65 66 67 68 69                    wabcdefghi
    "##;

    #[test]
    fn parse_icmp() {
        let _ = env_logger::try_init();

        let bytes = parse_hex_dump(ECHO_REQUEST);
        assert_eq!(bytes.len(), 74);

        let l2 = Ethernet::parse(&bytes).expect("Could not parse ethernet");
        assert_eq!(l2.payload.len(), 74 - ethernet::HEADER_LENGTH);

        let l3 = IPv4::parse(l2.payload).expect("Could not parse ipv4");

        let (rem, icmp) = Icmp::parse(l3.payload).expect("Could not parse icmp");

        assert!(rem.is_empty());
        assert_eq!(icmp.type_enum(), Some(IcmpType::EchoRequest));
        assert_eq!(icmp.code, 0);
        assert_eq!(icmp.payload, &b"abcdefghijklmnopqrstuvwabcdefghi"[..]);
        assert_eq!(format!("{}", icmp), "ICMP Type: 8 (EchoRequest) Code: 0");
    }

    #[test]
    fn incomplete_icmp() {
        match Icmp::parse(&[0x08u8, 0x00u8, 0x2au8]) {
            Err(Err::Incomplete(_)) => {}
            _ => panic!("Expected incomplete header"),
        }
    }
}
