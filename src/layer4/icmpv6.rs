use log::*;
use nom::*;

pub const HEADER_LENGTH: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Icmpv6Type {
    DestinationUnreachable = 1,
    PacketTooBig = 2,
    TimeExceeded = 3,
    ParameterProblem = 4,
    EchoRequest = 128,
    EchoReply = 129,
    MulticastListenerQuery = 130,
    MulticastListenerReport = 131,
    MulticastListenerDone = 132,
    RouterSolicitation = 133,
    RouterAdvertisement = 134,
    NeighborSolicitation = 135,
    NeighborAdvertisement = 136,
    Redirect = 137,
    MulticastListenerReportV2 = 143,
}

impl Icmpv6Type {
    pub fn new(value: u8) -> Option<Icmpv6Type> {
        match value {
            1 => Some(Icmpv6Type::DestinationUnreachable),
            2 => Some(Icmpv6Type::PacketTooBig),
            3 => Some(Icmpv6Type::TimeExceeded),
            4 => Some(Icmpv6Type::ParameterProblem),
            128 => Some(Icmpv6Type::EchoRequest),
            129 => Some(Icmpv6Type::EchoReply),
            130 => Some(Icmpv6Type::MulticastListenerQuery),
            131 => Some(Icmpv6Type::MulticastListenerReport),
            132 => Some(Icmpv6Type::MulticastListenerDone),
            133 => Some(Icmpv6Type::RouterSolicitation),
            134 => Some(Icmpv6Type::RouterAdvertisement),
            135 => Some(Icmpv6Type::NeighborSolicitation),
            136 => Some(Icmpv6Type::NeighborAdvertisement),
            137 => Some(Icmpv6Type::Redirect),
            143 => Some(Icmpv6Type::MulticastListenerReportV2),
            _ => None
        }
    }
}

///
/// ICMPv6 message. Only the type is reported; like ICMPv4 the payload follows a fixed 8 byte header.
///
#[derive(Debug)]
pub struct IcmpV6<'a> {
    pub type_: u8,
    pub payload: &'a [u8],
}

impl<'a> IcmpV6<'a> {
    pub fn type_enum(&self) -> Option<Icmpv6Type> {
        Icmpv6Type::new(self.type_)
    }

    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], IcmpV6<'a>> {
        trace!("Available={}", input.len());

        let (payload, type_) = do_parse!(input,
            type_: be_u8 >>
            take!(HEADER_LENGTH - 1) >> //code, checksum and message specific header
            (type_)
        )?;

        Ok( (&payload[payload.len()..], IcmpV6 {
            type_: type_,
            payload: payload,
        }) )
    }
}

impl<'a> std::fmt::Display for IcmpV6<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.type_enum() {
            Some(t) => write!(f, "ICMPv6 Type: {} ({:?})", self.type_, t),
            None => write!(f, "ICMPv6 Type: {}", self.type_),
        }
    }
}
