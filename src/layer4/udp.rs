use crate::common::Port;

use log::*;
use nom::*;

pub const HEADER_LENGTH: usize = 4 * std::mem::size_of::<u16>();

#[derive(Debug)]
pub struct Udp<'a> {
    pub dst_port: Port,
    pub src_port: Port,
    pub length: u16,
    pub payload: &'a [u8],
}

impl<'a> Udp<'a> {
    ///
    /// Parse a UDP header. The payload is bounded by the length field and by the bytes available.
    ///
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], Udp<'a>> {
        trace!("Available={}", input.len());

        let (rem, (src_port, dst_port, length)) = do_parse!(
            input,
            src_port: be_u16
                >> dst_port: be_u16
                >> length: be_u16
                >> be_u16 //checksum
                >> ( (src_port, dst_port, length) )
        )?;

        if (length as usize) < HEADER_LENGTH {
            return Err(Err::Error(error_position!(rem, ErrorKind::Custom(length as u32))));
        }

        let payload_length = std::cmp::min(length as usize - HEADER_LENGTH, rem.len());
        let (payload, rem) = (&rem[..payload_length], &rem[payload_length..]);

        Ok( (rem, Udp {
            dst_port: dst_port,
            src_port: src_port,
            length: length,
            payload: payload
        }) )
    }
}
