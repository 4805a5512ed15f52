use crate::common::Port;

use log::*;
use nom::*;

pub const MIN_HEADER_LENGTH: usize = 20;

#[derive(Debug)]
pub struct Tcp<'a> {
    pub dst_port: Port,
    pub src_port: Port,
    /// Header length from the data offset, 0 when the header was cut short
    pub header_length: usize,
    pub payload: &'a [u8]
}

impl<'a> Tcp<'a> {
    fn extract_length(value: u8) -> usize {
        let words = value >> 4;
        (words as usize) * 4
    }

    ///
    /// Parse the fixed part of a TCP header. Options are skipped using the data offset, which must
    /// fall between the fixed header size and the end of `input`.
    ///
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], Tcp<'a>> {
        trace!("Available={}", input.len());

        let (rem, (src_port, dst_port, header_length)) = do_parse!(input,

            src_port: be_u16 >>
            dst_port: be_u16 >>
            take!(8) >> //sequence and acknowledgement numbers
            header_length: map!(be_u8, Tcp::extract_length) >>
            take!(7) >> //flags, window, checksum and urgent pointer

            ( (src_port, dst_port, header_length) )
        )?;

        if header_length < MIN_HEADER_LENGTH {
            return Err(Err::Error(error_position!(rem, ErrorKind::Custom(header_length as u32))));
        }

        let (payload, _options) = take!(rem, header_length - MIN_HEADER_LENGTH)?;

        // the segment payload runs to the end of the network payload
        Ok( (&payload[payload.len()..], Tcp {
            dst_port: dst_port,
            src_port: src_port,
            header_length: header_length,
            payload: payload
        }) )
    }
}
