use serde::Serialize;

pub const MAC_LENGTH: usize = 6;

///
/// Placeholder used for addresses a frame does not carry
///
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct MacAddress(pub [u8; MAC_LENGTH]);

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

pub type Vlan = u16;

pub type Port = u16;
