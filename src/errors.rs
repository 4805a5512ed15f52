use thiserror::Error as ThisError;

///
/// Fatal errors while reading a capture. Any of these stops the parse; records decoded before the
/// failure are still handed back through `PartialCapture`.
///
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid capture magic number {magic:#010x}")]
    InvalidMagicNumber {
        magic: u32
    },
    #[error("Capture header truncated: {available} of {expected} bytes available")]
    TruncatedHeader {
        expected: usize,
        available: usize
    },
    #[error("Record {frame} truncated: {expected} bytes declared, {available} bytes remain")]
    TruncatedRecord {
        frame: u64,
        expected: usize,
        available: usize
    },
    #[error("Nom error while parsing capture: {0}")]
    Nom(#[from] crate::nom_error::Error),
}

impl Error {
    ///
    /// True when the input is not a parseable capture, as opposed to an error from the byte source
    ///
    pub fn is_format_error(&self) -> bool {
        match self {
            Error::Io(_) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_errors() {
        let err = Error::InvalidMagicNumber { magic: 0 };
        assert!(err.is_format_error());
        assert_eq!(format!("{}", err), "Invalid capture magic number 0x00000000");

        let err = Error::TruncatedRecord { frame: 2, expected: 81, available: 10 };
        assert!(err.is_format_error());
        assert_eq!(format!("{}", err), "Record 2 truncated: 81 bytes declared, 10 bytes remain");

        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(!err.is_format_error());
    }
}
