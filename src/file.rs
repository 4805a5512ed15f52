use crate::errors::Error;
use crate::global_header::{GlobalHeader, GLOBAL_HEADER_LENGTH};
use crate::nom_error;
use crate::record::{PcapRecord, RecordHeader, RECORD_HEADER_LENGTH};

use log::*;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const MAX_PREALLOCATION: usize = 262_144;

///
/// Lazy reader over a libpcap capture. The global header is validated on construction, records are
/// read one at a time by iterating. Iteration stops for good at the end of the input or after the
/// first error.
///
pub struct CaptureFile<R> {
    global_header: GlobalHeader,
    reader: R,
    records_read: u64,
    finished: bool,
}

impl CaptureFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<CaptureFile<BufReader<File>>, Error> {
        let file = File::open(path.as_ref())?;

        debug!("Opened capture {:?}", path.as_ref());

        CaptureFile::new(BufReader::new(file))
    }
}

impl<R: Read> CaptureFile<R> {
    pub fn new(reader: R) -> Result<CaptureFile<R>, Error> {
        let mut reader = reader;
        let mut buffer = [0u8; GLOBAL_HEADER_LENGTH];

        let available = read_available(&mut reader, &mut buffer)?;
        let (_, header) = GlobalHeader::parse(&buffer[..available])?;

        Ok(CaptureFile {
            global_header: header,
            reader: reader,
            records_read: 0,
            finished: false,
        })
    }

    pub fn global_header(&self) -> &GlobalHeader {
        &self.global_header
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn read_record(&mut self) -> Result<Option<PcapRecord>, Error> {
        let frame = self.records_read + 1;
        let mut buffer = [0u8; RECORD_HEADER_LENGTH];

        let available = read_available(&mut self.reader, &mut buffer)?;

        if available == 0 {
            trace!("End of capture after {} records", self.records_read);
            return Ok(None);
        }

        if available < RECORD_HEADER_LENGTH {
            return Err(Error::TruncatedRecord {
                frame: frame,
                expected: RECORD_HEADER_LENGTH,
                available: available,
            });
        }

        let (_, header) = RecordHeader::parse(
            &buffer,
            self.global_header.endianness(),
            self.global_header.resolution()
        ).map_err(nom_error::Error::from)?;

        let expected = header.captured_length() as usize;

        if header.captured_length() > self.global_header.snap_length() {
            debug!(
                "Record {} captured {}B, above snap length {}B",
                frame,
                header.captured_length(),
                self.global_header.snap_length()
            );
        }

        // the declared length is untrusted until the bytes are read
        let capacity = std::cmp::min(
            std::cmp::min(expected, self.global_header.snap_length() as usize),
            MAX_PREALLOCATION
        );
        let mut payload = Vec::with_capacity(capacity);
        let available = (&mut self.reader).take(expected as u64).read_to_end(&mut payload)?;

        if available < expected {
            return Err(Error::TruncatedRecord {
                frame: frame,
                expected: expected,
                available: available,
            });
        }

        trace!("Read record {} with {}B payload", frame, available);

        self.records_read = frame;

        Ok(Some(PcapRecord::new(header, payload)))
    }
}

impl<R: Read> Iterator for CaptureFile<R> {
    type Item = Result<PcapRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_record() {
            Ok(Some(r)) => Some(Ok(r)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for CaptureFile<R> {}

///
/// Fill as much of `buffer` as the reader can provide, returning how many bytes were read. Only a
/// short count at end of input distinguishes this from `read_exact`.
///
fn read_available<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<usize, std::io::Error> {
    let mut filled = 0;

    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}
