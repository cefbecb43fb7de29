//! `std::io::Read` adapter over a compressed byte source.

use std::io::{self, Read};

use log::warn;

use super::decompress::{DecompressOptions, Decompressor};
use crate::error::{BzError, DataError, Status};

const INPUT_BUFFER: usize = 1 << 16;

/// Reads decompressed bytes out of any reader of bzip2 data. Concatenated streams are read as
/// one, the way the bzip2 tool does.
#[derive(Debug)]
pub struct BzReader<R: Read> {
    inner: R,
    opts: DecompressOptions,
    dec: Decompressor,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    inner_eof: bool,
    done: bool,
}

impl<R: Read> BzReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, DecompressOptions::default())
    }

    pub fn with_options(inner: R, opts: DecompressOptions) -> Self {
        Self {
            inner,
            opts,
            dec: Decompressor::new(opts),
            buf: vec![0; INPUT_BUFFER],
            start: 0,
            end: 0,
            inner_eof: false,
            done: false,
        }
    }

    /// Compressed bytes consumed by the current stream.
    pub fn total_in(&self) -> u64 {
        self.dec.total_in()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Make sure at least `want` bytes are buffered, unless the source runs out first.
    fn fill(&mut self, want: usize) -> io::Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        while self.end < want && !self.inner_eof {
            let n = self.inner.read(&mut self.buf[self.end..])?;
            if n == 0 {
                self.inner_eof = true;
            }
            self.end += n;
        }
        Ok(())
    }

    /// After a stream ends, start on the next one if there is one.
    fn next_stream(&mut self) -> io::Result<()> {
        self.fill(3)?;
        let rest = &self.buf[self.start..self.end];
        if rest.is_empty() {
            self.done = true;
        } else if rest.starts_with(b"BZh") {
            self.dec = Decompressor::new(self.opts);
        } else {
            warn!("Trailing garbage after end of stream ignored.");
            self.done = true;
        }
        Ok(())
    }
}

impl<R: Read> Read for BzReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            if self.done {
                return Ok(0);
            }
            if self.dec.is_finished() {
                self.next_stream()?;
                continue;
            }
            if self.start == self.end {
                self.fill(1)?;
            }

            let progress = self
                .dec
                .decompress(&self.buf[self.start..self.end], out)?;
            self.start += progress.consumed;

            if progress.status == Status::NeedMoreInput && self.inner_eof && self.start == self.end
            {
                return Err(BzError::from(DataError::UnexpectedEof).into());
            }
            if progress.produced > 0 {
                return Ok(progress.produced);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use super::BzReader;

    const ONE_A: [u8; 37] = [
        0x42, 0x5a, 0x68, 0x39, 0x31, 0x41, 0x59, 0x26, 0x53, 0x59, 0x81, 0xb0, 0x2d, 0x8b,
        0x00, 0x00, 0x00, 0x04, 0x00, 0x20, 0x00, 0x20, 0x00, 0x21, 0x18, 0x46, 0x82, 0xee,
        0x48, 0xa7, 0x0a, 0x12, 0x10, 0x36, 0x05, 0xb1, 0x60,
    ];

    #[test]
    fn read_to_end_test() {
        let mut data = ONE_A.to_vec();
        data.extend_from_slice(&ONE_A);
        let mut out = Vec::new();
        BzReader::new(&data[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, b"AA".to_vec());
    }

    #[test]
    fn truncated_read_test() {
        let mut out = Vec::new();
        let err = BzReader::new(&ONE_A[..20])
            .read_to_end(&mut out)
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn bad_data_read_test() {
        let mut out = Vec::new();
        let err = BzReader::new(&b"BZh9nonsense"[..])
            .read_to_end(&mut out)
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
