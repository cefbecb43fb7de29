//! Streaming decompression.
//!
//! [`Decompressor`] is the push/pull interface: hand it whatever compressed bytes are at hand and
//! an output buffer, and it reports how much of each it used. [`decompress`] is the one-shot
//! wrapper for data that is already in memory.

use log::{error, warn};

use super::decode_state::DecodeState;
use crate::bitstream::bit_cursor::Input;
use crate::error::{BzError, DataError, Status};

/// Stream-wide decoding choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecompressOptions {
    /// Use the small-memory block buffer (about 2.5 bytes per block byte instead of 4).
    pub small: bool,
}

/// What one call to [`Decompressor::decompress`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Input bytes used. The caller presents the rest again next time.
    pub consumed: usize,
    /// Output bytes written
    pub produced: usize,
    pub status: Status,
}

/// A failure that ends the stream for good.
#[derive(Debug, Clone, Copy)]
enum Fatal {
    Data(DataError),
    Memory,
}

/// Incremental decoder for one bzip2 stream.
#[derive(Debug)]
pub struct Decompressor {
    ds: DecodeState,
    total_out: u64,
    finished: bool,
    failed: Option<Fatal>,
}

impl Decompressor {
    pub fn new(opts: DecompressOptions) -> Self {
        Self {
            ds: DecodeState::new(opts.small),
            total_out: 0,
            finished: false,
            failed: None,
        }
    }

    /// Decode from `input` into `output`. Returns `NeedMoreInput` once `input` is used up,
    /// `Ok` if `output` filled first, and `StreamEnd` after the end marker and stream CRC have
    /// been verified. Errors are final: every later call returns the same error.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, BzError> {
        match self.failed {
            Some(Fatal::Data(e)) => return Err(e.into()),
            Some(Fatal::Memory) => return Err(BzError::Memory),
            None => {}
        }
        if self.finished {
            return Err(BzError::Param("decompress called after the end of the stream"));
        }

        let mut inp = Input::new(input);
        match self.ds.run(&mut inp, output) {
            Ok((produced, status)) => {
                self.total_out += produced as u64;
                self.finished = status == Status::StreamEnd;
                Ok(Progress {
                    consumed: inp.consumed(),
                    produced,
                    status,
                })
            }
            Err(e) => {
                error!("Fatal error at {}: {}", self.ds_loc(), e);
                self.failed = match &e {
                    BzError::Data(d) => Some(Fatal::Data(*d)),
                    BzError::Memory => Some(Fatal::Memory),
                    _ => None,
                };
                Err(e)
            }
        }
    }

    fn ds_loc(&self) -> String {
        format!("byte {}", self.ds.bytes_in())
    }

    /// Compressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.ds.bytes_in()
    }

    /// Decompressed bytes produced so far
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// CRC of the current block's bytes produced so far
    pub fn block_crc(&self) -> u32 {
        self.ds.block_crc()
    }

    /// Stream CRC over the blocks completed so far
    pub fn combined_crc(&self) -> u32 {
        self.ds.combined_crc()
    }

    /// Block size digit from the stream header, once it has been read.
    pub fn block_size(&self) -> Option<u8> {
        match self.ds.block_size() {
            0 => None,
            n => Some(n),
        }
    }

    pub fn is_small(&self) -> bool {
        self.ds.is_small()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Decompress a complete bzip2 file held in memory. Concatenated streams are decoded one after
/// the other. Anything after the last stream that is not another stream is ignored with a
/// warning.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, BzError> {
    decompress_with(data, DecompressOptions::default())
}

/// As [`decompress`], with explicit options.
pub fn decompress_with(data: &[u8], opts: DecompressOptions) -> Result<Vec<u8>, BzError> {
    let mut out = Vec::with_capacity(data.len() * 4);
    let mut chunk = vec![0_u8; 1 << 16];
    let mut rest = data;

    loop {
        let mut dec = Decompressor::new(opts);
        loop {
            let progress = dec.decompress(rest, &mut chunk)?;
            out.extend_from_slice(&chunk[..progress.produced]);
            rest = &rest[progress.consumed..];
            match progress.status {
                Status::StreamEnd => break,
                Status::NeedMoreInput => {
                    error!("Compressed data ends before the end-of-stream marker.");
                    return Err(DataError::UnexpectedEof.into());
                }
                Status::Ok => {}
            }
        }
        if rest.is_empty() {
            return Ok(out);
        }
        if !rest.starts_with(b"BZh") {
            warn!("Trailing garbage after end of stream ignored ({} bytes).", rest.len());
            return Ok(out);
        }
    }
}
