//! Run-Length-Encoding phase 1 for the bzip2 block codec.
//!
//! Before the block sort, runs of 4 to 255 identical bytes are written as four copies of the byte
//! followed by a count byte holding (run length - 4). Runs longer than 255 are split. Shorter runs
//! are copied as they are. The decoder undoes this while it walks the inverse BWT chain.
//!
//! The block CRC is computed here, over the original bytes, as each run is written to the block.
//! A run that is still open when the block fills up is carried into the next block, and so is
//! its CRC contribution.

use super::crc::do_crc;

/// Longest run a single count byte can describe.
const MAX_RUN: u32 = 255;

/// Reserve left at the end of a block, so that writing out the open run can never overflow it.
pub const BLOCK_RESERVE: usize = 19;

/// Fills one block at a time with RLE1 output.
#[derive(Debug)]
pub struct Rle1Encoder {
    /// Byte of the open run, if any
    run_ch: Option<u8>,
    /// Length of the open run (1..=255)
    run_len: u32,
    /// Most RLE1 bytes the block may hold
    capacity: usize,
    /// RLE1 output for the current block
    pub data: Vec<u8>,
    /// CRC of the original bytes written into the current block
    pub block_crc: u32,
}

impl Rle1Encoder {
    /// Create an encoder for blocks of `block_size` * 100k bytes.
    pub fn new(block_size: u8) -> Self {
        let capacity = block_size as usize * 100_000 - BLOCK_RESERVE;
        Self {
            run_ch: None,
            run_len: 0,
            capacity,
            data: Vec::with_capacity(capacity + BLOCK_RESERVE),
            block_crc: 0,
        }
    }

    /// Has the current block reached its capacity?
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// True when no byte at all is waiting, in the block or in an open run.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.run_ch.is_none()
    }

    /// Feed input until it is used up or the block is full. Returns the count of bytes taken.
    pub fn push(&mut self, input: &[u8]) -> usize {
        let mut used = 0;
        for &byte in input {
            if self.is_full() {
                break;
            }
            self.add_byte(byte);
            used += 1;
        }
        used
    }

    #[inline]
    fn add_byte(&mut self, byte: u8) {
        match self.run_ch {
            Some(ch) if ch == byte && self.run_len < MAX_RUN => self.run_len += 1,
            _ => {
                self.flush_run();
                self.run_ch = Some(byte);
                self.run_len = 1;
            }
        }
    }

    /// Write out the open run, if any. Called once the input is exhausted.
    pub fn flush_run(&mut self) {
        if let Some(ch) = self.run_ch.take() {
            let len = self.run_len as usize;
            self.block_crc = do_crc(self.block_crc, &[ch; MAX_RUN as usize][..len]);
            if len < 4 {
                self.data.extend(std::iter::repeat(ch).take(len));
            } else {
                self.data.extend_from_slice(&[ch; 4]);
                self.data.push((len - 4) as u8);
            }
            self.run_len = 0;
        }
    }

    /// Hand over the finished block and its CRC, leaving the encoder ready for the next one.
    /// Any open run stays with the encoder.
    pub fn take_block(&mut self) -> (Vec<u8>, u32) {
        let data = std::mem::replace(
            &mut self.data,
            Vec::with_capacity(self.capacity + BLOCK_RESERVE),
        );
        let crc = std::mem::take(&mut self.block_crc);
        (data, crc)
    }
}

#[cfg(test)]
mod test {
    use super::Rle1Encoder;
    use crate::tools::crc::do_crc;

    fn encode(input: &[u8]) -> Vec<u8> {
        let mut enc = Rle1Encoder::new(1);
        assert_eq!(enc.push(input), input.len());
        enc.flush_run();
        enc.take_block().0
    }

    #[test]
    fn short_runs_test() {
        assert_eq!(encode(b"aabbbc"), b"aabbbc".to_vec());
        assert_eq!(encode(b""), Vec::<u8>::new());
    }

    #[test]
    fn run_of_four_test() {
        assert_eq!(encode(b"xaaaay"), vec![b'x', b'a', b'a', b'a', b'a', 0, b'y']);
    }

    #[test]
    fn long_run_test() {
        let input = vec![7_u8; 300];
        // 255 = 4 + 251, then 45 = 4 + 41
        assert_eq!(encode(&input), vec![7, 7, 7, 7, 251, 7, 7, 7, 7, 41]);
    }

    #[test]
    fn crc_covers_original_bytes_test() {
        let input = b"hello wooooooooorld";
        let mut enc = Rle1Encoder::new(1);
        enc.push(input);
        enc.flush_run();
        let (data, crc) = enc.take_block();
        assert!(data.len() < input.len());
        assert_eq!(crc, do_crc(0, input));
    }

    #[test]
    fn block_fills_test() {
        let input: Vec<u8> = (0..200_000_u32).map(|i| (i % 7) as u8).collect();
        let mut enc = Rle1Encoder::new(1);
        let used = enc.push(&input);
        assert!(enc.is_full());
        // The last byte taken is still an open run, so it is not in this block yet.
        assert_eq!(used, 100_000 - 19 + 1);
        let (first, crc) = enc.take_block();
        assert_eq!(first.len(), 100_000 - 19);
        assert_eq!(crc, do_crc(0, &input[..used - 1]));
        assert!(!enc.is_empty());
    }
}
