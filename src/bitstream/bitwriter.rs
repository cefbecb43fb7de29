//! BitWriter: packs the compressed bitstream for the compression side.
//!
//! Bits are queued most significant first in a 64 bit word and moved to the output buffer a byte
//! at a time. Call `finish()` to pad the last partial byte with zeros and take the output.

/// Creates a bitstream for output.
#[derive(Debug, Default)]
pub struct BitWriter {
    pub output: Vec<u8>,
    queue: u64,
    q_bits: u32,
}

impl BitWriter {
    /// Create a new BitWriter with an output buffer of the capacity specified. Suggest the
    /// capacity be set to the block size.
    pub fn new(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            queue: 0,
            q_bits: 0,
        }
    }

    /// Move every whole byte from the queue to the output buffer.
    #[inline]
    fn drain_queue(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte);
            self.q_bits -= 8;
        }
    }

    /// Put the low `n` bits (n <= 32) of `value` on the stream.
    #[inline]
    pub fn write_bits(&mut self, n: u32, value: u32) {
        debug_assert!(n <= 32);
        if n == 0 {
            return;
        }
        let mask = (1_u64 << n) - 1;
        self.queue = (self.queue << n) | (value as u64 & mask);
        self.q_bits += n;
        self.drain_queue();
    }

    /// Put a single bit on the stream.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(1, bit as u32);
    }

    /// Put a byte on the stream.
    pub fn out8(&mut self, data: u8) {
        self.write_bits(8, data as u32);
    }

    /// Put a 32 bit word on the stream, most significant byte first.
    pub fn out32(&mut self, data: u32) {
        self.write_bits(32, data);
    }

    /// Flushes the remaining bits (1-7) from the queue, padding with 0s in the least
    /// significant bits, and returns the finished output.
    pub fn finish(mut self) -> Vec<u8> {
        if self.q_bits > 0 {
            let pad = 8 - self.q_bits;
            self.write_bits(pad, 0);
        }
        self.output
    }

    /// Take the whole bytes written so far, leaving any partial byte queued.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Debugging function to return the number of bytes.bits output so far
    pub fn loc(&self) -> String {
        let bits = self.output.len() * 8 + self.q_bits as usize;
        format!("[{}.{}]", bits / 8, bits % 8)
    }
}

#[cfg(test)]
mod test {
    use super::BitWriter;

    #[test]
    fn out8_test() {
        let mut bw = BitWriter::new(10);
        bw.out8(b'x');
        assert_eq!(bw.finish(), b"x".to_vec());
    }

    #[test]
    fn last_bits_test() {
        let mut bw = BitWriter::new(10);
        bw.out8(255);
        bw.write_bits(3, 0b111);
        assert_eq!(bw.loc(), "[1.3]");
        assert_eq!(bw.finish(), vec![255, 0b1110_0000]);
    }

    #[test]
    fn out32_test() {
        let mut bw = BitWriter::new(10);
        bw.write_bit(true);
        bw.out32(0x8000_0001);
        bw.write_bits(7, 0);
        assert_eq!(bw.finish(), vec![0xc0, 0x00, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn take_bytes_test() {
        let mut bw = BitWriter::new(10);
        bw.write_bits(12, 0xabc);
        assert_eq!(bw.take_bytes(), vec![0xab]);
        bw.write_bits(4, 0xd);
        assert_eq!(bw.finish(), vec![0xcd]);
    }
}
