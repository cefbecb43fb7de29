//! BitCursor: the non-blocking bit source used by the decoder state machine.
//!
//! The cursor never owns the compressed data. Each call to the decoder lends it a slice of input
//! (wrapped in [`Input`]) and the cursor pulls whole bytes from that slice only when it needs them.
//! When a request cannot be satisfied the cursor keeps everything it already pulled and reports
//! `None`; the caller retries the identical request once more bytes have been supplied.
//!
//! Bits are delivered most significant first, which is how bzip2 packs them.

/// A borrowed window of compressed input with a read position.
#[derive(Debug)]
pub struct Input<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Input<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Take the next byte, if any remain.
    #[inline]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Bytes taken so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Accumulator of pending bits plus a count of how many are valid.
#[derive(Debug, Default, Clone)]
pub struct BitCursor {
    /// Pending bits, right aligned. Only the low `live` bits are meaningful.
    buffer: u64,
    /// Count of valid bits in the buffer.
    live: u32,
    /// Total bytes pulled into the buffer over the cursor's lifetime.
    bytes_in: u64,
}

impl BitCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next `n` bits (n <= 32) as an unsigned value, or None if the input ran dry
    /// first. Bytes pulled before running dry stay buffered, so a retry with more input yields
    /// exactly what a single call with all the input would have.
    #[inline]
    pub fn take_bits(&mut self, n: u32, input: &mut Input<'_>) -> Option<u32> {
        debug_assert!(n <= 32);
        while self.live < n {
            let byte = input.next_byte()?;
            // At most 31 bits are pending here, so eight more always fit.
            self.buffer = (self.buffer << 8) | byte as u64;
            self.live += 8;
            self.bytes_in += 1;
        }
        let value = (self.buffer >> (self.live - n)) & ((1_u64 << n) - 1);
        self.live -= n;
        Some(value as u32)
    }

    /// Convenience wrapper for a single bit.
    #[inline]
    pub fn take_bit(&mut self, input: &mut Input<'_>) -> Option<bool> {
        self.take_bits(1, input).map(|bit| bit == 1)
    }

    /// Convenience wrapper for a whole byte.
    #[inline]
    pub fn take_byte(&mut self, input: &mut Input<'_>) -> Option<u8> {
        self.take_bits(8, input).map(|byte| byte as u8)
    }

    /// Count of buffered, not yet delivered bits.
    #[cfg(test)]
    pub fn pending_bits(&self) -> u32 {
        self.live
    }

    /// Total bytes pulled from all inputs so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Debugging function. Report the current position as [bytes.bits] consumed.
    pub fn loc(&self) -> String {
        let bits = self.bytes_in * 8 - self.live as u64;
        format!("[{}.{}]", bits / 8, bits % 8)
    }
}
