//! CRC32 checksums for bzip2, both block and stream versions.
//!
//! bzip2 uses the MSB-first CRC-32 (polynomial 0x04C11DB7, initial value all ones, result
//! complemented). Block CRCs cover the original, uncompressed bytes of each block. The stream CRC
//! folds every block CRC together in order.

const POLY: u32 = 0x04c1_1db7;

/// Lookup table, built at compile time.
static CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 0x8000_0000 != 0 {
                (c << 1) ^ POLY
            } else {
                c << 1
            };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Continue a finished block CRC over more data. Start a new block with a crc of 0.
pub fn do_crc(crc: u32, data: &[u8]) -> u32 {
    let mut c = !crc;
    for &byte in data {
        c = (c << 8) ^ CRC_TABLE[((c >> 24) ^ byte as u32) as usize];
    }
    !c
}

/// Fold a finished block CRC into the running stream CRC.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}
