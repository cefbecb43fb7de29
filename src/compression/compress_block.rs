use log::{debug, info, trace};

use crate::bitstream::bitwriter::BitWriter;
use crate::bwt_algorithms::block_sort::{block_sort, bwt_last_column};
use crate::huffman_coding::huffman::{huf_encode, ITERATIONS};
use crate::tools::randomize::randomise_block;
use crate::tools::rle2_mtf::rle2_mtf_encode;

/// Called by the stream compressor, this handles one RLE1 block and writes it to the bitstream:
/// block header, BWT, MTF/RLE2 and the huffman coded symbols.
///
/// With `randomise` set the block is first scrambled with the legacy randomisation mask and the
/// randomised bit is set in the header. Modern encoders never do this.
pub fn compress_block(
    bw: &mut BitWriter,
    block: &mut [u8],
    block_crc: u32,
    work_factor: u32,
    randomise: bool,
) {
    if randomise {
        randomise_block(block);
    }

    // For each block, write the block header:
    // Six bytes of magic, 4 bytes of crc data, 1 bit for Randomized flag.
    trace!("Writing magic and CRC at {}.", bw.loc());
    bw.write_bits(24, 0x31_4159); // magic bits  1-24
    bw.write_bits(24, 0x26_5359); // magic bits 25-48
    bw.out32(block_crc);
    bw.write_bit(randomise);

    let sorted = block_sort(block, work_factor);
    if sorted.fallback {
        info!("Block of {} bytes sorted with the fallback sort.", block.len());
    }

    // Now that we have the key, we can write the 24bit BWT key
    trace!("Writing key at {}.", bw.loc());
    bw.write_bits(24, sorted.orig_ptr);

    let bwt = bwt_last_column(block, &sorted.ptr);
    let mut in_use = [false; 256];
    for &byte in block.iter() {
        in_use[byte as usize] = true;
    }
    let mtf = rle2_mtf_encode(&bwt, &in_use);

    // Now for the compression - the Huffman encoding (which also writes out data)
    huf_encode(bw, &mtf, &in_use, ITERATIONS);

    debug!(
        "         {} bytes in block, {} after MTF & RLE2 coding, {} syms in use",
        block.len(),
        mtf.mtfv.len(),
        mtf.eob + 1,
    );
    debug!("         Bit stream now at {}", bw.loc());
}

#[cfg(test)]
mod test {
    use super::compress_block;
    use crate::bitstream::bitwriter::BitWriter;

    #[test]
    fn block_header_test() {
        let mut bw = BitWriter::new(64);
        let mut block = b"banana".to_vec();
        compress_block(&mut bw, &mut block, 0x1234_5678, 30, false);
        let out = bw.finish();
        assert_eq!(&out[..6], &[0x31, 0x41, 0x59, 0x26, 0x53, 0x59]);
        assert_eq!(&out[6..10], &[0x12, 0x34, 0x56, 0x78]);
        // Randomised bit clear, then the top 7 bits of the 24 bit origin pointer (3).
        assert_eq!(out[10], 0x00);
        assert_eq!(block, b"banana".to_vec());
    }

    #[test]
    fn randomised_header_test() {
        let mut bw = BitWriter::new(64);
        let mut block = vec![b'x'; 700];
        compress_block(&mut bw, &mut block, 0, 30, true);
        let out = bw.finish();
        assert_eq!(out[10] & 0x80, 0x80);
        // Byte 617 was flipped by the mask.
        assert_eq!(block[617], b'x' ^ 1);
    }
}
