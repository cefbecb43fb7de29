//! The compression module drives both directions of the codec.
//!
//! BZIP2 compression happens in the following steps:
//! - Run Length Encoding 1: Compress all runs of 4-255 identical bytes.
//! - Burrow Wheeler Transform: Sort the data to increase the probability of runs of identical bytes.
//! - Move To Front transform: Increase the frequency of lower byte values, and thereby decrease the frequency of other byte values.
//! - Run Length Encoding 2: Compress all runs of the zero byte.
//! - Huffman coding: Encode frequent byte values using smaller bit codes and less frequent byte values with longer bit codes.
//!
//! While the initial RLE1 stage is not needed for compression ratio, it is part of the format and must be preserved.
//!
//! The huffman stage makes four passes over the block to refine its tables. Up to six tables are
//! generated for each block, and every group of 50 symbols is assigned the table that codes it in
//! the fewest bits.
//!
//! Decompression is the inverse, run as a resumable state machine so that input may arrive in
//! pieces of any size:
//! - Huffman decoding and RLE 2: Expand all runs of the zero symbol.
//! - MTF transform: Convert from the Move-To-Front indices back to the symbols they represent.
//! - BWT reversal: Restore the block from the transformed data.
//! - RLE 1: Expand all runs of 4+ identical bytes.
//!
//! - compress / compress_block: the stream driver and the per-block encoder.
//! - decode_state: the resumable decoder.
//! - decompress: the `Decompressor` handle and one-shot helpers.
//! - reader: a `std::io::Read` adapter.
//!

pub mod compress;
pub mod compress_block;
pub mod decode_state;
pub mod decompress;
pub mod reader;
