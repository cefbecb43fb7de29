//! The huffman module builds the coding tables for the bzip2 block codec. Decoding the
//! huffman data happens in the block decoder, using the decode tables built here.
//!
//! Huffman encoding is used in lieu of arithmetic encoding because of an historical problem with licensing restrictions.
//! While that has been resolved in more recent years, the BZIP2 standard was set based on the huffman standard.
//!
//! The huffman coding algorithm as used by BZIP2 is both block and chunk oriented. Within each block, chunks of 50
//! symbols are encoded separately using one of up to six huffman tables. This allows for higher compression ratios
//! compared to using one huffman table per block.
//!
//! - huffman_code_from_weights: code lengths from symbol frequencies, capped at a maximum length.
//! - canonical: canonical codes from lengths, and the limit/base/perm decode tables.
//! - huffman: the multi-table block encoder.
//!

pub mod canonical;
pub mod huffman;
pub mod huffman_code_from_weights;
