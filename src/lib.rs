//! Rust implementation of the bzip2 block codec.
//!
//! Provides compression and decompression in the bzip2 format, bit-compatible with the standard
//! bzip2 tool in both directions.
//!
//! The decoder is resumable: it accepts compressed input in chunks of any size, down to a byte at
//! a time, and can stop whenever the caller's output buffer fills. The encoder sorts blocks with
//! a fast main sort and switches to a fallback sort with a guaranteed worst case when a block is
//! too repetitive.
//!
//! Basic usage:
//!
//! ```
//! use bzcodec::{compress, decompress, CompressOptions};
//!
//! let packed = compress(b"hello hello hello", &CompressOptions::default()).unwrap();
//! assert_eq!(decompress(&packed).unwrap(), b"hello hello hello".to_vec());
//! ```
//!
//! The `bzcodec` binary wraps the same calls:
//!
//! `$> bzcodec -z test.txt`
//!
//! This will compress the file and create the file test.txt.bz2.
//! The input file is deleted unless `--keep` is given.
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{compress, compress_stream, CompressOptions};
pub use compression::decompress::{
    decompress, decompress_with, DecompressOptions, Decompressor, Progress,
};
pub use compression::reader::BzReader;
pub use error::{BzError, DataError, ErrorCode, Status};
