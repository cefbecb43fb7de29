//! The tools module provides several helper functions for the bzip2 block codec.
//!
//! BZIP2 is a block-oriented approach to compress data.
//!
//! The tools are:
//! - cli: Command line interface for the bzcodec binary.
//! - crc: CRC32 checksum for BZIP2, both block and stream versions.
//! - randomize: The legacy block randomisation mask.
//! - rle1: Run-Length-Encoding phase 1 for BZIP2.
//! - rle2_mtf: Move-To-Front transform and Run-Length-Encoding phase 2 (integrated for speed) for BZIP2.
//! - symbol_map: Encode and decode the symbol map used in BZIP2.
//!
pub mod cli;
pub mod crc;
pub mod randomize;
pub mod rle1;
pub mod rle2_mtf;
pub mod symbol_map;
