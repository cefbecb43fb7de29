//! The bitstream module forms the I/O subsystem of the codec.
//!
//! bzip2 packs everything most significant bit first with no byte alignment between fields,
//! blocks, or the stream trailer. Only the final byte of a stream is padded.
//!
//! - bit_cursor: a non-blocking reader. It is lent input one chunk at a time and reports
//!   "need more input" instead of waiting, which is what lets the decoder suspend anywhere.
//! - bitwriter: the packer used when compressing.
//!
pub mod bit_cursor;
pub mod bitwriter;
