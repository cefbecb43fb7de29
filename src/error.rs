//! Error and status types shared by the compression and decompression sides.
//!
//! Any violation of the bzip2 wire format is a `DataError` and is fatal for the stream being
//! decoded. There is no attempt to skip a damaged block and resynchronise.

use thiserror::Error;

/// Why a compressed stream was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataError {
    /// The stream does not start with `BZh`.
    #[error("not a bzip2 stream (bad signature)")]
    BadMagic,

    /// The block size digit after `BZh` is not `1`..`9`.
    #[error("invalid block size digit {0:#04x}")]
    BadBlockSize(u8),

    /// Neither a block header nor an end-of-stream marker where one was expected.
    #[error("bad block header magic")]
    BadBlockMarker,

    /// The end-of-stream marker started correctly but was not completed.
    #[error("bad end-of-stream magic")]
    BadEndMarker,

    #[error("huffman group count {0} outside 2..=6")]
    GroupCount(u32),

    #[error("block declares no selectors")]
    NoSelectors,

    #[error("selector refers to a missing huffman group")]
    SelectorRange,

    #[error("block uses no byte values")]
    NoSymbolsInUse,

    #[error("huffman code length {0} outside 1..=20")]
    CodeLength(i32),

    /// A code did not terminate within 20 bits.
    #[error("huffman code longer than 20 bits")]
    CodeOverrun,

    /// A code terminated but falls outside the table's code space.
    #[error("huffman code outside the decode table")]
    CodeRange,

    #[error("decoded symbol outside the block alphabet")]
    SymbolRange,

    /// More symbol groups were decoded than selectors were sent.
    #[error("block uses more groups than it has selectors")]
    SelectorOverrun,

    #[error("run length overflow")]
    RunOverflow,

    #[error("block holds more bytes than the block size allows")]
    BlockOverflow,

    #[error("BWT origin pointer outside the block")]
    OrigPtr,

    #[error("cumulative frequency table out of range")]
    Cftab,

    /// The inverse transform walked outside the block.
    #[error("inverse BWT chain left the block")]
    CorruptBlock,

    #[error("block CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    BlockCrc { stored: u32, computed: u32 },

    #[error("stream CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    StreamCrc { stored: u32, computed: u32 },

    /// The input ended before the end-of-stream marker.
    #[error("compressed stream ended before its end marker")]
    UnexpectedEof,
}

/// Library error type.
#[derive(Error, Debug)]
pub enum BzError {
    /// Malformed or corrupt compressed data.
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// The block buffer could not be allocated.
    #[error("unable to allocate the block buffer")]
    Memory,

    /// The caller supplied an invalid parameter or used a finished stream.
    #[error("parameter error: {0}")]
    Param(&'static str),

    /// Propagated I/O error from the reader/writer adapters.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Numeric outcome family, matching the classic bzip2 return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    DataError,
    DataErrorMagic,
    MemoryError,
    ParamError,
    IoError,
}

impl BzError {
    /// Classify this error the way the reference library reports it.
    pub fn code(&self) -> ErrorCode {
        match self {
            BzError::Data(DataError::BadMagic | DataError::BadBlockSize(_)) => {
                ErrorCode::DataErrorMagic
            }
            BzError::Data(_) => ErrorCode::DataError,
            BzError::Memory => ErrorCode::MemoryError,
            BzError::Param(_) => ErrorCode::ParamError,
            BzError::Io(_) => ErrorCode::IoError,
        }
    }
}

impl From<BzError> for std::io::Error {
    fn from(err: BzError) -> Self {
        match err {
            BzError::Io(e) => e,
            BzError::Memory => std::io::Error::new(std::io::ErrorKind::OutOfMemory, err),
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}

/// Non-error outcome of a decompression call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made and the output buffer is full. Call again with more output space.
    Ok,
    /// All supplied input has been used. Call again with more input.
    NeedMoreInput,
    /// The end-of-stream marker was read and the combined CRC matched.
    StreamEnd,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_test() {
        assert_eq!(BzError::from(DataError::BadMagic).code(), ErrorCode::DataErrorMagic);
        assert_eq!(BzError::from(DataError::OrigPtr).code(), ErrorCode::DataError);
        assert_eq!(BzError::Memory.code(), ErrorCode::MemoryError);
        assert_eq!(BzError::Param("x").code(), ErrorCode::ParamError);
    }

    #[test]
    fn io_conversion_test() {
        let err: std::io::Error = BzError::from(DataError::Cftab).into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
