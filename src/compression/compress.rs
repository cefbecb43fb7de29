use std::io::{self, Read, Write};

use log::{debug, info};

use super::compress_block::compress_block;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::BzError;
use crate::tools::crc::do_stream_crc;
use crate::tools::rle1::Rle1Encoder;

/// Work factor used when the caller leaves it at 0.
pub const DEFAULT_WORK_FACTOR: u32 = 30;

const READ_CHUNK: usize = 1 << 16;

/// Compression settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Block size in units of 100k, 1..=9.
    pub block_size: u8,
    /// How hard the main sort tries before handing a block to the fallback sort, 0..=250.
    /// 0 selects the default of 30. The sorter clamps the value into 1..=100.
    pub work_factor: u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            block_size: 9,
            work_factor: 0,
        }
    }
}

impl CompressOptions {
    pub fn new(block_size: u8) -> Self {
        Self {
            block_size,
            ..Default::default()
        }
    }

    pub fn with_work_factor(mut self, work_factor: u32) -> Self {
        self.work_factor = work_factor;
        self
    }

    pub fn validate(&self) -> Result<(), BzError> {
        if !(1..=9).contains(&self.block_size) {
            return Err(BzError::Param("block size must be between 1 and 9"));
        }
        if self.work_factor > 250 {
            return Err(BzError::Param("work factor must be between 0 and 250"));
        }
        Ok(())
    }

    fn effective_work_factor(&self) -> u32 {
        match self.work_factor {
            0 => DEFAULT_WORK_FACTOR,
            wf => wf,
        }
    }
}

/// Compress `data` into a complete bzip2 stream.
pub fn compress(data: &[u8], opts: &CompressOptions) -> Result<Vec<u8>, BzError> {
    let mut out = Vec::with_capacity(data.len() / 2 + 64);
    compress_stream(data, &mut out, opts)?;
    Ok(out)
}

/// Compress everything `input` yields into `output`. Returns the count of bytes written.
pub fn compress_stream<R: Read, W: Write>(
    input: R,
    output: W,
    opts: &CompressOptions,
) -> Result<u64, BzError> {
    encode_stream(input, output, opts, false)
}

/// As [`compress`], but emitting legacy randomised blocks.
#[cfg(test)]
pub(crate) fn compress_randomised(data: &[u8], opts: &CompressOptions) -> Result<Vec<u8>, BzError> {
    let mut out = Vec::new();
    encode_stream(data, &mut out, opts, true)?;
    Ok(out)
}

/// Read until `buf` holds something or the source is exhausted.
fn read_some<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// The stream driver: fill blocks with RLE1 output, compress each one as it fills, and finish
/// with the end-of-stream marker and stream CRC.
fn encode_stream<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    opts: &CompressOptions,
    randomise: bool,
) -> Result<u64, BzError> {
    opts.validate()?;
    let work_factor = opts.effective_work_factor();
    let mut bw = BitWriter::new(opts.block_size as usize * 100_000);
    let mut rle = Rle1Encoder::new(opts.block_size);
    let mut stream_crc = 0_u32;
    let mut block_no = 0_u32;
    let mut bytes_in = 0_u64;
    let mut bytes_out = 0_u64;

    // Stream header
    bw.out8(b'B');
    bw.out8(b'Z');
    bw.out8(b'h');
    bw.out8(b'0' + opts.block_size);

    let mut write_block = |rle: &mut Rle1Encoder, bw: &mut BitWriter| -> io::Result<u64> {
        let (mut block, block_crc) = rle.take_block();
        block_no += 1;
        stream_crc = do_stream_crc(stream_crc, block_crc);
        info!("Starting block {}", block_no);
        debug!(
            "Block crc is {:#010x}, stream crc is {:#010x}",
            block_crc, stream_crc
        );
        compress_block(bw, &mut block, block_crc, work_factor, randomise);
        let bytes = bw.take_bytes();
        output.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    };

    let mut buf = vec![0_u8; READ_CHUNK];
    loop {
        let n = read_some(&mut input, &mut buf)?;
        if n == 0 {
            break;
        }
        bytes_in += n as u64;
        let mut chunk = &buf[..n];
        while !chunk.is_empty() {
            let used = rle.push(chunk);
            chunk = &chunk[used..];
            if rle.is_full() {
                bytes_out += write_block(&mut rle, &mut bw)?;
            }
        }
    }
    rle.flush_run();
    if !rle.is_empty() {
        bytes_out += write_block(&mut rle, &mut bw)?;
    }

    // End of stream magic, stream CRC, and pad to a whole byte.
    bw.write_bits(24, 0x17_7245);
    bw.write_bits(24, 0x38_5090);
    bw.out32(stream_crc);
    let tail = bw.finish();
    output.write_all(&tail)?;
    output.flush()?;
    bytes_out += tail.len() as u64;

    info!(
        "{} bytes in, {} bytes out in {} blocks, stream crc {:#010x}",
        bytes_in, bytes_out, block_no, stream_crc
    );
    Ok(bytes_out)
}

#[cfg(test)]
mod test {
    use super::{compress, compress_randomised, CompressOptions};
    use crate::compression::decompress::decompress;
    use crate::error::BzError;

    #[test]
    fn empty_input_test() {
        let out = compress(b"", &CompressOptions::default()).unwrap();
        assert_eq!(
            out,
            vec![0x42, 0x5a, 0x68, 0x39, 0x17, 0x72, 0x45, 0x38, 0x50, 0x90, 0, 0, 0, 0]
        );
        assert_eq!(decompress(&out).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_byte_test() {
        let out = compress(b"A", &CompressOptions::default()).unwrap();
        assert_eq!(&out[..4], b"BZh9");
        // Block CRC of "A", as libbzip2 computes it.
        assert_eq!(&out[10..14], &[0x81, 0xb0, 0x2d, 0x8b]);
        assert_eq!(decompress(&out).unwrap(), b"A".to_vec());
    }

    #[test]
    fn options_test() {
        assert!(CompressOptions::new(0).validate().is_err());
        assert!(CompressOptions::new(10).validate().is_err());
        assert!(CompressOptions::new(1).with_work_factor(251).validate().is_err());
        assert!(CompressOptions::new(1).with_work_factor(250).validate().is_ok());
        assert!(matches!(
            compress(b"x", &CompressOptions::new(0)),
            Err(BzError::Param(_))
        ));
        assert_eq!(compress(b"x", &CompressOptions::new(3)).unwrap()[3], b'3');
    }

    #[test]
    fn multi_block_test() {
        let data: Vec<u8> = (0..250_000_u32).map(|i| (i % 251) as u8 ^ (i / 997) as u8).collect();
        let out = compress(&data, &CompressOptions::new(1)).unwrap();
        assert_eq!(decompress(&out).unwrap(), data);
    }

    #[test]
    fn long_runs_test() {
        let mut data = vec![b'a'; 1000];
        data.extend(vec![b'b'; 255]);
        data.extend(vec![b'c'; 256]);
        data.extend(vec![b'd'; 4]);
        let out = compress(&data, &CompressOptions::new(1)).unwrap();
        assert_eq!(decompress(&out).unwrap(), data);
    }

    #[test]
    fn randomised_round_trip_test() {
        let data: Vec<u8> = b"randomised blocks still decode to the same bytes. "
            .iter()
            .cycle()
            .take(5_000)
            .copied()
            .collect();
        let plain = compress(&data, &CompressOptions::new(1)).unwrap();
        let random = compress_randomised(&data, &CompressOptions::new(1)).unwrap();
        assert_ne!(plain, random);
        assert_eq!(decompress(&random).unwrap(), data);
        assert_eq!(decompress(&plain).unwrap(), data);
    }
}
