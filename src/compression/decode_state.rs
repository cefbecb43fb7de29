//! The resumable bzip2 decoder.
//!
//! Decoding is a walk through the grammar of the format, one [`State`] at a time. Every state
//! reads a fixed number of bits (or none) and then moves on. When the input runs dry the walk
//! simply stops and [`DecodeState::run`] returns `NeedMoreInput`. Everything needed to pick up at
//! the same place later lives in the `DecodeState` itself, so feeding a stream one byte at a time
//! gives exactly the same result as feeding it all at once.
//!
//! Stream layout, for reference:
//! ```text
//! "BZh" <size digit>
//! { 0x314159265359 <block crc:32> <randomised:1> <orig ptr:24>
//!   <symbol map> <groups:3> <selectors:15> <unary selectors>
//!   <coding tables> <huffman coded symbols> }*
//! 0x177245385090 <stream crc:32> <pad to byte>
//! ```

use log::{debug, info, trace};

use crate::bitstream::bit_cursor::{BitCursor, Input};
use crate::bwt_algorithms::inverse::BlockBuffer;
use crate::error::{BzError, DataError, Status};
use crate::huffman_coding::canonical::{length_range, DecodeTable};
use crate::huffman_coding::huffman::{GROUP_SIZE, MAX_ALPHA_SIZE, MAX_TABLES};
use crate::tools::crc::{do_crc, do_stream_crc};
use crate::tools::randomize::RandState;
use crate::tools::rle2_mtf::{RUNA, RUNB};
use crate::tools::symbol_map::decode_sym_map;

const SIGNATURE: [u8; 3] = *b"BZh";
const BLOCK_MAGIC: [u8; 6] = [0x31, 0x41, 0x59, 0x26, 0x53, 0x59];
const END_MAGIC: [u8; 6] = [0x17, 0x72, 0x45, 0x38, 0x50, 0x90];

/// Most selectors a 900k block can use. Streams may send more; the extras are read and dropped.
pub const MAX_SELECTORS: usize = 2 + 900_000 / GROUP_SIZE;
/// Longest huffman code a stream may use
const MAX_CODE_LEN: usize = 20;
/// Largest RUNA/RUNB weight accepted before a run is declared bogus
const MAX_RUN_WEIGHT: u32 = 2 * 1024 * 1024;

/// Position in the stream grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Byte `n` of "BZh"
    Signature(u8),
    BlockSize,
    /// Byte `n` of the block magic. Byte 0 also recognises the end-of-stream magic.
    BlockMagic(u8),
    /// Byte `n` of the end-of-stream magic
    EndMagic(u8),
    /// Byte `n` of the stored block CRC
    BlockCrc(u8),
    Randomised,
    /// Byte `n` of the origin pointer
    OrigPtr(u8),
    MapIndex,
    MapWord,
    GroupCount,
    SelectorCount,
    /// Next bit of a unary coded selector
    SelectorBit,
    /// 5-bit starting length of a coding table
    CodingStart,
    /// First delta bit: 0 ends the current symbol's length
    CodingStop,
    /// Second delta bit: 0 increments the length, 1 decrements it
    CodingDelta,
    /// First `zn` bits of a huffman code
    SymbolFirst,
    /// One more bit of a huffman code
    SymbolMore,
    /// Emitting the block through the inverse BWT and RLE1 decoder
    Output,
    /// Byte `n` of the stored stream CRC
    StreamCrc(u8),
    /// The stream ended cleanly
    Idle,
}

/// Everything the decoder of one stream needs between calls.
#[derive(Debug)]
pub struct DecodeState {
    pub state: State,
    bc: BitCursor,
    small: bool,
    block_size: u8,
    buf: Option<BlockBuffer>,
    block_no: u32,

    // Block header
    stored_block_crc: u32,
    stored_combined_crc: u32,
    randomised: bool,
    orig_ptr: u32,

    // Symbol map
    map_words: Vec<u16>,
    seq_to_unseq: Vec<u8>,
    alpha_size: usize,

    // Selectors
    n_groups: usize,
    n_selectors: usize,
    sel_read: usize,
    sel_j: usize,
    selector_mtf: Vec<u8>,
    selectors: Vec<u8>,

    // Coding tables
    lengths: [[u8; MAX_ALPHA_SIZE]; MAX_TABLES],
    tables: Vec<DecodeTable>,
    t: usize,
    sym_i: usize,
    curr: i32,

    // Huffman coded symbols
    group_no: usize,
    group_pos: usize,
    g_sel: usize,
    zn: usize,
    zvec: i32,
    /// Length of the pending RUNA/RUNB run
    es: u32,
    /// Weight of the next RUNA/RUNB symbol. 1 when no run is open.
    run_n: u32,
    mtf: [u8; 256],
    unzftab: [u32; 256],
    nblock: usize,

    // Output
    rand: Option<RandState>,
    k0: u8,
    state_out_ch: u8,
    state_out_len: u32,
    nblock_used: usize,
    block_crc: u32,
    combined_crc: u32,
}

/// Follow one link of the inverse BWT, undoing the randomisation if the block has it.
#[inline]
fn next_byte(buf: &mut BlockBuffer, rand: &mut Option<RandState>) -> Result<u8, DataError> {
    let byte = buf.next_byte()?;
    Ok(match rand {
        Some(rs) => byte ^ rs.next_mask(),
        None => byte,
    })
}

impl DecodeState {
    pub fn new(small: bool) -> Self {
        Self {
            state: State::Signature(0),
            bc: BitCursor::new(),
            small,
            block_size: 0,
            buf: None,
            block_no: 0,
            stored_block_crc: 0,
            stored_combined_crc: 0,
            randomised: false,
            orig_ptr: 0,
            map_words: Vec::with_capacity(17),
            seq_to_unseq: Vec::with_capacity(256),
            alpha_size: 0,
            n_groups: 0,
            n_selectors: 0,
            sel_read: 0,
            sel_j: 0,
            selector_mtf: Vec::new(),
            selectors: Vec::new(),
            lengths: [[0; MAX_ALPHA_SIZE]; MAX_TABLES],
            tables: Vec::with_capacity(MAX_TABLES),
            t: 0,
            sym_i: 0,
            curr: 0,
            group_no: 0,
            group_pos: 0,
            g_sel: 0,
            zn: 0,
            zvec: 0,
            es: 0,
            run_n: 1,
            mtf: [0; 256],
            unzftab: [0; 256],
            nblock: 0,
            rand: None,
            k0: 0,
            state_out_ch: 0,
            state_out_len: 0,
            nblock_used: 0,
            block_crc: 0,
            combined_crc: 0,
        }
    }

    /// Block size digit from the stream header, 0 until it has been read.
    pub fn block_size(&self) -> u8 {
        self.block_size
    }

    pub fn is_small(&self) -> bool {
        self.small
    }

    /// CRC of the bytes emitted so far for the current block
    pub fn block_crc(&self) -> u32 {
        self.block_crc
    }

    /// Stream CRC folded over every completed block
    pub fn combined_crc(&self) -> u32 {
        self.combined_crc
    }

    /// Bytes pulled into the bit cursor so far.
    pub fn bytes_in(&self) -> u64 {
        self.bc.bytes_in()
    }

    /// Decode as far as `input` and `output` allow. Returns the count of bytes written to
    /// `output` and why decoding stopped.
    pub fn run(
        &mut self,
        input: &mut Input<'_>,
        output: &mut [u8],
    ) -> Result<(usize, Status), BzError> {
        let mut pos = 0;

        // Take the value or suspend until more input arrives.
        macro_rules! need {
            ($e:expr) => {
                match $e {
                    Some(v) => v,
                    None => return Ok((pos, Status::NeedMoreInput)),
                }
            };
        }

        loop {
            match self.state {
                State::Signature(n) => {
                    let byte = need!(self.bc.take_byte(input));
                    if byte != SIGNATURE[n as usize] {
                        return Err(DataError::BadMagic.into());
                    }
                    self.state = if n == 2 {
                        State::BlockSize
                    } else {
                        State::Signature(n + 1)
                    };
                }
                State::BlockSize => {
                    let byte = need!(self.bc.take_byte(input));
                    if !(b'1'..=b'9').contains(&byte) {
                        return Err(DataError::BadBlockSize(byte).into());
                    }
                    self.block_size = byte - b'0';
                    info!("Found a valid bzip2 signature, block size {}00k.", self.block_size);
                    self.buf = Some(BlockBuffer::allocate(self.block_size, self.small)?);
                    self.state = State::BlockMagic(0);
                }
                State::BlockMagic(0) => {
                    let byte = need!(self.bc.take_byte(input));
                    self.state = match byte {
                        b if b == BLOCK_MAGIC[0] => State::BlockMagic(1),
                        b if b == END_MAGIC[0] => State::EndMagic(1),
                        _ => return Err(DataError::BadBlockMarker.into()),
                    };
                }
                State::BlockMagic(n) => {
                    let byte = need!(self.bc.take_byte(input));
                    if byte != BLOCK_MAGIC[n as usize] {
                        return Err(DataError::BadBlockMarker.into());
                    }
                    if n == 5 {
                        self.block_no += 1;
                        info!("Found a valid header for block {}.", self.block_no);
                        self.stored_block_crc = 0;
                        self.state = State::BlockCrc(0);
                    } else {
                        self.state = State::BlockMagic(n + 1);
                    }
                }
                State::EndMagic(n) => {
                    let byte = need!(self.bc.take_byte(input));
                    if byte != END_MAGIC[n as usize] {
                        return Err(DataError::BadEndMarker.into());
                    }
                    if n == 5 {
                        self.stored_combined_crc = 0;
                        self.state = State::StreamCrc(0);
                    } else {
                        self.state = State::EndMagic(n + 1);
                    }
                }
                State::BlockCrc(n) => {
                    let byte = need!(self.bc.take_byte(input));
                    self.stored_block_crc = (self.stored_block_crc << 8) | byte as u32;
                    self.state = if n == 3 {
                        State::Randomised
                    } else {
                        State::BlockCrc(n + 1)
                    };
                }
                State::Randomised => {
                    self.randomised = need!(self.bc.take_bit(input));
                    if self.randomised {
                        debug!("Block {} is randomised.", self.block_no);
                    }
                    self.orig_ptr = 0;
                    self.state = State::OrigPtr(0);
                }
                State::OrigPtr(n) => {
                    let byte = need!(self.bc.take_byte(input));
                    self.orig_ptr = (self.orig_ptr << 8) | byte as u32;
                    if n < 2 {
                        self.state = State::OrigPtr(n + 1);
                    } else {
                        if self.orig_ptr as usize > 10 + 100_000 * self.block_size as usize {
                            return Err(DataError::OrigPtr.into());
                        }
                        trace!("Key is {} at {}.", self.orig_ptr, self.bc.loc());
                        self.state = State::MapIndex;
                    }
                }
                State::MapIndex => {
                    let index = need!(self.bc.take_bits(16, input)) as u16;
                    self.map_words.clear();
                    self.map_words.push(index);
                    if index == 0 {
                        self.finish_symbol_map()?;
                    } else {
                        self.state = State::MapWord;
                    }
                }
                State::MapWord => {
                    let word = need!(self.bc.take_bits(16, input)) as u16;
                    self.map_words.push(word);
                    if self.map_words.len() > self.map_words[0].count_ones() as usize {
                        self.finish_symbol_map()?;
                    }
                }
                State::GroupCount => {
                    let groups = need!(self.bc.take_bits(3, input));
                    if !(2..=MAX_TABLES as u32).contains(&groups) {
                        return Err(DataError::GroupCount(groups).into());
                    }
                    self.n_groups = groups as usize;
                    self.state = State::SelectorCount;
                }
                State::SelectorCount => {
                    let count = need!(self.bc.take_bits(15, input)) as usize;
                    if count < 1 {
                        return Err(DataError::NoSelectors.into());
                    }
                    self.n_selectors = count;
                    self.sel_read = 0;
                    self.sel_j = 0;
                    self.selector_mtf.clear();
                    self.state = State::SelectorBit;
                }
                State::SelectorBit => {
                    if need!(self.bc.take_bit(input)) {
                        self.sel_j += 1;
                        if self.sel_j >= self.n_groups {
                            return Err(DataError::SelectorRange.into());
                        }
                    } else {
                        if self.sel_read < MAX_SELECTORS {
                            self.selector_mtf.push(self.sel_j as u8);
                        }
                        self.sel_read += 1;
                        self.sel_j = 0;
                        if self.sel_read == self.n_selectors {
                            self.finish_selectors();
                        }
                    }
                }
                State::CodingStart => {
                    self.curr = need!(self.bc.take_bits(5, input)) as i32;
                    self.sym_i = 0;
                    self.state = State::CodingStop;
                }
                State::CodingStop => {
                    if !(1..=MAX_CODE_LEN as i32).contains(&self.curr) {
                        return Err(DataError::CodeLength(self.curr).into());
                    }
                    if need!(self.bc.take_bit(input)) {
                        self.state = State::CodingDelta;
                    } else {
                        self.lengths[self.t][self.sym_i] = self.curr as u8;
                        self.sym_i += 1;
                        if self.sym_i == self.alpha_size {
                            self.t += 1;
                            if self.t == self.n_groups {
                                self.finish_coding_tables()?;
                            } else {
                                self.state = State::CodingStart;
                            }
                        }
                    }
                }
                State::CodingDelta => {
                    self.curr += if need!(self.bc.take_bit(input)) { -1 } else { 1 };
                    self.state = State::CodingStop;
                }
                State::SymbolFirst => {
                    self.zvec = need!(self.bc.take_bits(self.zn as u32, input)) as i32;
                    self.resolve_symbol()?;
                }
                State::SymbolMore => {
                    let bit = need!(self.bc.take_bits(1, input)) as i32;
                    self.zvec = (self.zvec << 1) | bit;
                    self.resolve_symbol()?;
                }
                State::Output => {
                    if self.emit(output, &mut pos)? {
                        self.finish_block()?;
                    } else {
                        return Ok((pos, Status::Ok));
                    }
                }
                State::StreamCrc(n) => {
                    let byte = need!(self.bc.take_byte(input));
                    self.stored_combined_crc = (self.stored_combined_crc << 8) | byte as u32;
                    if n < 3 {
                        self.state = State::StreamCrc(n + 1);
                    } else {
                        if self.stored_combined_crc != self.combined_crc {
                            return Err(DataError::StreamCrc {
                                stored: self.stored_combined_crc,
                                computed: self.combined_crc,
                            }
                            .into());
                        }
                        info!(
                            "Stream CRC {:#010x} verified after {} blocks.",
                            self.combined_crc, self.block_no
                        );
                        // The block buffer is not needed any more.
                        self.buf = None;
                        self.state = State::Idle;
                    }
                }
                State::Idle => return Ok((pos, Status::StreamEnd)),
            }
        }
    }

    fn finish_symbol_map(&mut self) -> Result<(), DataError> {
        self.seq_to_unseq = decode_sym_map(&self.map_words);
        if self.seq_to_unseq.is_empty() {
            return Err(DataError::NoSymbolsInUse);
        }
        // RUNA and RUNB replace MTF index 0, and EOB is added at the end.
        self.alpha_size = self.seq_to_unseq.len() + 2;
        trace!(
            "Found {} symbols for block {}.",
            self.seq_to_unseq.len(),
            self.block_no
        );
        self.state = State::GroupCount;
        Ok(())
    }

    /// Undo the move-to-front coding of the selectors.
    fn finish_selectors(&mut self) {
        let mut order: [u8; MAX_TABLES] = [0, 1, 2, 3, 4, 5];
        self.selectors.clear();
        for &v in &self.selector_mtf {
            let v = v as usize;
            let tmp = order[v];
            order.copy_within(0..v, 1);
            order[0] = tmp;
            self.selectors.push(tmp);
        }
        trace!(
            "{} tables, {} selectors ({} kept).",
            self.n_groups,
            self.n_selectors,
            self.selectors.len()
        );
        self.t = 0;
        self.state = State::CodingStart;
    }

    /// Build the decode tables and get ready for the first symbol of the block.
    fn finish_coding_tables(&mut self) -> Result<(), DataError> {
        self.tables.clear();
        for lengths in self.lengths.iter().take(self.n_groups) {
            let (min_len, max_len) = length_range(lengths, self.alpha_size);
            self.tables
                .push(DecodeTable::new(lengths, min_len, max_len, self.alpha_size));
        }

        self.group_no = 0;
        self.group_pos = 0;
        self.es = 0;
        self.run_n = 1;
        self.nblock = 0;
        self.unzftab = [0; 256];
        for (slot, &byte) in self.mtf.iter_mut().zip(&self.seq_to_unseq) {
            *slot = byte;
        }
        self.begin_symbol()
    }

    /// Select the coding table for the next symbol, moving to a new group every 50 symbols.
    fn begin_symbol(&mut self) -> Result<(), DataError> {
        if self.group_pos == 0 {
            let sel = *self
                .selectors
                .get(self.group_no)
                .ok_or(DataError::SelectorOverrun)?;
            self.g_sel = sel as usize;
            self.group_no += 1;
            self.group_pos = GROUP_SIZE;
        }
        self.group_pos -= 1;
        self.zn = self.tables[self.g_sel].min_len as usize;
        self.state = State::SymbolFirst;
        Ok(())
    }

    /// Check whether the bits read so far form a complete code, and act on the symbol if so.
    fn resolve_symbol(&mut self) -> Result<(), DataError> {
        if self.zn > MAX_CODE_LEN {
            return Err(DataError::CodeOverrun);
        }
        let table = &self.tables[self.g_sel];
        if self.zvec <= table.limit[self.zn] {
            let sym = table
                .symbol(self.zn, self.zvec)
                .ok_or(DataError::CodeRange)?;
            if sym as usize >= self.alpha_size {
                return Err(DataError::SymbolRange);
            }
            self.accept_symbol(sym)
        } else {
            self.zn += 1;
            self.state = State::SymbolMore;
            Ok(())
        }
    }

    /// Apply one decoded symbol: extend a RUNA/RUNB run, move a byte to front, or end the block.
    fn accept_symbol(&mut self, sym: u16) -> Result<(), DataError> {
        let nblock_max = 100_000 * self.block_size as usize;

        if sym == RUNA || sym == RUNB {
            if self.run_n >= MAX_RUN_WEIGHT {
                return Err(DataError::RunOverflow);
            }
            // Bijective base 2: RUNA adds the weight once, RUNB twice.
            self.es += (sym as u32 + 1) * self.run_n;
            self.run_n *= 2;
            return self.begin_symbol();
        }

        if self.run_n > 1 {
            let uc = self.mtf[0];
            let es = self.es as usize;
            if self.nblock + es > nblock_max {
                return Err(DataError::BlockOverflow);
            }
            self.unzftab[uc as usize] += self.es;
            if let Some(buf) = self.buf.as_mut() {
                for i in self.nblock..self.nblock + es {
                    buf.put(i, uc);
                }
            }
            self.nblock += es;
            self.es = 0;
            self.run_n = 1;
        }

        if sym as usize == self.alpha_size - 1 {
            return self.finish_symbols();
        }

        if self.nblock >= nblock_max {
            return Err(DataError::BlockOverflow);
        }
        let nn = sym as usize - 1;
        let uc = self.mtf[nn];
        self.mtf.copy_within(0..nn, 1);
        self.mtf[0] = uc;
        self.unzftab[uc as usize] += 1;
        if let Some(buf) = self.buf.as_mut() {
            buf.put(self.nblock, uc);
        }
        self.nblock += 1;
        self.begin_symbol()
    }

    /// End of block symbol seen: set up the inverse BWT and start emitting bytes.
    fn finish_symbols(&mut self) -> Result<(), DataError> {
        debug!(
            "Block {}: {} bytes, origin {}.",
            self.block_no, self.nblock, self.orig_ptr
        );
        let buf = self.buf.as_mut().ok_or(DataError::CorruptBlock)?;
        buf.start(self.nblock, self.orig_ptr, &self.unzftab)?;

        self.rand = self.randomised.then(RandState::new);
        self.block_crc = 0;
        self.state_out_len = 0;
        self.state_out_ch = 0;
        self.k0 = next_byte(buf, &mut self.rand)?;
        self.nblock_used = 1;
        self.state = State::Output;
        Ok(())
    }

    /// Emit block bytes into `output` from `*pos` on. Returns true once the block is finished,
    /// false if `output` filled up first.
    fn emit(&mut self, output: &mut [u8], pos: &mut usize) -> Result<bool, DataError> {
        let start = *pos;
        let done = self.unrle(output, pos);
        self.block_crc = do_crc(self.block_crc, &output[start..*pos]);
        done
    }

    /// Walk the inverse BWT chain, expanding RLE1 runs as they come.
    fn unrle(&mut self, output: &mut [u8], pos: &mut usize) -> Result<bool, DataError> {
        // One fetch past the end of the block happens, and is discarded.
        let end = self.nblock + 1;
        let buf = self.buf.as_mut().ok_or(DataError::CorruptBlock)?;

        loop {
            while self.state_out_len > 0 {
                if *pos == output.len() {
                    return Ok(false);
                }
                output[*pos] = self.state_out_ch;
                *pos += 1;
                self.state_out_len -= 1;
            }
            if self.nblock_used == end {
                return Ok(true);
            }
            if self.nblock_used > end {
                return Err(DataError::CorruptBlock);
            }

            // Up to three more copies of k0 continue the run. A fourth is followed by a count.
            self.state_out_len = 1;
            self.state_out_ch = self.k0;
            let mut run_done = false;
            for len in 2..=4 {
                let k1 = next_byte(buf, &mut self.rand)?;
                self.nblock_used += 1;
                if self.nblock_used == end {
                    run_done = true;
                    break;
                }
                if k1 != self.k0 {
                    self.k0 = k1;
                    run_done = true;
                    break;
                }
                if len < 4 {
                    self.state_out_len = len;
                }
            }
            if run_done {
                continue;
            }

            let count = next_byte(buf, &mut self.rand)?;
            self.nblock_used += 1;
            self.state_out_len = count as u32 + 4;
            self.k0 = next_byte(buf, &mut self.rand)?;
            self.nblock_used += 1;
        }
    }

    /// Check the block CRC once every byte has been emitted, and fold it into the stream CRC.
    fn finish_block(&mut self) -> Result<(), DataError> {
        if self.block_crc != self.stored_block_crc {
            return Err(DataError::BlockCrc {
                stored: self.stored_block_crc,
                computed: self.block_crc,
            });
        }
        self.combined_crc = do_stream_crc(self.combined_crc, self.block_crc);
        debug!(
            "Block {} CRC {:#010x}, stream CRC now {:#010x}.",
            self.block_no, self.block_crc, self.combined_crc
        );
        self.state = State::BlockMagic(0);
        Ok(())
    }
}
