//! The decoder's block buffer and the inverse Burrows-Wheeler Transform.
//!
//! While the symbol stream of a block is decoded, each output byte of the BWT is parked in the
//! buffer with [`BlockBuffer::put`]. Once the end of block is seen, [`BlockBuffer::start`] turns
//! the parked bytes into a chain of successor links and [`BlockBuffer::next_byte`] walks that
//! chain, one original byte per call.
//!
//! Two layouts are available. The fast one uses a u32 per position, holding the byte in the low
//! 8 bits and the link above it. The small one keeps the link in a u16 plus a 4-bit nibble per
//! position and recovers each byte by a binary search of the cumulative frequency table. It uses
//! a little over half the memory of the fast layout and runs noticeably slower.

use log::debug;

use crate::error::{BzError, DataError};

/// Block storage, fixed for the life of a stream.
#[derive(Debug)]
enum Store {
    Fast { tt: Vec<u32> },
    Small { ll16: Vec<u16>, ll4: Vec<u8> },
}

#[derive(Debug)]
pub struct BlockBuffer {
    store: Store,
    /// Cumulative byte counts of the current block
    cftab: [u32; 257],
    /// Position of the next link to follow
    t_pos: u32,
}

/// Allocate a zeroed vector, reporting failure rather than aborting.
fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, BzError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| BzError::Memory)?;
    v.resize(len, T::default());
    Ok(v)
}

impl BlockBuffer {
    /// Allocate a buffer for blocks of up to `100_000 * block_size` bytes.
    pub fn allocate(block_size: u8, small: bool) -> Result<Self, BzError> {
        let capacity = 100_000 * block_size as usize;
        let store = if small {
            Store::Small {
                ll16: try_zeroed(capacity)?,
                ll4: try_zeroed((capacity + 1) / 2)?,
            }
        } else {
            Store::Fast {
                tt: try_zeroed(capacity)?,
            }
        };
        debug!(
            "Allocated {} block buffer for {} bytes",
            if small { "small" } else { "fast" },
            capacity
        );
        Ok(Self {
            store,
            cftab: [0; 257],
            t_pos: 0,
        })
    }

    /// Park BWT output byte `i`. The caller keeps `i` below the block size it allocated for.
    #[inline]
    pub fn put(&mut self, i: usize, byte: u8) {
        match &mut self.store {
            Store::Fast { tt } => tt[i] = byte as u32,
            Store::Small { ll16, .. } => ll16[i] = byte as u16,
        }
    }

    /// Build the successor chain for a block of `nblock` parked bytes whose per-byte counts are
    /// `unzftab`, ready to emit the original block starting from sorted position `orig_ptr`.
    pub fn start(
        &mut self,
        nblock: usize,
        orig_ptr: u32,
        unzftab: &[u32; 256],
    ) -> Result<(), DataError> {
        if orig_ptr as usize >= nblock {
            return Err(DataError::OrigPtr);
        }

        self.cftab[0] = 0;
        for i in 1..=256 {
            self.cftab[i] = self.cftab[i - 1] + unzftab[i - 1];
        }
        if self.cftab.iter().any(|&c| c as usize > nblock) {
            return Err(DataError::Cftab);
        }

        match &mut self.store {
            Store::Fast { tt } => {
                let mut cftab = self.cftab;
                for i in 0..nblock {
                    let uc = (tt[i] & 0xff) as usize;
                    tt[cftab[uc] as usize] |= (i as u32) << 8;
                    cftab[uc] += 1;
                }
                self.t_pos = tt[orig_ptr as usize] >> 8;
            }
            Store::Small { ll16, ll4 } => {
                let mut cftab = self.cftab;
                for i in 0..nblock {
                    let uc = ll16[i] as usize;
                    set_ll(ll16, ll4, i, cftab[uc]);
                    cftab[uc] += 1;
                }

                // Reverse the links so the chain runs forwards from orig_ptr.
                let mut i = orig_ptr;
                let mut j = get_ll(ll16, ll4, i as usize);
                loop {
                    let tmp = get_ll(ll16, ll4, j as usize);
                    set_ll(ll16, ll4, j as usize, i);
                    i = j;
                    j = tmp;
                    if i == orig_ptr {
                        break;
                    }
                }
                self.t_pos = orig_ptr;
            }
        }
        Ok(())
    }

    /// Follow one link and return the next byte of the original block. A link pointing outside
    /// the buffer means the block was corrupt.
    #[inline]
    pub fn next_byte(&mut self) -> Result<u8, DataError> {
        let pos = self.t_pos as usize;
        match &self.store {
            Store::Fast { tt } => {
                let entry = *tt.get(pos).ok_or(DataError::CorruptBlock)?;
                self.t_pos = entry >> 8;
                Ok((entry & 0xff) as u8)
            }
            Store::Small { ll16, ll4 } => {
                if pos >= ll16.len() {
                    return Err(DataError::CorruptBlock);
                }
                let byte = index_into_f(pos as u32, &self.cftab);
                self.t_pos = get_ll(ll16, ll4, pos);
                Ok(byte)
            }
        }
    }
}

#[inline]
fn get_ll(ll16: &[u16], ll4: &[u8], i: usize) -> u32 {
    let nibble = (ll4[i >> 1] >> ((i << 2) & 4)) & 0x0f;
    ll16[i] as u32 | (nibble as u32) << 16
}

#[inline]
fn set_ll(ll16: &mut [u16], ll4: &mut [u8], i: usize, n: u32) {
    ll16[i] = (n & 0xffff) as u16;
    let nibble = ((n >> 16) & 0x0f) as u8;
    let cell = &mut ll4[i >> 1];
    if i & 1 == 0 {
        *cell = (*cell & 0xf0) | nibble;
    } else {
        *cell = (*cell & 0x0f) | (nibble << 4);
    }
}

/// The byte whose cumulative range in `cftab` contains `index`.
#[inline]
fn index_into_f(index: u32, cftab: &[u32; 257]) -> u8 {
    let mut nb = 0;
    let mut na = 256;
    while na - nb != 1 {
        let mid = (nb + na) >> 1;
        if index >= cftab[mid] {
            nb = mid;
        } else {
            na = mid;
        }
    }
    nb as u8
}

#[cfg(test)]
mod test {
    use super::{index_into_f, BlockBuffer};
    use crate::bwt_algorithms::block_sort::{block_sort, bwt_last_column};
    use crate::error::DataError;

    fn invert(block: &[u8], small: bool) -> Vec<u8> {
        let out = block_sort(block, 30);
        let last = bwt_last_column(block, &out.ptr);
        let mut buf = BlockBuffer::allocate(1, small).unwrap();
        let mut counts = [0_u32; 256];
        for (i, &b) in last.iter().enumerate() {
            buf.put(i, b);
            counts[b as usize] += 1;
        }
        buf.start(block.len(), out.orig_ptr, &counts).unwrap();
        (0..block.len()).map(|_| buf.next_byte().unwrap()).collect()
    }

    #[test]
    fn fast_inverse_test() {
        assert_eq!(invert(b"banana", false), b"banana".to_vec());
        assert_eq!(invert(b"x", false), b"x".to_vec());
        let same = vec![9_u8; 777];
        assert_eq!(invert(&same, false), same);
        // Large enough for the main sort, which orders this block by radix alone.
        let same = vec![b'z'; 50_000];
        assert_eq!(invert(&same, false), same);
    }

    #[test]
    fn fallback_sorted_inverse_test() {
        // Periodic blocks exhaust the main sort's budget and come back from the fallback sort.
        let block: Vec<u8> = b"ab".iter().cycle().take(50_000).copied().collect();
        assert!(block_sort(&block, 30).fallback);
        assert_eq!(invert(&block, false), block);
        assert_eq!(invert(&block, true), block);
    }

    #[test]
    fn small_inverse_test() {
        let text: Vec<u8> = b"It was the best of times, it was the worst of times. "
            .iter()
            .cycle()
            .take(70_000)
            .copied()
            .collect();
        assert_eq!(invert(&text, true), text);
        assert_eq!(invert(b"mississippi", true), b"mississippi".to_vec());
    }

    #[test]
    fn orig_ptr_range_test() {
        let mut buf = BlockBuffer::allocate(1, false).unwrap();
        buf.put(0, b'a');
        let mut counts = [0_u32; 256];
        counts[b'a' as usize] = 1;
        assert_eq!(buf.start(1, 1, &counts), Err(DataError::OrigPtr));
    }

    #[test]
    fn index_into_f_test() {
        let mut cftab = [0_u32; 257];
        // Two 'a's then three 'c's.
        for (i, c) in cftab.iter_mut().enumerate() {
            *c = match i {
                0..=97 => 0,
                98..=99 => 2,
                _ => 5,
            };
        }
        assert_eq!(index_into_f(0, &cftab), b'a');
        assert_eq!(index_into_f(1, &cftab), b'a');
        assert_eq!(index_into_f(2, &cftab), b'c');
        assert_eq!(index_into_f(4, &cftab), b'c');
    }
}
