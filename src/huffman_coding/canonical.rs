//! Canonical huffman codes, built from code lengths alone.
//!
//! Codes are sequential within each length. For example, for a length of 3, the codes would be
//! 000, 001, 010, 011, etc, handed out in increasing symbol order. When the length changes, the
//! next code is shifted left once for each step in length and counting continues.
//!
//! The decode side does not build codes at all. It keeps, for each length, the largest code of
//! that length (`limit`) and the offset that turns a code of that length into a position in the
//! symbol list sorted by length (`base`, `perm`). A decoder then reads one bit at a time until
//! the code it has accumulated is no larger than the limit for its length.

use super::huffman::MAX_ALPHA_SIZE;

/// Longest code the decode tables are sized for. Streams may only use lengths up to 20.
pub const MAX_CODE_LEN: usize = 23;

/// Assign a canonical code to each of the first `alpha_size` symbols.
pub fn assign_codes(
    codes: &mut [u32],
    lengths: &[u8],
    min_len: u8,
    max_len: u8,
    alpha_size: usize,
) {
    let mut next_code = 0_u32;
    for len in min_len..=max_len {
        for (code, _) in codes
            .iter_mut()
            .zip(lengths)
            .take(alpha_size)
            .filter(|(_, &l)| l == len)
        {
            *code = next_code;
            next_code += 1;
        }
        next_code <<= 1;
    }
}

/// Decode tables for one coding table of a block.
#[derive(Debug, Clone)]
pub struct DecodeTable {
    /// Largest code value of each length, or -1 when there is none
    pub limit: [i32; MAX_CODE_LEN],
    /// Per length offset from a code value to its index in `perm`
    pub base: [i32; MAX_CODE_LEN],
    /// Symbols sorted by code length, then by symbol
    pub perm: [u16; MAX_ALPHA_SIZE],
    /// Shortest code length in use
    pub min_len: u8,
}

impl Default for DecodeTable {
    fn default() -> Self {
        Self {
            limit: [0; MAX_CODE_LEN],
            base: [0; MAX_CODE_LEN],
            perm: [0; MAX_ALPHA_SIZE],
            min_len: 0,
        }
    }
}

impl DecodeTable {
    /// Build the tables from code lengths, each between 1 and 20.
    pub fn new(lengths: &[u8], min_len: u8, max_len: u8, alpha_size: usize) -> Self {
        let mut table = DecodeTable {
            min_len,
            ..Default::default()
        };
        let lengths = &lengths[..alpha_size];
        let (min, max) = (min_len as usize, max_len as usize);

        let mut pp = 0;
        for len in min_len..=max_len {
            for (sym, _) in lengths.iter().enumerate().filter(|(_, &l)| l == len) {
                table.perm[pp] = sym as u16;
                pp += 1;
            }
        }

        // Count the codes of each length one slot up, then make the counts cumulative.
        for &len in lengths {
            table.base[len as usize + 1] += 1;
        }
        for i in 1..MAX_CODE_LEN {
            table.base[i] += table.base[i - 1];
        }

        let mut vec = 0_i32;
        for i in min..=max {
            vec += table.base[i + 1] - table.base[i];
            table.limit[i] = vec - 1;
            vec <<= 1;
        }
        for i in (min + 1)..=max {
            table.base[i] = ((table.limit[i - 1] + 1) << 1) - table.base[i];
        }
        table
    }

    /// Look up a complete code of `len` bits. None if the code does not map into the table.
    #[inline]
    pub fn symbol(&self, len: usize, code: i32) -> Option<u16> {
        let idx = code - self.base[len];
        if (0..MAX_ALPHA_SIZE as i32).contains(&idx) {
            Some(self.perm[idx as usize])
        } else {
            None
        }
    }
}

/// Smallest and largest length among the first `alpha_size` entries.
pub fn length_range(lengths: &[u8], alpha_size: usize) -> (u8, u8) {
    lengths
        .iter()
        .take(alpha_size)
        .fold((32, 0), |(lo, hi), &l| (lo.min(l), hi.max(l)))
}

#[cfg(test)]
mod test {
    use super::{assign_codes, length_range, DecodeTable};

    /// Decode one code by reading it a bit at a time, the way the block decoder does.
    fn decode(table: &DecodeTable, code: u32, len: u8) -> Option<u16> {
        let mut zn = table.min_len as usize;
        let mut zvec = (code >> (len as usize - zn)) as i32;
        loop {
            if zn > 20 {
                return None;
            }
            if zvec <= table.limit[zn] {
                return table.symbol(zn, zvec);
            }
            zn += 1;
            if zn > len as usize {
                return None;
            }
            zvec = (zvec << 1) | ((code >> (len as usize - zn)) & 1) as i32;
        }
    }

    #[test]
    fn assign_codes_test() {
        let lengths = [2_u8, 3, 3, 2, 2];
        let mut codes = [0_u32; 5];
        assign_codes(&mut codes, &lengths, 2, 3, 5);
        assert_eq!(codes, [0b00, 0b110, 0b111, 0b01, 0b10]);
    }

    #[test]
    fn decode_tables_test() {
        let lengths = [2_u8, 3, 3, 2, 2];
        let table = DecodeTable::new(&lengths, 2, 3, 5);
        assert_eq!(&table.perm[..5], &[0, 3, 4, 1, 2]);
        assert_eq!(table.limit[2], 2);
        assert_eq!(table.limit[3], 7);
    }

    #[test]
    fn symbol_range_test() {
        let table = DecodeTable::new(&[2_u8, 3, 3, 2, 2], 2, 3, 5);
        assert_eq!(table.symbol(2, 1), Some(3));
        assert_eq!(table.symbol(2, -1), None);
        assert_eq!(table.symbol(3, 1000), None);
    }

    #[test]
    fn round_trip_test() {
        let sets: Vec<Vec<u8>> = vec![
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 20],
            vec![4; 16],
            vec![1, 1],
            vec![2, 3, 3, 3, 3, 4, 4, 5, 5, 5, 5],
            (0..258).map(|i| if i < 2 { 2 } else if i < 4 { 3 } else { 10 }).collect(),
        ];
        for lengths in sets {
            let alpha = lengths.len();
            let (lo, hi) = length_range(&lengths, alpha);
            let mut codes = vec![0_u32; alpha];
            assign_codes(&mut codes, &lengths, lo, hi, alpha);
            let table = DecodeTable::new(&lengths, lo, hi, alpha);
            for sym in 0..alpha {
                assert_eq!(
                    decode(&table, codes[sym], lengths[sym]),
                    Some(sym as u16),
                    "lengths {:?}",
                    lengths
                );
            }
        }
    }
}
