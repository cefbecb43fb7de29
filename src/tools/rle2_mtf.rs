//! Perform run-length-encoding and move-to-front transforms for the bzip2 block codec.
//!
//! The move-to-front transform will increase the frequency of lower byte values. The result of this is that
//! the huffman codes can more efficiently compress those high frequency bytes.
//!
//! The run-length-encoding will compress runs of the zero index irregardless of the number of zeros found.
//! The count of zeros is written in bijective base 2 using the two symbols RUNA (digit 1) and RUNB
//! (digit 2), least significant digit first. Every other MTF index `i` is written as symbol `i + 1`,
//! and the block ends with the EOB symbol, `symbols in use + 1`.
//!
//! Encoding also returns a frequency table used during the huffman stage.
//!
use log::trace;

pub const RUNA: u16 = 0;
pub const RUNB: u16 = 1;

/// Largest alphabet: RUNA, RUNB, 255 MTF indexes above zero and EOB.
pub const MAX_ALPHA_SIZE: usize = 258;

/// Output of the MTF/RLE2 stage for one block.
#[derive(Debug)]
pub struct MtfValues {
    /// Symbol stream, ending with EOB
    pub mtfv: Vec<u16>,
    /// Frequency of each symbol in `mtfv`
    pub freqs: [u32; MAX_ALPHA_SIZE],
    /// End of block symbol. Alphabet size is `eob + 1`.
    pub eob: u16,
}

/// Does Move-To-Front transform and Run-Length-Encoding 2 prior to the huffman stage.
/// Receives the BWT output of a block and the table of byte values used in the block.
pub fn rle2_mtf_encode(bwt: &[u8], in_use: &[bool; 256]) -> MtfValues {
    // Map each used byte to its rank among the used bytes.
    let mut unseq_to_seq = [0_u8; 256];
    let mut n_in_use = 0_usize;
    for (byte, _) in in_use.iter().enumerate().filter(|(_, &used)| used) {
        unseq_to_seq[byte] = n_in_use as u8;
        n_in_use += 1;
    }
    let eob = n_in_use as u16 + 1;

    // The MTF list starts in rank order
    let mut mtf_index = [0_u8; 256];
    for (i, slot) in mtf_index.iter_mut().enumerate() {
        *slot = i as u8;
    }

    let mut mtfv = Vec::with_capacity(bwt.len() + 1);
    let mut freqs = [0_u32; MAX_ALPHA_SIZE];
    // Pending zeros
    let mut zeros = 0_u32;

    for &byte in bwt {
        let rank = unseq_to_seq[byte as usize];
        if mtf_index[0] == rank {
            zeros += 1;
            continue;
        }
        // Not a zero, so output any pending zeros first
        write_zero_run(&mut zeros, &mut mtfv, &mut freqs);

        // Find the rank in the list while shifting everything in front of it back by one.
        let mut idx = 1;
        let mut carry = mtf_index[0];
        while mtf_index[idx] != rank {
            std::mem::swap(&mut carry, &mut mtf_index[idx]);
            idx += 1;
        }
        mtf_index[idx] = carry;
        mtf_index[0] = rank;

        mtfv.push(idx as u16 + 1);
        freqs[idx + 1] += 1;
    }
    // Write any trailing zeros
    write_zero_run(&mut zeros, &mut mtfv, &mut freqs);

    // Add the EOB symbol to the end
    mtfv.push(eob);
    freqs[eob as usize] += 1;

    trace!(
        "{} bytes in block, {} after MTF & RLE2 coding, {} syms in use",
        bwt.len(),
        mtfv.len(),
        eob + 1
    );
    MtfValues { mtfv, freqs, eob }
}

/// Output the RUNA/RUNB digits for a run of `zeros` zero indexes, then reset the count.
fn write_zero_run(zeros: &mut u32, mtfv: &mut Vec<u16>, freqs: &mut [u32; MAX_ALPHA_SIZE]) {
    if *zeros == 0 {
        return;
    }
    let mut n = *zeros - 1;
    loop {
        let sym = if n & 1 == 1 { RUNB } else { RUNA };
        mtfv.push(sym);
        freqs[sym as usize] += 1;
        if n < 2 {
            break;
        }
        n = (n - 2) >> 1;
    }
    *zeros = 0;
}

#[cfg(test)]
mod test {
    use super::{rle2_mtf_encode, RUNA, RUNB};

    fn in_use_of(data: &[u8]) -> [bool; 256] {
        let mut in_use = [false; 256];
        data.iter().for_each(|&b| in_use[b as usize] = true);
        in_use
    }

    #[test]
    fn zero_runs_test() {
        // Runs of 1..=6 zeros after the first byte.
        let cases: [(usize, &[u16]); 6] = [
            (1, &[RUNA]),
            (2, &[RUNB]),
            (3, &[RUNA, RUNA]),
            (4, &[RUNB, RUNA]),
            (5, &[RUNA, RUNB]),
            (6, &[RUNB, RUNB]),
        ];
        for (run, expected) in cases {
            let data = vec![b'z'; run];
            let result = rle2_mtf_encode(&data, &in_use_of(&data));
            let mut want = expected.to_vec();
            want.push(2);
            assert_eq!(result.mtfv, want, "run of {}", run);
            assert_eq!(result.eob, 2);
        }
    }

    #[test]
    fn mtf_test() {
        // "banana" -> ranks a=0, b=1, n=2
        let data = b"banana";
        let result = rle2_mtf_encode(data, &in_use_of(data));
        // b: idx 1 -> 2. a: idx 1 -> 2. n: idx 2 -> 3. a: idx 1 -> 2. n: 1 -> 2. a: 1 -> 2.
        assert_eq!(result.mtfv, vec![2, 2, 3, 2, 2, 2, 4]);
        assert_eq!(result.eob, 4);
        assert_eq!(result.freqs[2], 5);
        assert_eq!(result.freqs[3], 1);
        assert_eq!(result.freqs[4], 1);
    }

    #[test]
    fn freqs_total_test() {
        let data: Vec<u8> = (0..1000_u32).map(|i| ((i * i) % 13) as u8).collect();
        let result = rle2_mtf_encode(&data, &in_use_of(&data));
        let total: u32 = result.freqs.iter().sum();
        assert_eq!(total as usize, result.mtfv.len());
        assert_eq!(*result.mtfv.last().unwrap_or(&0), result.eob);
    }
}
