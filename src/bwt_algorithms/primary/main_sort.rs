use log::{debug, trace};

use super::main_q_sort3::main_q_sort3;

/// Radix depth of the initial bucket sort, in bytes.
pub const N_RADIX: i32 = 2;
/// Depth budget of the quick sort before it hands over to the shell sort.
pub const N_QSORT: i32 = 12;
/// Bytes of block and quadrant copied past the end so comparisons need no bounds wrapping.
pub const N_OVERSHOOT: usize = N_RADIX as usize + N_QSORT as usize + 18 + 2;

/// Marks a small bucket as fully sorted
const SETMASK: u32 = 1 << 21;
const CLEARMASK: u32 = !SETMASK;

/// Working storage for the main sort.
#[derive(Debug)]
pub struct QsortData {
    /// Rotation start positions, in sorted order once done
    pub ptr: Vec<u32>,
    /// Block bytes, followed by a copy of the first N_OVERSHOOT bytes
    pub block: Vec<u8>,
    /// Tie-break ranks of already sorted rotations, with the same overshoot
    pub quadrant: Vec<u16>,
    /// Length of the block
    pub nblock: usize,
    /// Remaining work. Negative means the sort gave up.
    pub budget: i32,
}

impl QsortData {
    /// Prepare the sort of `data` with a budget of 0.
    pub fn new(data: &[u8]) -> Self {
        let nblock = data.len();
        let mut block = Vec::with_capacity(nblock + N_OVERSHOOT);
        block.extend_from_slice(data);
        if nblock > 0 {
            block.extend((0..N_OVERSHOOT).map(|i| data[i % nblock]));
        }
        Self {
            ptr: vec![0; nblock],
            block,
            quadrant: vec![0; nblock + N_OVERSHOOT],
            nblock,
            budget: 0,
        }
    }
}

/// Number of rotations starting with byte `b`, from the cumulative 2-byte table.
#[inline]
fn big_freq(ftab: &[u32], b: usize) -> u32 {
    ftab[(b + 1) << 8] - ftab[b << 8]
}

/// Julian's main sort. Sorts `qs.ptr` and returns true, or returns false as soon as the
/// work budget runs out.
pub fn main_sort(qs: &mut QsortData) -> bool {
    let nblock = qs.nblock;
    let mut ftab = vec![0_u32; 65537];

    // Set up the 2-byte frequency table
    let mut j = (qs.block[0] as usize) << 8;
    for i in (0..nblock).rev() {
        j = (j >> 8) | ((qs.block[i] as usize) << 8);
        ftab[j] += 1;
    }

    // Complete the initial radix sort
    for i in 1..=65536 {
        ftab[i] += ftab[i - 1];
    }
    let mut s = (qs.block[0] as usize) << 8;
    for i in (0..nblock).rev() {
        s = (s >> 8) | ((qs.block[i] as usize) << 8);
        let j = ftab[s] - 1;
        ftab[s] = j;
        qs.ptr[j as usize] = i as u32;
    }

    // Now ftab contains the first loc of every small bucket. Calculate the running order,
    // from smallest to largest big bucket, with a shell sort.
    let mut big_done = [false; 256];
    let mut running_order: [usize; 256] = std::array::from_fn(|i| i);
    {
        let mut h = 1;
        while h <= 256 {
            h = 3 * h + 1;
        }
        loop {
            h /= 3;
            for i in h..256 {
                let vv = running_order[i];
                let mut j = i;
                while big_freq(&ftab, running_order[j - h]) > big_freq(&ftab, vv) {
                    running_order[j] = running_order[j - h];
                    j -= h;
                    if j < h {
                        break;
                    }
                }
                running_order[j] = vv;
            }
            if h == 1 {
                break;
            }
        }
    }

    // The main sorting loop
    let mut num_q_sorted = 0;
    let mut copy_start = [0_i64; 256];
    let mut copy_end = [0_i64; 256];

    for i in 0..256 {
        let ss = running_order[i];

        /*
        Step 1: Complete the big bucket [ss] by quicksorting any unsorted small buckets
        [ss, j], for j != ss. Hopefully previous pointer-scanning phases have already
        completed many of the small buckets [ss, j], so we don't have to sort them at all.
        */
        for j in 0..256 {
            if j != ss {
                let sb = (ss << 8) + j;
                if ftab[sb] & SETMASK == 0 {
                    let lo = (ftab[sb] & CLEARMASK) as i32;
                    let hi = (ftab[sb + 1] & CLEARMASK) as i32 - 1;
                    if hi > lo {
                        main_q_sort3(qs, lo, hi, N_RADIX);
                        num_q_sorted += hi - lo + 1;
                        if qs.budget < 0 {
                            return false;
                        }
                    }
                }
                ftab[sb] |= SETMASK;
            }
        }
        debug_assert!(!big_done[ss]);

        /*
        Step 2: Now scan this big bucket [ss] so as to synthesise the sorted order for small
        buckets [t, ss] for all t, including, magically, the bucket [ss, ss] too. This will
        avoid doing Real Work in subsequent Step 1's.
        */
        for j in 0..256 {
            copy_start[j] = (ftab[(j << 8) + ss] & CLEARMASK) as i64;
            copy_end[j] = (ftab[(j << 8) + ss + 1] & CLEARMASK) as i64 - 1;
        }
        let mut j = (ftab[ss << 8] & CLEARMASK) as i64;
        while j < copy_start[ss] {
            let k = prev_pos(qs.ptr[j as usize] as usize, nblock);
            let c1 = qs.block[k] as usize;
            if !big_done[c1] {
                qs.ptr[copy_start[c1] as usize] = k as u32;
                copy_start[c1] += 1;
            }
            j += 1;
        }
        let mut j = (ftab[(ss + 1) << 8] & CLEARMASK) as i64 - 1;
        while j > copy_end[ss] {
            let k = prev_pos(qs.ptr[j as usize] as usize, nblock);
            let c1 = qs.block[k] as usize;
            if !big_done[c1] {
                qs.ptr[copy_end[c1] as usize] = k as u32;
                copy_end[c1] -= 1;
            }
            j -= 1;
        }
        debug_assert!(
            copy_start[ss] - 1 == copy_end[ss]
                || (copy_start[ss] == 0 && copy_end[ss] == nblock as i64 - 1)
        );

        for j in 0..256 {
            ftab[(j << 8) + ss] |= SETMASK;
        }

        /*
        Step 3: The [ss] big bucket is now done. Record this fact, and update the quadrant
        descriptors. The quadrant value of each rotation in the bucket is its rank within
        the bucket, scaled down so that it fits in 16 bits.
        */
        big_done[ss] = true;

        if i < 255 {
            let bb_start = (ftab[ss << 8] & CLEARMASK) as usize;
            let bb_size = (ftab[(ss + 1) << 8] & CLEARMASK) as usize - bb_start;
            let mut shifts = 0;
            while (bb_size >> shifts) > 65534 {
                shifts += 1;
            }
            for j in (0..bb_size).rev() {
                let a2update = qs.ptr[bb_start + j] as usize;
                let q_val = (j >> shifts) as u16;
                qs.quadrant[a2update] = q_val;
                if a2update < N_OVERSHOOT {
                    qs.quadrant[a2update + nblock] = q_val;
                }
            }
        }
    }

    debug!(
        "        {} pointers, {} sorted, {} scanned",
        nblock,
        num_q_sorted,
        nblock as i32 - num_q_sorted
    );
    trace!("main sort finished with {} work left", qs.budget);
    true
}

/// Position of the byte before `pos` in the circular block.
#[inline]
fn prev_pos(pos: usize, nblock: usize) -> usize {
    if pos == 0 {
        nblock - 1
    } else {
        pos - 1
    }
}

#[cfg(test)]
mod test {
    use super::{main_sort, QsortData};

    fn rotation(block: &[u8], i: u32) -> Vec<u8> {
        [&block[i as usize..], &block[..i as usize]].concat()
    }

    #[test]
    fn sorted_order_test() {
        let mut x = 0x2545_f491_4f6c_dd1d_u64;
        let block: Vec<u8> = (0..20_000)
            .map(|_| {
                x = x
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                (x >> 59) as u8
            })
            .collect();
        let mut qs = QsortData::new(&block);
        qs.budget = 1_000_000;
        assert!(main_sort(&mut qs));
        for w in qs.ptr.windows(2).step_by(97) {
            assert!(rotation(&block, w[0]) <= rotation(&block, w[1]));
        }
        let mut seen = qs.ptr.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..20_000).collect::<Vec<u32>>());
    }

    #[test]
    fn gives_up_on_repetitive_test() {
        let block: Vec<u8> = b"ab".iter().cycle().take(20_000).copied().collect();
        let mut qs = QsortData::new(&block);
        qs.budget = 100;
        assert!(!main_sort(&mut qs));
        assert!(qs.budget < 0);
    }
}
