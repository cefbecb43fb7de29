use log::{debug, trace, warn};

use super::fallback::fallback_sort::fallback_sort;
use super::primary::main_sort::{main_sort, QsortData};

/// Blocks shorter than this always use the fallback sort.
const MAIN_SORT_MIN: usize = 10_000;

/// Result of sorting one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BwtOutput {
    /// `ptr[i]` is the start of the i-th smallest rotation.
    pub ptr: Vec<u32>,
    /// Sorted position of the unrotated block
    pub orig_ptr: u32,
    /// True if the fallback sort produced `ptr`.
    pub fallback: bool,
}

/// Primary entry into Julian's BWT sorting system. Sorts the rotations of `block` with the main
/// sort when the block is large enough, and falls back to the exponential sort when it is small
/// or when the main sort exhausts a work budget derived from `work_factor`.
pub fn block_sort(block: &[u8], work_factor: u32) -> BwtOutput {
    let nblock = block.len();
    let (ptr, fallback) = if nblock < MAIN_SORT_MIN {
        (fallback_sort(block), true)
    } else {
        // (wfact-1) / 3 keeps the default factor of 30 at the historical switch-over point.
        let wfact = work_factor.clamp(1, 100) as i32;
        let mut qs = QsortData::new(block);
        qs.budget = nblock as i32 * ((wfact - 1) / 3);
        let budget_init = qs.budget;

        let done = main_sort(&mut qs);
        trace!(
            "Work depleted: {}, block size: {}.",
            budget_init - qs.budget,
            nblock,
        );
        if done {
            debug!(
                "      {} work, {} block, ratio {:.2}",
                budget_init - qs.budget,
                nblock,
                (budget_init - qs.budget) as f32 / nblock as f32
            );
            (qs.ptr, false)
        } else {
            warn!("    too repetitive; using fallback sorting algorithm");
            (fallback_sort(block), true)
        }
    };

    let orig_ptr = ptr.iter().position(|&p| p == 0).unwrap_or(0) as u32;
    debug_assert!(nblock == 0 || ptr[orig_ptr as usize] == 0);
    BwtOutput {
        ptr,
        orig_ptr,
        fallback,
    }
}

/// The BWT output: the last byte of every sorted rotation.
pub fn bwt_last_column(block: &[u8], ptr: &[u32]) -> Vec<u8> {
    let n = block.len();
    ptr.iter()
        .map(|&p| {
            if p == 0 {
                block[n - 1]
            } else {
                block[p as usize - 1]
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::{block_sort, bwt_last_column};

    #[test]
    fn banana_test() {
        let out = block_sort(b"banana", 30);
        assert!(out.fallback);
        assert_eq!(out.orig_ptr, 3);
        assert_eq!(bwt_last_column(b"banana", &out.ptr), b"nnbaaa".to_vec());
    }

    #[test]
    fn empty_and_single_test() {
        let out = block_sort(b"", 30);
        assert!(out.ptr.is_empty());
        assert_eq!(out.orig_ptr, 0);
        let out = block_sort(b"q", 30);
        assert_eq!(out.ptr, vec![0]);
        assert_eq!(out.orig_ptr, 0);
    }

    #[test]
    fn budget_fallback_test() {
        // A short period makes every comparison run the length of the block, so the main sort
        // spends its budget and the fallback sort finishes the job.
        for period in [&b"ab"[..], &b"abcdefg"[..]] {
            let block: Vec<u8> = period.iter().cycle().take(50_000).copied().collect();
            let out = block_sort(&block, 30);
            assert!(out.fallback);
            let mut seen = out.ptr.clone();
            seen.sort_unstable();
            assert_eq!(seen, (0..50_000).collect::<Vec<u32>>());
            assert_eq!(out.ptr[out.orig_ptr as usize], 0);
        }
    }

    #[test]
    fn single_byte_block_test() {
        // The 2-byte radix pass alone orders a block of one repeated byte.
        let block = vec![b'z'; 50_000];
        let out = block_sort(&block, 30);
        let mut seen = out.ptr.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..50_000).collect::<Vec<u32>>());
        assert_eq!(out.ptr[out.orig_ptr as usize], 0);
        assert_eq!(bwt_last_column(&block, &out.ptr), block);
    }

    #[test]
    fn sorters_agree_test() {
        let mut x = 12345_u32;
        let block: Vec<u8> = (0..30_000)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12345);
                b"etaoin shrdlu"[((x >> 16) % 13) as usize]
            })
            .collect();
        let main = block_sort(&block, 100);
        assert!(!main.fallback);
        let fallback = block_sort(&block, 1);
        let via_fallback = super::fallback_sort(&block);
        assert_eq!(
            bwt_last_column(&block, &main.ptr),
            bwt_last_column(&block, &via_fallback)
        );
        assert_eq!(
            bwt_last_column(&block, &fallback.ptr),
            bwt_last_column(&block, &via_fallback)
        );
    }
}
