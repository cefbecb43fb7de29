use super::{
    main_simple_sort::main_simple_sort,
    main_sort::{QsortData, N_QSORT, N_RADIX},
};

/// Ranges smaller than this go straight to the shell sort.
const MAIN_QSORT_SMALL_THRESH: i32 = 20;
/// Past this depth the shell sort, with its quadrant tie-breaks, takes over.
const MAIN_QSORT_DEPTH_THRESH: i32 = N_RADIX + N_QSORT;

/// Median of three bytes
#[inline]
fn mmed3(mut a: u8, mut b: u8, c: u8) -> u8 {
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }
    if b > c {
        b = c;
        if a > b {
            b = a;
        }
    }
    b
}

/// Multikey three-way quick sort of `qs.ptr[lo_st..=hi_st]`, where all rotations are already
/// known to agree on their first `d_st` bytes.
pub fn main_q_sort3(qs: &mut QsortData, lo_st: i32, hi_st: i32, d_st: i32) {
    let mut stack: Vec<(i32, i32, i32)> = Vec::with_capacity(100);
    stack.push((lo_st, hi_st, d_st));

    while let Some((lo, hi, d)) = stack.pop() {
        if hi - lo < MAIN_QSORT_SMALL_THRESH || d > MAIN_QSORT_DEPTH_THRESH {
            main_simple_sort(qs, lo, hi, d);
            if qs.budget < 0 {
                return;
            }
            continue;
        }

        let med = mmed3(key(qs, lo, d), key(qs, hi, d), key(qs, (lo + hi) >> 1, d)) as i32;

        let mut un_lo = lo;
        let mut lt_lo = lo;
        let mut un_hi = hi;
        let mut gt_hi = hi;

        loop {
            while un_lo <= un_hi {
                let n = key(qs, un_lo, d) as i32 - med;
                if n == 0 {
                    qs.ptr.swap(un_lo as usize, lt_lo as usize);
                    lt_lo += 1;
                    un_lo += 1;
                    continue;
                }
                if n > 0 {
                    break;
                }
                un_lo += 1;
            }
            while un_lo <= un_hi {
                let n = key(qs, un_hi, d) as i32 - med;
                if n == 0 {
                    qs.ptr.swap(un_hi as usize, gt_hi as usize);
                    gt_hi -= 1;
                    un_hi -= 1;
                    continue;
                }
                if n < 0 {
                    break;
                }
                un_hi -= 1;
            }
            if un_lo > un_hi {
                break;
            }
            qs.ptr.swap(un_lo as usize, un_hi as usize);
            un_lo += 1;
            un_hi -= 1;
        }
        debug_assert_eq!(un_hi, un_lo - 1);

        // Every key equalled the median, so look one byte deeper.
        if gt_hi < lt_lo {
            stack.push((lo, hi, d + 1));
            continue;
        }

        let n = (lt_lo - lo).min(un_lo - lt_lo);
        swap_ranges(&mut qs.ptr, lo, un_lo - n, n);
        let m = (hi - gt_hi).min(gt_hi - un_hi);
        swap_ranges(&mut qs.ptr, un_lo, hi - m + 1, m);

        let n = lo + un_lo - lt_lo - 1;
        let m = hi - (gt_hi - un_hi) + 1;

        // Push the largest range first so the smallest is sorted next.
        let mut next = [(lo, n, d), (m, hi, d), (n + 1, m - 1, d + 1)];
        let size = |r: &(i32, i32, i32)| r.1 - r.0;
        if size(&next[0]) < size(&next[1]) {
            next.swap(0, 1);
        }
        if size(&next[1]) < size(&next[2]) {
            next.swap(1, 2);
        }
        if size(&next[0]) < size(&next[1]) {
            next.swap(0, 1);
        }
        stack.extend_from_slice(&next);
    }
}

/// Byte `d` of the rotation at sorted position `i`
#[inline]
fn key(qs: &QsortData, i: i32, d: i32) -> u8 {
    qs.block[qs.ptr[i as usize] as usize + d as usize]
}

/// Swap `n` entries starting at `a` with `n` entries starting at `b`.
#[inline]
fn swap_ranges(ptr: &mut [u32], a: i32, b: i32, n: i32) {
    for i in 0..n {
        ptr.swap((a + i) as usize, (b + i) as usize);
    }
}

#[cfg(test)]
mod test {
    use super::{main_q_sort3, mmed3};
    use crate::bwt_algorithms::primary::main_sort::QsortData;

    #[test]
    fn median_test() {
        assert_eq!(mmed3(1, 2, 3), 2);
        assert_eq!(mmed3(3, 1, 2), 2);
        assert_eq!(mmed3(2, 3, 1), 2);
        assert_eq!(mmed3(5, 5, 1), 5);
    }

    #[test]
    fn quick_sort_test() {
        let block: Vec<u8> = (0..400_u32).map(|i| b"acgt"[((i * 31 + i / 7) % 4) as usize]).collect();
        let mut qs = QsortData::new(&block);
        qs.budget = 1_000_000;
        qs.ptr = (0..block.len() as u32).collect();
        main_q_sort3(&mut qs, 0, 399, 0);
        assert!(qs.budget >= 0);
        let rot = |i: u32| [&block[i as usize..], &block[..i as usize]].concat();
        assert!(qs.ptr.windows(2).all(|w| rot(w[0]) <= rot(w[1])));
    }
}
