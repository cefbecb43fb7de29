//! Three-way quick sort of a bucket of the fallback sort, keyed on equivalence class.

/// Ranges at or below this size go to the insertion sort.
const FALLBACK_QSORT_SMALL_THRESH: i32 = 10;

/// Sort `fmap[lo_st..=hi_st]` by `eclass[fmap[i]]`.
pub fn fallback_q_sort3(fmap: &mut [u32], eclass: &[u32], lo_st: i32, hi_st: i32) {
    // Ranges still to be sorted. The larger side is always pushed first, so this stays shallow.
    let mut stack: Vec<(i32, i32)> = Vec::with_capacity(32);
    stack.push((lo_st, hi_st));

    let mut ratio: u32 = 0;
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo < FALLBACK_QSORT_SMALL_THRESH {
            fallback_simple_sort(fmap, eclass, lo, hi);
            continue;
        }
        /* Julian's notes:
        Random partitioning.  Median of 3 sometimes fails to avoid bad cases.
        Median of 9 seems to help but looks rather expensive.  This too seems to
        work but is cheaper.  Guidance for the magic constants 7621 and 32768 is
        taken from Sedgewick's algorithms book, chapter 35.
        */
        ratio = ((ratio * 7621) + 1) % 32768;
        let median = match ratio % 3 {
            0 => eclass[fmap[lo as usize] as usize],
            1 => eclass[fmap[((lo + hi) >> 1) as usize] as usize],
            _ => eclass[fmap[hi as usize] as usize],
        } as i64;

        let mut un_lo = lo;
        let mut lt_lo = lo;
        let mut un_hi = hi;
        let mut gt_hi = hi;

        loop {
            while un_lo <= un_hi {
                let n = eclass[fmap[un_lo as usize] as usize] as i64 - median;
                if n == 0 {
                    fmap.swap(un_lo as usize, lt_lo as usize);
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
                let n = eclass[fmap[un_hi as usize] as usize] as i64 - median;
                if n == 0 {
                    fmap.swap(un_hi as usize, gt_hi as usize);
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
            fmap.swap(un_lo as usize, un_hi as usize);
            un_lo += 1;
            un_hi -= 1;
        }
        debug_assert_eq!(un_hi, un_lo - 1);

        // Everything equalled the median
        if gt_hi < lt_lo {
            continue;
        }

        // Move the runs equal to the median from both ends into the middle.
        let n = (lt_lo - lo).min(un_lo - lt_lo);
        swap_ranges(fmap, lo, un_lo - n, n);
        let m = (hi - gt_hi).min(gt_hi - un_hi);
        swap_ranges(fmap, un_lo, hi - m + 1, m);

        let n = lo + un_lo - lt_lo - 1;
        let m = hi - (gt_hi - un_hi) + 1;

        if n - lo > hi - m {
            stack.push((lo, n));
            stack.push((m, hi));
        } else {
            stack.push((m, hi));
            stack.push((lo, n));
        }
    }
}

/// Swap `n` entries starting at `a` with `n` entries starting at `b`.
#[inline]
fn swap_ranges(fmap: &mut [u32], a: i32, b: i32, n: i32) {
    for i in 0..n {
        fmap.swap((a + i) as usize, (b + i) as usize);
    }
}

/// Insertion sort for small ranges: a pass with a stride of 4, then a stride of 1.
pub fn fallback_simple_sort(fmap: &mut [u32], eclass: &[u32], lo: i32, hi: i32) {
    if lo >= hi {
        return;
    }
    if hi - lo > 3 {
        let mut i = hi - 4;
        while i >= lo {
            let tmp = fmap[i as usize];
            let ec_tmp = eclass[tmp as usize];
            let mut j = i + 4;
            while j <= hi && ec_tmp > eclass[fmap[j as usize] as usize] {
                fmap[(j - 4) as usize] = fmap[j as usize];
                j += 4;
            }
            fmap[(j - 4) as usize] = tmp;
            i -= 1;
        }
    }
    let mut i = hi - 1;
    while i >= lo {
        let tmp = fmap[i as usize];
        let ec_tmp = eclass[tmp as usize];
        let mut j = i + 1;
        while j <= hi && ec_tmp > eclass[fmap[j as usize] as usize] {
            fmap[(j - 1) as usize] = fmap[j as usize];
            j += 1;
        }
        fmap[(j - 1) as usize] = tmp;
        i -= 1;
    }
}

#[cfg(test)]
mod test {
    use super::{fallback_q_sort3, fallback_simple_sort};

    fn keys(fmap: &[u32], eclass: &[u32]) -> Vec<u32> {
        fmap.iter().map(|&f| eclass[f as usize]).collect()
    }

    #[test]
    fn simple_sort_test() {
        let eclass = vec![5, 3, 9, 1, 3, 0, 7];
        let mut fmap: Vec<u32> = (0..7).collect();
        fallback_simple_sort(&mut fmap, &eclass, 0, 6);
        assert_eq!(keys(&fmap, &eclass), vec![0, 1, 3, 3, 5, 7, 9]);
    }

    #[test]
    fn q_sort3_test() {
        let eclass: Vec<u32> = (0..500_u32).map(|i| (i * 7919) % 61).collect();
        let mut fmap: Vec<u32> = (0..500).collect();
        fallback_q_sort3(&mut fmap, &eclass, 0, 499);
        let sorted = keys(&fmap, &eclass);
        assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
        let mut seen = fmap.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..500).collect::<Vec<u32>>());
    }

    #[test]
    fn partial_range_test() {
        let eclass: Vec<u32> = (0..100_u32).rev().collect();
        let mut fmap: Vec<u32> = (0..100).collect();
        fallback_q_sort3(&mut fmap, &eclass, 20, 79);
        assert_eq!(&fmap[..20], &(0..20).collect::<Vec<u32>>()[..]);
        assert_eq!(&fmap[80..], &(80..100).collect::<Vec<u32>>()[..]);
        assert_eq!(fmap[20], 79);
        assert_eq!(fmap[79], 20);
    }
}
