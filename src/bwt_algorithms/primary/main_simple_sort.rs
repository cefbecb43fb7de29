use super::{main_gtu::main_gtu, main_sort::QsortData};

/// Knuth's increments for the shell sort
const INCS: [i32; 14] = [
    1, 4, 13, 40, 121, 364, 1093, 3280, 9841, 29524, 88573, 265720, 797161, 2391484,
];

/// Shell sort of `qs.ptr[lo..=hi]`, comparing rotations from depth `d` on. Used for buckets of
/// 20 or less, or once the quick sort has gone deeper than 14 bytes. Returns early once the
/// work budget is spent.
pub fn main_simple_sort(qs: &mut QsortData, lo: i32, hi: i32, d: i32) {
    let big_n = hi - lo + 1;
    if big_n < 2 {
        return;
    }

    // Start from the largest increment below the range size.
    let top = INCS.iter().position(|&h| h >= big_n).unwrap_or(INCS.len());

    for &h in INCS[..top].iter().rev() {
        let mut i = lo + h;
        loop {
            // Three insertions per budget check
            for _ in 0..3 {
                if i > hi {
                    break;
                }
                let v = qs.ptr[i as usize];
                let mut j = i;
                while main_gtu(
                    (qs.ptr[(j - h) as usize] as i32 + d) as usize,
                    (v as i32 + d) as usize,
                    qs,
                ) {
                    qs.ptr[j as usize] = qs.ptr[(j - h) as usize];
                    j -= h;
                    if j <= lo + h - 1 {
                        break;
                    }
                }
                qs.ptr[j as usize] = v;
                i += 1;
            }
            if i > hi || qs.budget < 0 {
                break;
            }
        }
        if qs.budget < 0 {
            return;
        }
    }
}
