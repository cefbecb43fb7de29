use log::{debug, trace};

use super::fallback_q_sort3::fallback_q_sort3;

/// Fallback sort function for small blocks or blocks which contain highly repetitive data.
/// Returns the sorted rotation order of `block`.
pub fn fallback_sort(block: &[u8]) -> Vec<u32> {
    /*
    Julian noted that this is is a kind-of an "exponential radix sort" inspired by the
    Manber-Myers suffix array construction algorithm. After an initial one byte radix sort,
    each pass doubles the depth H to which rotations are known to be sorted, by sorting each
    unfinished bucket on the bucket number of the rotation H bytes further on. It stops when
    every bucket is a singleton or H covers the whole block.
    */
    let end = block.len();
    let mut fmap = vec![0_u32; end];
    if end == 0 {
        return fmap;
    }
    let mut eclass = vec![0_u32; end];

    // Initial 1-byte radix sort to generate the initial fmap and bucket heads.
    let mut ftab = [0_usize; 257];
    for &byte in block {
        ftab[byte as usize] += 1;
    }
    for i in 1..257 {
        ftab[i] += ftab[i - 1];
    }
    for (i, &byte) in block.iter().enumerate() {
        let k = ftab[byte as usize] - 1;
        ftab[byte as usize] = k;
        fmap[k] = i as u32;
    }

    /*
    One bucket-head bit per element: a set bit marks the first element of a bucket.
    32 alternating set/clear pairs past the end act as sentinels for the word-at-a-time scans.
    */
    let mut bhtab: Vec<u32> = vec![0; 4 + end / 32];

    macro_rules! set_bh {
        ($zz:expr) => {
            bhtab[$zz >> 5] |= 1 << ($zz & 31)
        };
    }
    macro_rules! clear_bh {
        ($zz:expr) => {
            bhtab[$zz >> 5] &= !(1 << ($zz & 31))
        };
    }
    macro_rules! isset_bh {
        ($zz:expr) => {
            bhtab[$zz >> 5] & (1 << ($zz & 31)) != 0
        };
    }
    macro_rules! word_bh {
        ($zz:expr) => {
            bhtab[$zz >> 5]
        };
    }
    macro_rules! unaligned_bh {
        ($zz:expr) => {
            ($zz & 0x1f) != 0
        };
    }

    for &head in ftab.iter().take(256) {
        set_bh!(head);
    }
    for i in 0..32 {
        set_bh!(end + 2 * i);
        clear_bh!(end + 2 * i + 1);
    }

    // The log(N) loop
    let mut depth = 1;
    loop {
        trace!("    depth {:6} has", depth);

        let mut j = 0;
        for i in 0..end {
            if isset_bh!(i) {
                j = i;
            }
            let k = (fmap[i] as usize + end - depth % end) % end;
            eclass[k] = j as u32;
        }

        let mut not_done = 0;
        // Right end of the last bucket, plus one.
        let mut k = 0_usize;
        loop {
            // Find the next non-singleton bucket
            while isset_bh!(k) && unaligned_bh!(k) {
                k += 1;
            }
            if isset_bh!(k) {
                while word_bh!(k) == 0xffff_ffff {
                    k += 32;
                }
                while isset_bh!(k) {
                    k += 1;
                }
            }
            let l = k - 1;
            if l >= end {
                break;
            }
            while !isset_bh!(k) && unaligned_bh!(k) {
                k += 1;
            }
            if !isset_bh!(k) {
                while word_bh!(k) == 0 {
                    k += 32;
                }
                while !isset_bh!(k) {
                    k += 1;
                }
            }
            let r = k - 1;
            if r >= end {
                break;
            }

            // Now [l, r] bracket the current bucket
            if r > l {
                not_done += r - l + 1;
                fallback_q_sort3(&mut fmap, &eclass, l as i32, r as i32);

                // Scan the bucket and mark the heads of the new sub-buckets.
                let mut cc = u32::MAX;
                for i in l..=r {
                    let cc1 = eclass[fmap[i] as usize];
                    if cc != cc1 {
                        set_bh!(i);
                        cc = cc1;
                    }
                }
            }
            k = r + 1;
        }

        trace!("    {:6} unresolved strings", not_done);
        depth *= 2;
        if depth > end || not_done == 0 {
            break;
        }
    }
    debug!("Fallback sort finished at depth {}.", depth);
    fmap
}

#[cfg(test)]
mod test {
    use super::fallback_sort;

    /// Sort rotations the slow, obvious way.
    fn naive(block: &[u8]) -> Vec<u32> {
        let n = block.len();
        let mut idx: Vec<u32> = (0..n as u32).collect();
        idx.sort_by(|&a, &b| {
            let ra = block[a as usize..].iter().chain(&block[..a as usize]);
            let rb = block[b as usize..].iter().chain(&block[..b as usize]);
            ra.cmp(rb).then(a.cmp(&b))
        });
        idx
    }

    /// Rotations that compare equal may come out in either order, so compare the rotations.
    fn rotations(block: &[u8], order: &[u32]) -> Vec<Vec<u8>> {
        order
            .iter()
            .map(|&i| [&block[i as usize..], &block[..i as usize]].concat())
            .collect()
    }

    #[test]
    fn banana_test() {
        let block = b"banana";
        assert_eq!(fallback_sort(block), vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn tiny_test() {
        assert_eq!(fallback_sort(b""), Vec::<u32>::new());
        assert_eq!(fallback_sort(b"x"), vec![0]);
        assert_eq!(fallback_sort(b"ba"), vec![1, 0]);
    }

    #[test]
    fn repetitive_test() {
        let block = vec![b'a'; 1000];
        let order = fallback_sort(&block);
        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..1000).collect::<Vec<u32>>());
    }

    #[test]
    fn matches_naive_test() {
        let block: Vec<u8> = (0..3000_u32)
            .map(|i| b"abcab"[((i * i + 3 * i) % 5) as usize])
            .collect();
        let order = fallback_sort(&block);
        assert_eq!(rotations(&block, &order), rotations(&block, &naive(&block)));
    }
}
