use super::main_sort::QsortData;

/// Is the rotation starting at `a` greater than the one starting at `b`?
///
/// The first 12 bytes are compared directly. After that the quadrant values are compared as
/// well, 8 positions at a time, wrapping around the end of the block. Every 8 positions costs
/// one unit of the work budget. Both indexes may start up to 15 bytes past the end of the
/// block, which the overshoot copy at the end of `block` and `quadrant` covers.
pub fn main_gtu(mut a: usize, mut b: usize, qs: &mut QsortData) -> bool {
    debug_assert_ne!(a, b, "mainGtU called on identical rotations");

    macro_rules! check_bd {
        () => {
            if qs.block[a] != qs.block[b] {
                return qs.block[a] > qs.block[b];
            }
            a += 1;
            b += 1;
        };
    }
    macro_rules! check_bdq {
        () => {
            if qs.block[a] != qs.block[b] {
                return qs.block[a] > qs.block[b];
            }
            if qs.quadrant[a] != qs.quadrant[b] {
                return qs.quadrant[a] > qs.quadrant[b];
            }
            a += 1;
            b += 1;
        };
    }

    // Check block data 12 times
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();
    check_bd!();

    let mut k: i64 = qs.nblock as i64 + 8;
    while k >= 0 {
        // Check block data then quadrant data 8 times
        check_bdq!();
        check_bdq!();
        check_bdq!();
        check_bdq!();
        check_bdq!();
        check_bdq!();
        check_bdq!();
        check_bdq!();

        // Wrap around the end of the block.
        if a >= qs.nblock {
            a -= qs.nblock;
        }
        if b >= qs.nblock {
            b -= qs.nblock;
        }
        k -= 8;
        qs.budget -= 1;
    }
    // The rotations are identical
    false
}

#[cfg(test)]
mod test {
    use super::main_gtu;
    use crate::bwt_algorithms::primary::main_sort::QsortData;

    #[test]
    fn direct_compare_test() {
        let mut qs = QsortData::new(b"abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyz0");
        // "b..." > "a..."
        assert!(main_gtu(1, 0, &mut qs));
        assert!(!main_gtu(0, 1, &mut qs));
        assert_eq!(qs.budget, 0);
    }

    #[test]
    fn wrap_and_budget_test() {
        // A block of one repeated byte: every rotation is equal, so the whole block is scanned.
        let block = vec![7_u8; 100];
        let mut qs = QsortData::new(&block);
        assert!(!main_gtu(3, 50, &mut qs));
        assert!(qs.budget < 0);
    }
}
