//! This helper function is part of the huffman encoding system.
//!
//! The main huffman encoding function generates frequency weight tables for each coding table. This helper
//! function generates huffman code lengths (depth tables) from those frequency weights. The encoder keeps
//! code lengths at or below 17 bits. If the weights supplied create longer codes, the weights will be
//! flattened and another attempt will be made to generate the lengths.
//!
//! The tree is built bottom up with a binary min-heap of node numbers. Each node weight carries the
//! frequency in its upper 24 bits and the depth of the subtree in its low 8 bits, so that between two
//! equal frequencies the shallower subtree is merged first.

use super::huffman::MAX_ALPHA_SIZE;

/// Fill `lengths[..alpha_size]` with code lengths for the symbol frequencies in `freqs`.
/// Every length is between 1 and `max_len`. Symbols with a frequency of 0 still get a code.
pub fn code_lengths_from_weights(
    lengths: &mut [u8],
    freqs: &[u32],
    alpha_size: usize,
    max_len: u8,
) {
    debug_assert!((2..=MAX_ALPHA_SIZE).contains(&alpha_size));

    // Node numbers start at 1. Node 0 is a sentinel with weight 0 at the top of the heap.
    let mut heap = [0_usize; MAX_ALPHA_SIZE + 2];
    let mut weight = [0_u32; MAX_ALPHA_SIZE * 2];
    let mut parent = [0_i32; MAX_ALPHA_SIZE * 2];

    for i in 0..alpha_size {
        weight[i + 1] = freqs[i].max(1) << 8;
    }

    loop {
        let mut n_nodes = alpha_size;
        let mut n_heap = 0;
        heap[0] = 0;
        weight[0] = 0;
        parent[0] = -2;

        for i in 1..=alpha_size {
            parent[i] = -1;
            n_heap += 1;
            heap[n_heap] = i;
            up_heap(&mut heap, &weight, n_heap);
        }

        while n_heap > 1 {
            let n1 = heap[1];
            heap[1] = heap[n_heap];
            n_heap -= 1;
            down_heap(&mut heap, &weight, n_heap, 1);
            let n2 = heap[1];
            heap[1] = heap[n_heap];
            n_heap -= 1;
            down_heap(&mut heap, &weight, n_heap, 1);

            n_nodes += 1;
            parent[n1] = n_nodes as i32;
            parent[n2] = n_nodes as i32;
            weight[n_nodes] = add_weights(weight[n1], weight[n2]);
            parent[n_nodes] = -1;
            n_heap += 1;
            heap[n_heap] = n_nodes;
            up_heap(&mut heap, &weight, n_heap);
        }

        // The length of each code is the number of steps from its leaf to the root.
        let mut too_long = false;
        for i in 1..=alpha_size {
            let mut depth = 0_u8;
            let mut k = i;
            while parent[k] >= 0 {
                k = parent[k] as usize;
                depth += 1;
            }
            lengths[i - 1] = depth;
            too_long |= depth > max_len;
        }

        if !too_long {
            break;
        }
        // Flatten the weights by dividing each weight by 2 and adding 1, then try again.
        for w in weight.iter_mut().take(alpha_size + 1).skip(1) {
            let j = 1 + ((*w >> 8) / 2);
            *w = j << 8;
        }
    }
}

/// Move the node at `z` up the heap until its parent is no heavier.
#[inline]
fn up_heap(heap: &mut [usize], weight: &[u32], mut z: usize) {
    let tmp = heap[z];
    while weight[tmp] < weight[heap[z >> 1]] {
        heap[z] = heap[z >> 1];
        z >>= 1;
    }
    heap[z] = tmp;
}

/// Move the node at `z` down the heap until neither child is lighter.
#[inline]
fn down_heap(heap: &mut [usize], weight: &[u32], n_heap: usize, mut z: usize) {
    let tmp = heap[z];
    loop {
        let mut y = z << 1;
        if y > n_heap {
            break;
        }
        if y < n_heap && weight[heap[y + 1]] < weight[heap[y]] {
            y += 1;
        }
        if weight[tmp] < weight[heap[y]] {
            break;
        }
        heap[z] = heap[y];
        z = y;
    }
    heap[z] = tmp;
}

/// Julian's version of weight adding for parent nodes
#[inline(always)]
fn add_weights(a: u32, b: u32) -> u32 {
    let weight_mask: u32 = 0xffffff00;
    let depth_mask: u32 = 0x000000ff;
    ((a & weight_mask) + (b & weight_mask)) | (1 + (a & depth_mask).max(b & depth_mask))
}

#[cfg(test)]
mod test {
    use super::{add_weights, code_lengths_from_weights};

    /// Kraft sum scaled by 2^max: a complete prefix code sums to exactly 2^max.
    fn kraft(lengths: &[u8], max: u8) -> u64 {
        lengths.iter().map(|&l| 1_u64 << (max - l)).sum()
    }

    #[test]
    fn add_weights_test() {
        assert_eq!(add_weights(5 << 8 | 2, 7 << 8), 12 << 8 | 3);
    }

    #[test]
    fn balanced_test() {
        let mut lengths = [0_u8; 4];
        code_lengths_from_weights(&mut lengths, &[10, 10, 10, 10], 4, 17);
        assert_eq!(lengths, [2, 2, 2, 2]);
    }

    #[test]
    fn skewed_test() {
        let mut lengths = [0_u8; 4];
        code_lengths_from_weights(&mut lengths, &[100, 50, 20, 10], 4, 17);
        assert_eq!(lengths, [1, 2, 3, 3]);
    }

    #[test]
    fn zero_freqs_get_codes_test() {
        let mut lengths = [0_u8; 5];
        code_lengths_from_weights(&mut lengths, &[1000, 0, 0, 0, 1], 5, 17);
        assert!(lengths.iter().all(|&l| l >= 1));
        assert_eq!(kraft(&lengths, 17), 1 << 17);
    }

    #[test]
    fn length_limit_test() {
        // Fibonacci frequencies make the deepest possible tree.
        let mut freqs = vec![1_u32, 1];
        while freqs.len() < 30 {
            let n = freqs.len();
            freqs.push(freqs[n - 1] + freqs[n - 2]);
        }
        let mut lengths = [0_u8; 30];
        code_lengths_from_weights(&mut lengths, &freqs, 30, 17);
        assert!(lengths.iter().all(|&l| (1..=17).contains(&l)));
        assert_eq!(kraft(&lengths, 17), 1 << 17);
    }
}
