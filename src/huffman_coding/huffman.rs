//! Huffman stage of the block encoder.
//!
//! The MTF/RLE2 symbol stream of a block is cut into groups of 50 symbols. Each group is coded with
//! one of 2 to 6 coding tables, and a selector per group records which. Tables are first seeded by
//! splitting the symbol alphabet into bands of roughly equal total frequency, then improved over
//! several passes: each group picks the table that codes it most cheaply, and each table is rebuilt
//! from the frequencies of the groups that picked it.
use log::{debug, trace};

use super::canonical::{assign_codes, length_range};
use super::huffman_code_from_weights::code_lengths_from_weights;
use crate::bitstream::bitwriter::BitWriter;
use crate::tools::rle2_mtf::MtfValues;
use crate::tools::symbol_map::encode_sym_map;

pub use crate::tools::rle2_mtf::MAX_ALPHA_SIZE;

/// Symbols per selector group
pub const GROUP_SIZE: usize = 50;
/// Most coding tables a block may carry
pub const MAX_TABLES: usize = 6;
/// Longest code the encoder produces. Decoders accept up to 20.
pub const MAX_ENCODE_LEN: u8 = 17;
/// Refinement passes over the symbol stream
pub const ITERATIONS: usize = 4;

const LESSER_ICOST: u8 = 0;
const GREATER_ICOST: u8 = 15;

/// How many coding tables a block of `n_mtf` symbols gets.
pub fn table_count(n_mtf: usize) -> usize {
    match n_mtf {
        0..=199 => 2,
        200..=599 => 3,
        600..=1199 => 4,
        1200..=2399 => 5,
        _ => 6,
    }
}

/// Seed the coding tables. Each table gets a band of symbols whose total frequency is about
/// an equal share of the block. Symbols inside the band cost 0 and all others cost 15.
fn init_tables(
    freqs: &[u32],
    n_mtf: usize,
    table_count: usize,
    alpha_size: usize,
) -> [[u8; MAX_ALPHA_SIZE]; MAX_TABLES] {
    let mut tables = [[GREATER_ICOST; MAX_ALPHA_SIZE]; MAX_TABLES];

    let mut n_part = table_count;
    let mut rem_f = n_mtf as i64;
    let mut gs = 0_i64;
    while n_part > 0 {
        let t_freq = rem_f / n_part as i64;
        let mut ge = gs - 1;
        let mut a_freq = 0_i64;
        while a_freq < t_freq && ge < alpha_size as i64 - 1 {
            ge += 1;
            a_freq += freqs[ge as usize] as i64;
        }
        // Every other middle table gives back its last symbol, so the later tables are not starved.
        if ge > gs && n_part != table_count && n_part != 1 && (table_count - n_part) % 2 == 1 {
            a_freq -= freqs[ge as usize] as i64;
            ge -= 1;
        }
        for (v, cost) in tables[n_part - 1].iter_mut().enumerate().take(alpha_size) {
            let v = v as i64;
            *cost = if v >= gs && v <= ge {
                LESSER_ICOST
            } else {
                GREATER_ICOST
            };
        }
        n_part -= 1;
        gs = ge + 1;
        rem_f -= a_freq;
    }
    tables
}

/// Encode a block's MTF/RLE2 symbols using the multi-table system, writing the symbol map,
/// selectors, coding tables and coded symbols to the bitstream.
pub fn huf_encode(bw: &mut BitWriter, mtf: &MtfValues, in_use: &[bool; 256], iterations: usize) {
    let symbols = &mtf.mtfv;
    let n_mtf = symbols.len();
    let alpha_size = mtf.eob as usize + 1;
    let table_count = table_count(n_mtf);

    let mut tables = init_tables(&mtf.freqs, n_mtf, table_count, alpha_size);
    let selector_count = n_mtf.div_ceil(GROUP_SIZE);
    let mut selectors = vec![0_u8; selector_count];

    for iter in 0..iterations {
        // For reporting only
        let mut favorites = [0; MAX_TABLES];
        let mut total_cost = 0;
        // Frequencies seen by each table this pass
        let mut rfreq = [[0_u32; MAX_ALPHA_SIZE]; MAX_TABLES];

        for (i, chunk) in symbols.chunks(GROUP_SIZE).enumerate() {
            let mut cost = [0_u32; MAX_TABLES];
            for &sym in chunk {
                for (t, c) in cost.iter_mut().enumerate().take(table_count) {
                    *c += tables[t][sym as usize] as u32;
                }
            }

            // First table with the lowest cost
            let mut bt = 0;
            for t in 1..table_count {
                if cost[t] < cost[bt] {
                    bt = t;
                }
            }
            total_cost += cost[bt];
            favorites[bt] += 1;
            selectors[i] = bt as u8;
            for &sym in chunk {
                rfreq[bt][sym as usize] += 1;
            }
        }

        debug!(
            "      pass {}: size is {}, grp uses are {:?}",
            iter + 1,
            total_cost / 8,
            &favorites[..table_count]
        );

        for t in 0..table_count {
            code_lengths_from_weights(&mut tables[t], &rfreq[t], alpha_size, MAX_ENCODE_LEN);
        }
    }

    // Selectors are written after a Move-To-Front transform, to save space.
    let mut table_idx = [0_u8, 1, 2, 3, 4, 5];
    let mtf_selectors: Vec<u8> = selectors
        .iter()
        .map(|&sel| {
            let mut j = 0;
            let mut carry = table_idx[0];
            while carry != sel {
                j += 1;
                std::mem::swap(&mut carry, &mut table_idx[j]);
            }
            table_idx[0] = carry;
            j as u8
        })
        .collect();

    // Canonical codes for each table
    let mut codes = [[0_u32; MAX_ALPHA_SIZE]; MAX_TABLES];
    for t in 0..table_count {
        let (min_len, max_len) = length_range(&tables[t], alpha_size);
        assign_codes(&mut codes[t], &tables[t], min_len, max_len, alpha_size);
    }

    // Symbol maps, 16 bit L1 + 1-16 words of 16 bit L2 maps.
    let start = bw.loc();
    for word in encode_sym_map(in_use) {
        bw.write_bits(16, word as u32);
    }
    trace!("Symbol maps written at {}.", start);

    // Table count, selector count, then the selectors in unary.
    bw.write_bits(3, table_count as u32);
    bw.write_bits(15, selector_count as u32);
    for &sel in &mtf_selectors {
        for _ in 0..sel {
            bw.write_bit(true);
        }
        bw.write_bit(false);
    }
    trace!(
        "{} Selectors written, now at {}.",
        selector_count,
        bw.loc()
    );

    /*
    Next we write out the symbol lengths that will be used in the decompression.
    They start with an "origin" length of five bits taken from the first symbol.
    Each symbol's length (INCLUDING THE FIRST SYMBOL) will be output as the delta
    from the last symbol. Each delta step is exactly 2 bits long, a 10 (+1) or
    a 11 (-1). The end of the delta is indicated with a single zero bit.
    */
    for table in tables.iter().take(table_count) {
        let mut curr = table[0];
        bw.write_bits(5, curr as u32);
        for &len in table.iter().take(alpha_size) {
            while curr < len {
                bw.write_bits(2, 2);
                curr += 1;
            }
            while curr > len {
                bw.write_bits(2, 3);
                curr -= 1;
            }
            bw.write_bit(false);
        }
    }
    trace!("Coding tables written, now at {}.", bw.loc());

    // And finally the block data proper, switching tables every 50 symbols.
    for (chunk, &sel) in symbols.chunks(GROUP_SIZE).zip(&selectors) {
        let t = sel as usize;
        for &sym in chunk {
            bw.write_bits(tables[t][sym as usize] as u32, codes[t][sym as usize]);
        }
    }
}

#[cfg(test)]
mod test {
    use super::{init_tables, table_count, GREATER_ICOST, LESSER_ICOST};

    #[test]
    fn table_count_test() {
        assert_eq!(table_count(1), 2);
        assert_eq!(table_count(199), 2);
        assert_eq!(table_count(200), 3);
        assert_eq!(table_count(1199), 4);
        assert_eq!(table_count(2399), 5);
        assert_eq!(table_count(2400), 6);
    }

    #[test]
    fn init_tables_test() {
        // Three tables over six symbols of equal frequency.
        let freqs = [100_u32, 100, 100, 100, 100, 100];
        let tables = init_tables(&freqs, 600, 3, 6);
        // The last table takes the first band.
        assert_eq!(&tables[2][..6], &[0, 0, GREATER_ICOST, 15, 15, 15]);
        // The middle table gives back its last symbol.
        assert_eq!(&tables[1][..6], &[15, 15, LESSER_ICOST, 15, 15, 15]);
        assert_eq!(&tables[0][..6], &[15, 15, 15, 0, 0, 0]);
    }
}
