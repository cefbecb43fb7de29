//! The symbol map records which byte values occur in a block.
//!
//! There are 256 possible u8s, which equals 16 sets of 16 u8s. The first u16 of the map has a bit
//! set for each set of 16 that holds at least one used byte. It is followed by one u16 for each of
//! those sets, with a bit set for each byte value actually used. Most significant bit first.

const BIT_MASK: u16 = 0x8000;

/// Takes an in-use table for all 256 byte values and returns the bzip2 symbol map:
/// the index word followed by only those 16-bit words that have bits set.
pub fn encode_sym_map(in_use: &[bool; 256]) -> Vec<u16> {
    let mut sym_maps: Vec<u16> = vec![0; 17];

    // Eg 'A' is 0100_0001, so map 4 (0100) would have bit 1 (0001) set.
    for (idx, _) in in_use.iter().enumerate().filter(|(_, &used)| used) {
        sym_maps[0] |= BIT_MASK >> (idx >> 4);
        sym_maps[1 + (idx >> 4)] |= BIT_MASK >> (idx & 15);
    }

    // Keep the index word even when it is empty, then only the words in use.
    let index = sym_maps[0];
    let mut out = vec![index];
    out.extend(sym_maps.into_iter().skip(1).filter(|&map| map > 0));
    out
}

/// Takes the unique bzip2 symbol map and returns a sorted vec of all
/// u8s used in the block. The map must hold one word per bit set in the index word.
pub fn decode_sym_map(symbol_map: &[u16]) -> Vec<u8> {
    let mut symbols: Vec<u8> = Vec::with_capacity(256);
    // Position of the next per-set word
    let mut map_idx = 0;

    for block in 0..16_u8 {
        if (symbol_map[0] & (BIT_MASK >> block)) > 0 {
            map_idx += 1;
            let word = symbol_map.get(map_idx).copied().unwrap_or(0);
            for byte_idx in 0..16_u8 {
                if (word & (BIT_MASK >> byte_idx)) > 0 {
                    // block * 16 + byte_idx is the byte value we found
                    symbols.push((block << 4) + byte_idx);
                };
            }
        }
    }
    symbols
}
