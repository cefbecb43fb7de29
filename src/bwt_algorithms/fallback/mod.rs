//! The exponential radix sort used for small blocks and for blocks the main sort gives up on.
pub mod fallback_q_sort3;
pub mod fallback_sort;
