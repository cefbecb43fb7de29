//! Julian Seward's main sort: a 2-byte radix sort followed by a budgeted multikey quick sort
//! with quadrant tie-breaks.
pub mod main_gtu;
pub mod main_q_sort3;
pub mod main_simple_sort;
pub mod main_sort;
