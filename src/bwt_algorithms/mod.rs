//! The bwt_algorithms module forms the critical sorting subsystem of the codec.
//!
//! BZIP2 uses the Burrow-Wheeler Transform (BWT) to prepare data for compression. This transform alters the data in such
//! a way that runs of similar bytes are more likely to occur. This allows for more effective compression.
//!
//! The Burrow-Wheeler Transform requires "computationally expensive" sorting. Since different sorting algorithms are better
//! suited for different kinds of data, this module contains two sorting algorithms and a policy choosing between them:
//! - primary: the fast main sort, which gives up once its work budget is spent.
//! - fallback: the slower exponential radix sort with a guaranteed worst case.
//! - block_sort: the policy, plus extraction of the BWT output.
//! - inverse: the block buffer the decoder rebuilds the original block from.
//!
pub mod block_sort;
pub mod fallback;
pub mod inverse;
pub mod primary;
