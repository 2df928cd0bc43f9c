//! Helper functions for CPU tensor operations
//!
//! Argument validation and dtype dispatch sitting between the `ReduceOps`
//! implementation and the raw kernels.

pub mod reduce;

pub use reduce::{
    alloc_reduce_output, amax_impl, amin_impl, argmax_impl, argmin_impl, mean_impl,
    reduce_by_kind, sum_impl,
};
