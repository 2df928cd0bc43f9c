//! Tensor operations
//!
//! This module defines the reduction operation trait, its CPU implementation,
//! the axis/shape helpers every reduction shares and the registry of native
//! reduction kernels.
//!
//! # Design
//!
//! Operations are defined as traits that are implemented by `RuntimeClient`.
//! This gives operations access to the device for creating output tensors.
//!
//! ```text
//! RuntimeClient<R>
//!   └── implements ReduceOps<R>
//!         ├── argmax, argmin           (positional, I64 output)
//!         ├── sum, sum_as, mean        (accumulating)
//!         └── amax, amin               (NaN-propagating extremes)
//! ```
//!
//! Each operation validates its arguments, dispatches on the runtime dtype
//! with [`dispatch_dtype!`](crate::dispatch_dtype) and runs a reduction policy
//! through the strided kernel in `runtime::cpu::kernels`.
//!
//! # Helpers
//!
//! - [`is_valid_reduction_shape`] - Check an output shape against input and axes
//! - [`reduce_output_shape`] - Compute reduction output shape
//! - [`normalize_axes`] - Resolve negative axes and reject duplicates

pub(crate) mod cpu;
mod dispatch;
mod reduce;
pub mod registry;
mod traits;

pub use reduce::*;
pub use traits::ReduceOps;
