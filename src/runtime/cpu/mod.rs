//! CPU runtime implementation
//!
//! The CPU runtime uses standard heap allocation and runs every reduction as
//! a single-threaded strided pass over the input.
//!
//! # Non-contiguous Tensors
//!
//! Reductions read inputs and write outputs through their strides and
//! offsets directly, so transposed, narrowed and broadcast (stride-0) views
//! are reduced without first being copied.

mod client;
mod device;
pub(crate) mod helpers;
pub(crate) mod kernels;
mod runtime;

pub use crate::tensor::Tensor;
pub use client::CpuClient;
pub use device::CpuDevice;
pub use kernels::reduce::{
    AMaxPolicy, AMinPolicy, ArgExtremum, ArgMaxPolicy, ArgMinPolicy, MeanPolicy, ReducePolicy,
    SumPolicy, reduce_with_policy,
};
pub use runtime::CpuRuntime;
