//! # axfold
//!
//! **Axis-wise reductions over strided n-dimensional tensors.**
//!
//! axfold computes sum, max, min, mean, argmax and argmin over any subset of a
//! tensor's axes, for every numeric element type, reading transposed,
//! narrowed and broadcast views directly through their strides.
//!
//! ## Features
//!
//! - **Strided reductions**: One pass over the input, any rank, any axis set
//! - **Defined numerics**: NaN-propagating max/min, f32 accumulation for
//!   half-precision sums, first-occurrence argmax/argmin
//! - **Multiple dtypes**: f64, f32, f16, bf16, signed and unsigned integers
//! - **Kernel registry**: Reductions callable by kind or name through a
//!   process-wide table
//!
//! ## Quick Start
//!
//! ```rust
//! use axfold::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//!
//! let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 3.0, 2.0, 4.0, 0.0, 6.0], &[2, 3], &device);
//! let sums = client.sum(&a, &[-1], false)?;
//! assert_eq!(sums.to_vec::<f32>(), vec![6.0, 10.0]);
//!
//! let maxes = client.amax(&a.transpose(0, 1)?, &[1], false)?;
//! assert_eq!(maxes.to_vec::<f32>(), vec![4.0, 3.0, 6.0]);
//! # Ok::<(), axfold::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend in the prelude
//! - `f16` (default): Half-precision floats (F16, BF16)
//!
//! ## Logging
//!
//! Operations emit `tracing` events (`debug` per call, `trace` per kernel
//! run). Install a subscriber in the application to see them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{AccumulationPrecision, ReduceOps};
    pub use crate::runtime::{Device, Runtime, RuntimeClient};
    pub use crate::tensor::{Layout, Tensor};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
}

/// Default runtime
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
