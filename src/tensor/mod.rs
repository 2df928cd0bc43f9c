//! Tensor types
//!
//! This module provides the `Tensor` type reductions read from and write to:
//! an n-dimensional strided view into reference-counted device storage.

mod core;
mod layout;
mod storage;

pub use core::Tensor;
pub use layout::{Layout, Shape, Strides};
pub use storage::Storage;
