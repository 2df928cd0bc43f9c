//! CPU kernel implementations
//!
//! Low-level compute kernels over raw pointers. Kernels are generic over a
//! reduction policy and carry no error path; the helpers validate arguments
//! before calling them.

#![allow(unsafe_op_in_unsafe_fn)] // Kernels are already marked unsafe, inner unsafe is redundant

pub mod reduce;
