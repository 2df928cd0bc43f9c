//! Backends that own tensor memory and run reductions
//!
//! A [`Runtime`] ties together a device type, a client type that carries the
//! reduction operations, and the raw memory primitives tensors are built on.
//! Only the CPU backend exists.

pub mod cpu;

use crate::error::{Error, Result};

/// Compute backend
///
/// Memory is addressed through opaque `u64` handles; `0` is the handle of
/// every zero-sized allocation.
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier
    type Device: Device;

    /// Handle the reduction operations are called on
    type Client: RuntimeClient<Self>;

    /// Allocate `size_bytes` of zeroed memory on `device`
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Release memory returned by [`Runtime::allocate`]
    fn deallocate(handle: u64, size_bytes: usize, device: &Self::Device);

    /// Copy host bytes to the start of `dst`
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy `dst.len()` bytes from the start of `src` to the host
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Client bound to `device`
    fn default_client(device: &Self::Device) -> Self::Client;
}

/// A place tensors live
pub trait Device: Clone + Send + Sync + 'static {
    /// Index distinguishing devices of one backend
    fn id(&self) -> usize;

    /// Name used in error messages
    fn name(&self) -> String {
        format!("device:{}", self.id())
    }

    /// Fail with [`Error::DeviceMismatch`] unless `other` is the same device
    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.id() == other.id() {
            return Ok(());
        }
        Err(Error::DeviceMismatch {
            lhs: self.name(),
            rhs: other.name(),
        })
    }
}

/// Operation entry point bound to one device
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// Device outputs are allocated on
    fn device(&self) -> &R::Device;
}
