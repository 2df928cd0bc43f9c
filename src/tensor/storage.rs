//! Reference-counted device buffers

use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::runtime::Runtime;
use std::sync::Arc;

/// A typed allocation on one device, shared by every view of it
///
/// Cloning shares the buffer; it is released when the last clone drops.
pub struct Storage<R: Runtime> {
    buf: Arc<Buffer<R>>,
}

struct Buffer<R: Runtime> {
    handle: u64,
    len: usize,
    dtype: DType,
    device: R::Device,
}

impl<R: Runtime> Buffer<R> {
    fn size_in_bytes(&self) -> usize {
        self.len * self.dtype.size_in_bytes()
    }
}

impl<R: Runtime> Drop for Buffer<R> {
    fn drop(&mut self) {
        R::deallocate(self.handle, self.size_in_bytes(), &self.device);
    }
}

impl<R: Runtime> Storage<R> {
    fn wrap(handle: u64, len: usize, dtype: DType, device: &R::Device) -> Self {
        Self {
            buf: Arc::new(Buffer {
                handle,
                len,
                dtype,
                device: device.clone(),
            }),
        }
    }

    /// `len` zeroed elements of `dtype`
    pub fn new(len: usize, dtype: DType, device: &R::Device) -> Result<Self> {
        let handle = R::allocate(len * dtype.size_in_bytes(), device)?;
        Ok(Self::wrap(handle, len, dtype, device))
    }

    /// Copy of `data`
    pub fn from_slice<T: Element>(data: &[T], device: &R::Device) -> Result<Self> {
        Self::from_bytes(bytemuck::cast_slice(data), T::DTYPE, device)
    }

    /// Copy of raw element bytes of `dtype`
    pub fn from_bytes(bytes: &[u8], dtype: DType, device: &R::Device) -> Result<Self> {
        let storage = Self::new(bytes.len() / dtype.size_in_bytes(), dtype, device)?;
        R::copy_to_device(bytes, storage.handle(), device)?;
        Ok(storage)
    }

    /// Device handle of element 0
    #[inline]
    pub fn handle(&self) -> u64 {
        self.buf.handle
    }

    /// Length in elements
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len
    }

    /// Whether the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.len == 0
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.buf.dtype
    }

    /// Owning device
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.buf.device
    }

    /// Whether `self` and `other` are views of one allocation
    #[inline]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }

    /// Every byte of the buffer, copied to the host
    pub(crate) fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; self.buf.size_in_bytes()];
        R::copy_from_device(self.handle(), &mut bytes, self.device())?;
        Ok(bytes)
    }
}

impl<R: Runtime> Clone for Storage<R> {
    fn clone(&self) -> Self {
        Self {
            buf: Arc::clone(&self.buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_from_slice_copies_bytes() {
        let device = CpuDevice::new();
        let storage = Storage::<CpuRuntime>::from_slice(&[1u16, 2, 3], &device).unwrap();
        assert_eq!(storage.len(), 3);
        assert_eq!(storage.dtype(), DType::U16);
        assert_eq!(storage.read_bytes().unwrap(), vec![1, 0, 2, 0, 3, 0]);
    }

    #[test]
    fn test_clones_share_one_buffer() {
        let device = CpuDevice::new();
        let a = Storage::<CpuRuntime>::new(4, DType::I64, &device).unwrap();
        assert!(a.same_buffer(&a.clone()));

        let b = Storage::<CpuRuntime>::new(4, DType::I64, &device).unwrap();
        assert!(!a.same_buffer(&b));
    }

    #[test]
    fn test_empty_buffer_has_null_handle() {
        let s = Storage::<CpuRuntime>::new(0, DType::F64, &CpuDevice::new()).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.handle(), 0);
        assert!(s.read_bytes().unwrap().is_empty());
    }
}
