//! Host-memory backend

use super::client::CpuClient;
use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{Layout, alloc_zeroed, dealloc};

/// Alignment of every allocation, enough for any element type
const ALIGN: usize = 64;

/// CPU backend; handles are host pointers
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

fn alloc_layout(size_bytes: usize) -> Result<Layout> {
    Layout::from_size_align(size_bytes, ALIGN).map_err(|_| Error::OutOfMemory { size: size_bytes })
}

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Client = CpuClient;

    fn allocate(size_bytes: usize, _device: &CpuDevice) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }
        let ptr = unsafe { alloc_zeroed(alloc_layout(size_bytes)?) };
        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }
        Ok(ptr as u64)
    }

    fn deallocate(handle: u64, size_bytes: usize, _device: &CpuDevice) {
        if handle == 0 {
            return;
        }
        // `allocate` accepted this size, so the layout is valid.
        if let Ok(layout) = alloc_layout(size_bytes) {
            unsafe { dealloc(handle as *mut u8, layout) }
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &CpuDevice) -> Result<()> {
        if !src.is_empty() {
            unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len()) }
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &CpuDevice) -> Result<()> {
        if !dst.is_empty() {
            unsafe { std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len()) }
        }
        Ok(())
    }

    fn default_client(device: &CpuDevice) -> CpuClient {
        CpuClient::new(device.clone())
    }
}
