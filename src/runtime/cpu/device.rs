//! CPU device

use crate::runtime::Device;

/// A logical CPU device
///
/// Every index shares host memory, but tensors on different indices are
/// still rejected as incompatible by the reductions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuDevice {
    id: usize,
}

impl CpuDevice {
    /// Device `cpu:0`
    pub fn new() -> Self {
        Self::default()
    }

    /// Device `cpu:<id>`
    pub fn with_index(id: usize) -> Self {
        Self { id }
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        format!("cpu:{}", self.id)
    }
}
