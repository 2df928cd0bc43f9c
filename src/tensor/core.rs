//! The tensor handle reductions read from and write into

use super::{Layout, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// A strided view of a device buffer
///
/// Views made by [`transpose`](Self::transpose), [`permute`](Self::permute),
/// [`narrow`](Self::narrow) and [`broadcast_to`](Self::broadcast_to) share
/// the buffer of the tensor they come from. Reductions read such views in
/// place.
///
/// ```
/// use axfold::prelude::*;
///
/// let device = CpuDevice::new();
/// let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device);
/// let t = a.transpose(0, 1)?;
/// assert_eq!(t.to_vec::<f32>(), vec![1.0, 3.0, 2.0, 4.0]);
/// # Ok::<(), axfold::error::Error>(())
/// ```
pub struct Tensor<R: Runtime> {
    storage: Storage<R>,
    layout: Layout,
}

impl<R: Runtime> Tensor<R> {
    /// View `storage` through `layout`
    ///
    /// Fails if the layout reaches outside the buffer.
    pub fn from_parts(storage: Storage<R>, layout: Layout) -> Result<Self> {
        if let Some((lo, hi)) = layout.storage_span() {
            if lo < 0 || hi as usize >= storage.len() {
                return Err(Error::InvalidArgument {
                    arg: "layout",
                    reason: format!(
                        "{layout:?} reaches elements {lo}..={hi} of a buffer of {}",
                        storage.len()
                    ),
                });
            }
        }
        Ok(Self { storage, layout })
    }

    /// Contiguous copy of `data` with the given shape
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not the product of `shape`. See
    /// [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Self {
        Self::try_from_slice(data, shape, device).expect("Tensor::from_slice failed")
    }

    /// Contiguous copy of `data` with the given shape
    pub fn try_from_slice<T: Element>(
        data: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            storage: Storage::from_slice(data, device)?,
            layout: Layout::contiguous(shape),
        })
    }

    /// Contiguous zero-filled tensor
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails. See [`Self::try_zeros`].
    pub fn zeros(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        Self::try_zeros(shape, dtype, device).expect("Tensor::zeros failed")
    }

    /// Contiguous zero-filled tensor
    pub fn try_zeros(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let layout = Layout::contiguous(shape);
        Ok(Self {
            storage: Storage::new(layout.elem_count(), dtype, device)?,
            layout,
        })
    }

    /// Underlying buffer
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Shape, strides and offset
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Axis extents
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Axis strides in elements
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Buffer index of the first element
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Rank
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Owning device
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Whether the elements are dense row-major from buffer index 0
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    fn view(&self, layout: Layout) -> Self {
        Self {
            storage: self.storage.clone(),
            layout,
        }
    }

    /// Swap two axes; negative axes count from the end
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Result<Self> {
        let bad = if self.layout.resolve_dim(dim0).is_none() { dim0 } else { dim1 };
        self.layout
            .transpose(dim0, dim1)
            .map(|layout| self.view(layout))
            .ok_or(Error::InvalidDimension {
                dim: bad,
                ndim: self.ndim(),
            })
    }

    /// Reorder axes; axis `k` of the result is axis `dims[k]`
    pub fn permute(&self, dims: &[usize]) -> Result<Self> {
        self.layout
            .permute(dims)
            .map(|layout| self.view(layout))
            .ok_or_else(|| Error::InvalidArgument {
                arg: "dims",
                reason: format!("{dims:?} is not a permutation of 0..{}", self.ndim()),
            })
    }

    /// Keep `start..start + length` of axis `dim`
    pub fn narrow(&self, dim: isize, start: usize, length: usize) -> Result<Self> {
        let axis = self.layout.resolve_dim(dim).ok_or(Error::InvalidDimension {
            dim,
            ndim: self.ndim(),
        })?;
        self.layout
            .narrow(axis, start, length)
            .map(|layout| self.view(layout))
            .ok_or_else(|| Error::InvalidArgument {
                arg: "start",
                reason: format!(
                    "{start}..{} is outside axis {axis} of length {}",
                    start.saturating_add(length),
                    self.shape()[axis]
                ),
            })
    }

    /// Repeat along size-1 and new leading axes without copying
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        self.layout
            .broadcast_to(shape)
            .map(|layout| self.view(layout))
            .ok_or_else(|| Error::broadcast(self.shape(), shape))
    }

    /// Dense row-major copy, or a cheap clone if already dense
    pub fn contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        let bytes = self.gather_bytes()?;
        Ok(Self {
            storage: Storage::from_bytes(&bytes, self.dtype(), self.device())?,
            layout: Layout::contiguous(self.shape()),
        })
    }

    /// Element bytes in logical row-major order
    fn gather_bytes(&self) -> Result<Vec<u8>> {
        let elem = self.dtype().size_in_bytes();
        let numel = self.numel();
        let mut raw = self.storage.read_bytes()?;
        if self.is_contiguous() {
            raw.truncate(numel * elem);
            return Ok(raw);
        }

        let mut out = Vec::with_capacity(numel * elem);
        let (shape, strides) = (self.shape(), self.strides());
        let mut index: SmallVec<[usize; 4]> = smallvec![0; shape.len()];
        let mut pos = self.offset() as isize;
        for _ in 0..numel {
            let start = pos as usize * elem;
            out.extend_from_slice(&raw[start..start + elem]);
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                pos += strides[axis];
                if index[axis] < shape[axis] {
                    break;
                }
                pos -= strides[axis] * shape[axis] as isize;
                index[axis] = 0;
            }
        }
        Ok(out)
    }

    /// All elements in logical row-major order
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the size of the tensor's element type or the
    /// device read fails.
    pub fn to_vec<T: bytemuck::Pod>(&self) -> Vec<T> {
        assert_eq!(
            std::mem::size_of::<T>(),
            self.dtype().size_in_bytes(),
            "to_vec::<{}>() on a {} tensor",
            std::any::type_name::<T>(),
            self.dtype()
        );
        let bytes = self.gather_bytes().expect("device read failed in to_vec()");
        bytemuck::pod_collect_to_vec(&bytes[..])
    }

    /// The only element of a one-element tensor
    pub fn item<T: bytemuck::Pod>(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![],
                got: self.shape().to_vec(),
            });
        }
        if std::mem::size_of::<T>() != self.dtype().size_in_bytes() {
            return Err(Error::InvalidArgument {
                arg: "T",
                reason: format!(
                    "{} read from a {} tensor",
                    std::any::type_name::<T>(),
                    self.dtype()
                ),
            });
        }
        Ok(bytemuck::pod_read_unaligned(&self.gather_bytes()?[..]))
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    fn clone(&self) -> Self {
        self.view(self.layout.clone())
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype())
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .finish()
    }
}
