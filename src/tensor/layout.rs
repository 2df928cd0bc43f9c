//! Strided view description: extents, element strides and a base offset

use smallvec::SmallVec;

/// Extents of a tensor, one per axis
pub type Shape = SmallVec<[usize; 4]>;

/// Per-axis distance, in elements, between neighbouring elements
///
/// Zero marks a broadcast axis.
pub type Strides = SmallVec<[isize; 4]>;

/// How a tensor's logical indices map onto its storage
///
/// Element `[i0, .., in]` lives at `offset + sum(ik * strides[k])`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Strides,
    offset: usize,
}

/// Row-major strides for `shape`
fn row_major(shape: &[usize]) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(1, shape.len());
    for axis in (1..shape.len()).rev() {
        strides[axis - 1] = strides[axis] * shape[axis] as isize;
    }
    strides
}

impl Layout {
    /// Dense row-major layout starting at element 0
    ///
    /// ```
    /// use axfold::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        Self {
            shape: shape.iter().copied().collect(),
            strides: row_major(shape),
            offset: 0,
        }
    }

    /// Arbitrary strided layout
    ///
    /// `shape` and `strides` must have the same length.
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Axis extents
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Axis strides in elements
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Storage index of the first logical element
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rank
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of logical elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the view is dense row-major data starting at storage index 0
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == row_major(&self.shape)
    }

    /// Resolve a possibly negative axis (`-1` is the last one)
    pub fn resolve_dim(&self, dim: isize) -> Option<usize> {
        let ndim = self.ndim() as isize;
        let resolved = if dim < 0 { dim + ndim } else { dim };
        (0..ndim).contains(&resolved).then_some(resolved as usize)
    }

    /// Same elements with axes `dim0` and `dim1` swapped
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Option<Self> {
        let (a, b) = (self.resolve_dim(dim0)?, self.resolve_dim(dim1)?);
        let mut view = self.clone();
        view.shape.swap(a, b);
        view.strides.swap(a, b);
        Some(view)
    }

    /// Axis `k` of the result is axis `dims[k]` of `self`
    ///
    /// `None` unless `dims` is a permutation of `0..ndim`.
    pub fn permute(&self, dims: &[usize]) -> Option<Self> {
        let mut sorted: SmallVec<[usize; 4]> = dims.iter().copied().collect();
        sorted.sort_unstable();
        if !sorted.iter().copied().eq(0..self.ndim()) {
            return None;
        }
        Some(Self {
            shape: dims.iter().map(|&d| self.shape[d]).collect(),
            strides: dims.iter().map(|&d| self.strides[d]).collect(),
            offset: self.offset,
        })
    }

    /// Restrict axis `dim` to `start..start + length`
    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Option<Self> {
        if dim >= self.ndim() || start.checked_add(length)? > self.shape[dim] {
            return None;
        }
        let offset = self.offset as isize + start as isize * self.strides[dim];
        let mut view = self.clone();
        view.shape[dim] = length;
        view.offset = usize::try_from(offset).ok()?;
        Some(view)
    }

    /// Stretch size-1 and missing leading axes to `target` with zero strides
    pub fn broadcast_to(&self, target: &[usize]) -> Option<Self> {
        let pad = target.len().checked_sub(self.ndim())?;
        let mut strides: Strides = SmallVec::from_elem(0, target.len());
        for (axis, (&len, &stride)) in self.shape.iter().zip(&self.strides).enumerate() {
            match target[pad + axis] {
                t if t == len => strides[pad + axis] = stride,
                _ if len == 1 => {}
                _ => return None,
            }
        }
        Some(Self::new(target.iter().copied().collect(), strides, self.offset))
    }

    /// Lowest and highest storage index the view can touch
    ///
    /// `None` when the view has no elements.
    pub fn storage_span(&self) -> Option<(isize, isize)> {
        if self.elem_count() == 0 {
            return None;
        }
        let base = self.offset as isize;
        Some(self.shape.iter().zip(&self.strides).fold(
            (base, base),
            |(lo, hi), (&len, &stride)| {
                let reach = (len as isize - 1) * stride;
                (lo + reach.min(0), hi + reach.max(0))
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_strides() {
        assert_eq!(Layout::contiguous(&[2, 3, 4]).strides(), &[12, 4, 1]);
        assert_eq!(Layout::contiguous(&[5]).strides(), &[1]);
        assert!(Layout::contiguous(&[]).strides().is_empty());
        assert_eq!(Layout::contiguous(&[]).elem_count(), 1);
    }

    #[test]
    fn test_transpose_and_permute() {
        let layout = Layout::contiguous(&[2, 3, 4]);

        let t = layout.transpose(-1, 0).unwrap();
        assert_eq!(t.shape(), &[4, 3, 2]);
        assert_eq!(t.strides(), &[1, 4, 12]);
        assert!(!t.is_contiguous());

        let p = layout.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
        assert!(layout.permute(&[0, 0, 1]).is_none());
        assert!(layout.permute(&[1, 0]).is_none());
    }

    #[test]
    fn test_narrow_moves_offset() {
        let narrowed = Layout::contiguous(&[4, 5]).narrow(1, 2, 3).unwrap();
        assert_eq!(narrowed.shape(), &[4, 3]);
        assert_eq!(narrowed.offset(), 2);
        assert!(!narrowed.is_contiguous());
        assert!(Layout::contiguous(&[4, 5]).narrow(1, 4, 2).is_none());
    }

    #[test]
    fn test_broadcast_to() {
        let b = Layout::contiguous(&[3, 1]).broadcast_to(&[2, 3, 4]).unwrap();
        assert_eq!(b.shape(), &[2, 3, 4]);
        assert_eq!(b.strides(), &[0, 1, 0]);
        assert!(Layout::contiguous(&[3, 1]).broadcast_to(&[2, 4]).is_none());
        assert!(Layout::contiguous(&[3, 1]).broadcast_to(&[3]).is_none());
    }

    #[test]
    fn test_storage_span() {
        let layout = Layout::contiguous(&[2, 3]);
        assert_eq!(layout.storage_span(), Some((0, 5)));
        assert_eq!(layout.narrow(1, 1, 2).unwrap().storage_span(), Some((1, 5)));
        assert_eq!(Layout::contiguous(&[0, 3]).storage_span(), None);

        let reversed = Layout::new([3].into_iter().collect(), [-1].into_iter().collect(), 2);
        assert_eq!(reversed.storage_span(), Some((0, 2)));
    }
}
