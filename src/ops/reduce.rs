//! Reduction operation helpers
//!
//! This module contains the reduction kinds, the accumulation precision knob
//! and the axis/shape helpers shared by every reduction. The operations
//! themselves are defined on the [`ReduceOps`](crate::ops::ReduceOps) trait.

use crate::error::{Error, Result};
use std::fmt;

/// Reduction operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReduceKind {
    /// Index of the first maximum
    ArgMax,
    /// Index of the first minimum
    ArgMin,
    /// Sum of elements
    Sum,
    /// Maximum element, NaN-propagating
    AMax,
    /// Minimum element, NaN-propagating
    AMin,
    /// Arithmetic mean (floating dtypes only)
    Mean,
}

impl ReduceKind {
    /// Every kind, in registration order
    pub const ALL: [ReduceKind; 6] = [
        ReduceKind::ArgMax,
        ReduceKind::ArgMin,
        ReduceKind::Sum,
        ReduceKind::AMax,
        ReduceKind::AMin,
        ReduceKind::Mean,
    ];

    /// Registry name of this kind
    pub const fn name(self) -> &'static str {
        match self {
            ReduceKind::ArgMax => "argmax",
            ReduceKind::ArgMin => "argmin",
            ReduceKind::Sum => "sum",
            ReduceKind::AMax => "amax",
            ReduceKind::AMin => "amin",
            ReduceKind::Mean => "mean",
        }
    }

    /// Look a kind up by its registry name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Whether the result is a position (I64 index) rather than a value
    ///
    /// Positional reductions have no value for an empty group, so they
    /// reject zero-length reduced axes and keep-dims outputs.
    pub const fn is_positional(self) -> bool {
        matches!(self, ReduceKind::ArgMax | ReduceKind::ArgMin)
    }

    /// Whether the output may keep reduced axes with size 1
    pub const fn allows_keepdims(self) -> bool {
        !self.is_positional()
    }
}

impl fmt::Display for ReduceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulator precision for sums
///
/// Summing many low-precision values loses digits quickly, so the
/// accumulator may be wider than the output. The result is always cast back
/// to the output dtype once per output element.
///
/// Only floating outputs are affected; integer outputs accumulate in their
/// own type, wrapping on overflow.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AccumulationPrecision {
    /// Per-dtype default: f32 for F16/BF16 outputs, the output type otherwise
    #[default]
    Native,
    /// Accumulate in f32
    FP32,
    /// Accumulate in f64
    FP64,
}

/// Check whether `out_shape` is a valid result of reducing `in_shape` over `axes`
///
/// True iff `out_shape` equals `in_shape` with every axis in `axes` removed, or,
/// when `allow_keepdims` is set, with every axis in `axes` replaced by 1. The
/// order of the remaining axes is preserved. Out-of-range or repeated axes make
/// the result false.
pub fn is_valid_reduction_shape(
    in_shape: &[usize],
    axes: &[usize],
    out_shape: &[usize],
    allow_keepdims: bool,
) -> bool {
    let ndim = in_shape.len();
    let mut reduced = vec![false; ndim];
    for &axis in axes {
        if axis >= ndim || reduced[axis] {
            return false;
        }
        reduced[axis] = true;
    }

    if out_shape.len() == ndim - axes.len() {
        let kept = in_shape
            .iter()
            .zip(&reduced)
            .filter(|&(_, &r)| !r)
            .map(|(&s, _)| s);
        return kept.eq(out_shape.iter().copied());
    }

    // When nothing is reduced both forms coincide and were handled above.
    if allow_keepdims && out_shape.len() == ndim {
        return in_shape
            .iter()
            .zip(&reduced)
            .zip(out_shape)
            .all(|((&s, &r), &o)| if r { o == 1 } else { o == s });
    }

    false
}

/// Compute output shape for reduction
///
/// # Arguments
/// * `input_shape` - Shape of input tensor
/// * `axes` - Axes to reduce over
/// * `keepdim` - If true, keep reduced axes as size 1
pub fn reduce_output_shape(input_shape: &[usize], axes: &[usize], keepdim: bool) -> Vec<usize> {
    if keepdim {
        input_shape
            .iter()
            .enumerate()
            .map(|(i, &s)| if axes.contains(&i) { 1 } else { s })
            .collect()
    } else {
        input_shape
            .iter()
            .enumerate()
            .filter(|(i, _)| !axes.contains(i))
            .map(|(_, &s)| s)
            .collect()
    }
}

/// Check that every axis is in `[0, ndim)` and appears once
pub fn validate_axes(ndim: usize, axes: &[usize]) -> Result<()> {
    let mut seen = vec![false; ndim];
    for &axis in axes {
        if axis >= ndim {
            return Err(Error::InvalidDimension {
                dim: axis as isize,
                ndim,
            });
        }
        if seen[axis] {
            return Err(Error::DuplicateAxis {
                axis,
                axes: axes.to_vec(),
            });
        }
        seen[axis] = true;
    }
    Ok(())
}

/// Normalize reduction axes (handle negative indices)
///
/// `-1` is the last axis. Fails on out-of-range or repeated axes; the
/// returned axes keep the caller's order.
pub fn normalize_axes(ndim: usize, axes: &[isize]) -> Result<Vec<usize>> {
    let normalized = axes
        .iter()
        .map(|&d| {
            let idx = if d < 0 { ndim as isize + d } else { d };
            if idx >= 0 && (idx as usize) < ndim {
                Ok(idx as usize)
            } else {
                Err(Error::InvalidDimension { dim: d, ndim })
            }
        })
        .collect::<Result<Vec<_>>>()?;

    validate_axes(ndim, &normalized)?;
    Ok(normalized)
}

/// All axes for full reduction
pub fn all_axes(ndim: usize) -> Vec<usize> {
    (0..ndim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reduction_shape_removed() {
        assert!(is_valid_reduction_shape(&[2, 3, 4], &[1], &[2, 4], false));
        assert!(is_valid_reduction_shape(&[2, 3, 4], &[2, 0], &[3], false));
        assert!(is_valid_reduction_shape(&[2, 3], &[0, 1], &[], false));
        assert!(!is_valid_reduction_shape(&[2, 3, 4], &[1], &[4, 2], false));
        assert!(!is_valid_reduction_shape(&[2, 3, 4], &[1], &[2, 3], false));
    }

    #[test]
    fn test_valid_reduction_shape_keepdims() {
        assert!(is_valid_reduction_shape(&[2, 3, 4], &[1], &[2, 1, 4], true));
        assert!(!is_valid_reduction_shape(&[2, 3, 4], &[1], &[2, 1, 4], false));
        assert!(!is_valid_reduction_shape(&[2, 3, 4], &[1], &[2, 2, 4], true));
        // Reducing a length-1 axis: the keep-dims and removed forms differ in rank.
        assert!(is_valid_reduction_shape(&[2, 1], &[1], &[2, 1], true));
        assert!(is_valid_reduction_shape(&[2, 1], &[1], &[2], true));
    }

    #[test]
    fn test_valid_reduction_shape_no_axes() {
        assert!(is_valid_reduction_shape(&[2, 3], &[], &[2, 3], false));
        assert!(is_valid_reduction_shape(&[], &[], &[], false));
        assert!(!is_valid_reduction_shape(&[2, 3], &[], &[3, 2], true));
    }

    #[test]
    fn test_valid_reduction_shape_bad_axes() {
        assert!(!is_valid_reduction_shape(&[2, 3], &[2], &[2, 3], true));
        assert!(!is_valid_reduction_shape(&[2, 3], &[0, 0], &[3], false));
    }

    #[test]
    fn test_reduce_output_shape() {
        assert_eq!(reduce_output_shape(&[2, 3, 4], &[1], false), vec![2, 4]);
        assert_eq!(reduce_output_shape(&[2, 3, 4], &[1], true), vec![2, 1, 4]);
        assert_eq!(reduce_output_shape(&[2, 3, 4], &[0, 2], false), vec![3]);
        assert_eq!(
            reduce_output_shape(&[2, 3, 4], &[0, 2], true),
            vec![1, 3, 1]
        );
        assert_eq!(reduce_output_shape(&[2, 3, 4], &[0, 1, 2], false), vec![]);
    }

    #[test]
    fn test_normalize_axes() {
        assert_eq!(normalize_axes(3, &[0, 1]).unwrap(), vec![0, 1]);
        assert_eq!(normalize_axes(3, &[-1]).unwrap(), vec![2]);
        assert_eq!(normalize_axes(3, &[-2, 0]).unwrap(), vec![1, 0]);

        assert!(matches!(
            normalize_axes(3, &[3]),
            Err(Error::InvalidDimension { dim: 3, ndim: 3 })
        ));
        assert!(matches!(
            normalize_axes(3, &[-4]),
            Err(Error::InvalidDimension { dim: -4, .. })
        ));
        assert!(matches!(
            normalize_axes(3, &[1, -2]),
            Err(Error::DuplicateAxis { axis: 1, .. })
        ));
    }

    #[test]
    fn test_reduce_kind_names() {
        for kind in ReduceKind::ALL {
            assert_eq!(ReduceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ReduceKind::from_name("prod"), None);
        assert!(ReduceKind::ArgMin.is_positional());
        assert!(ReduceKind::Sum.allows_keepdims());
    }
}
