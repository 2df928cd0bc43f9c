//! Strided reduction kernel and the per-operation policies it runs
//!
//! A reduction is described by a [`ReducePolicy`]: an identity accumulator,
//! a map from input element (plus its position) into the accumulator domain,
//! an in-place combine step and a map from the final accumulator to the
//! output element. [`reduce_kernel`] walks any strided input once and folds
//! every group of reduced elements with the policy.

use crate::dtype::{CastInto, DType, Element};
use crate::error::{Error, Result};
use crate::ops::{is_valid_reduction_shape, validate_axes};
use crate::runtime::cpu::CpuRuntime;
use crate::tensor::Tensor;
use smallvec::{SmallVec, smallvec};
use std::marker::PhantomData;
use tracing::trace;

/// Accumulation rules for one reduction
///
/// Policies are small `Copy` values passed to the kernel by value, so every
/// operation is monomorphised into its own loop.
pub trait ReducePolicy: Copy {
    /// Input element type
    type In: Element;
    /// Output element type
    type Out: Element;
    /// Running accumulator
    type Acc: Copy;

    /// Whether the output is a position within the group
    ///
    /// Positional reductions have no value for an empty group and never
    /// write a keep-dims output.
    const POSITIONAL: bool = false;

    /// Accumulator for a group with no elements
    fn identity(&self) -> Self::Acc;

    /// Lift one input element into the accumulator domain
    ///
    /// `index` is the element's row-major position within its group.
    fn map_in(&self, value: Self::In, index: i64) -> Self::Acc;

    /// Fold `next` into the running accumulator
    fn combine(&self, next: Self::Acc, acc: &mut Self::Acc);

    /// Produce the output element from the final accumulator
    fn map_out(&self, acc: Self::Acc) -> Self::Out;
}

#[derive(Clone, Copy)]
struct Step {
    len: usize,
    in_stride: isize,
    out_stride: isize,
}

/// Odometer increment over `steps`, last axis fastest, tracking both offsets
#[inline]
fn advance(steps: &[Step], coord: &mut [usize], in_off: &mut isize, out_off: &mut isize) {
    for (axis, step) in steps.iter().enumerate().rev() {
        coord[axis] += 1;
        *in_off += step.in_stride;
        *out_off += step.out_stride;
        if coord[axis] < step.len {
            return;
        }
        coord[axis] = 0;
        *in_off -= step.in_stride * step.len as isize;
        *out_off -= step.out_stride * step.len as isize;
    }
}

/// Reduce `input` over `axes` into `out` with `policy`
///
/// Output elements are produced in row-major order of the kept axes. Within a
/// group, elements are visited in row-major order of the reduced axes and
/// `map_in` receives that running position, so the visit order is strictly
/// ascending in position whatever the input strides are. A group with no
/// elements yields `map_out(identity())`.
///
/// `out_strides` has either one entry per kept axis, or one per input axis
/// (keep-dims output, where entries for reduced axes are ignored).
///
/// # Safety
/// - `axes` must be distinct and each `< in_shape.len()`
/// - `in_strides` must have `in_shape.len()` entries and `out_strides` must have
///   `in_shape.len()` or `in_shape.len() - axes.len()` entries
/// - every element reachable from `input` through `in_shape`/`in_strides` must be readable
/// - every element reachable from `out` through the kept extents and `out_strides`
///   must be writable, and must not overlap the input
pub unsafe fn reduce_kernel<P: ReducePolicy>(
    policy: P,
    input: *const P::In,
    in_shape: &[usize],
    in_strides: &[isize],
    axes: &[usize],
    out: *mut P::Out,
    out_strides: &[isize],
) {
    let ndim = in_shape.len();
    debug_assert_eq!(in_strides.len(), ndim);
    let mut reduced: SmallVec<[bool; 4]> = smallvec![false; ndim];
    for &axis in axes {
        debug_assert!(axis < ndim && !reduced[axis]);
        reduced[axis] = true;
    }
    let keepdims = out_strides.len() == ndim;
    debug_assert!(keepdims || out_strides.len() == ndim - axes.len());

    let mut kept: SmallVec<[Step; 4]> = SmallVec::new();
    let mut red: SmallVec<[Step; 4]> = SmallVec::new();
    for axis in 0..ndim {
        if reduced[axis] {
            red.push(Step {
                len: in_shape[axis],
                in_stride: in_strides[axis],
                out_stride: 0,
            });
        } else {
            let out_axis = if keepdims { axis } else { kept.len() };
            kept.push(Step {
                len: in_shape[axis],
                in_stride: in_strides[axis],
                out_stride: out_strides[out_axis],
            });
        }
    }

    let groups: usize = kept.iter().map(|s| s.len).product();
    let group_len: usize = red.iter().map(|s| s.len).product();
    trace!("reduce kernel: {groups} groups of {group_len} elements");

    if groups == 0 {
        return;
    }

    let mut kept_coord: SmallVec<[usize; 4]> = smallvec![0; kept.len()];
    let mut red_coord: SmallVec<[usize; 4]> = smallvec![0; red.len()];
    let mut in_base: isize = 0;
    let mut out_off: isize = 0;

    for _ in 0..groups {
        let mut acc = policy.identity();
        let mut in_off = in_base;
        let mut unused: isize = 0;
        for index in 0..group_len {
            let value = *input.offset(in_off);
            policy.combine(policy.map_in(value, index as i64), &mut acc);
            advance(&red, &mut red_coord, &mut in_off, &mut unused);
        }

        *out.offset(out_off) = policy.map_out(acc);
        advance(&kept, &mut kept_coord, &mut in_base, &mut out_off);
    }
}

/// Run `policy` over CPU tensors
///
/// Checks the preconditions of [`reduce_kernel`] and reports violations as
/// errors: tensor dtypes must match the policy, `axes` must be valid, `out`
/// must have the reduced shape and must not share storage with `input`.
/// Positional policies ([`ReducePolicy::POSITIONAL`]) additionally need
/// non-empty reduced axes and an output without the reduced axes; the
/// others accept a keep-dims output.
pub fn reduce_with_policy<P: ReducePolicy>(
    policy: P,
    input: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    check_dtype(input.dtype(), P::In::DTYPE)?;
    check_dtype(out.dtype(), P::Out::DTYPE)?;
    validate_axes(input.ndim(), axes)?;
    if P::POSITIONAL {
        if let Some(&axis) = axes.iter().find(|&&axis| input.shape()[axis] == 0) {
            return Err(Error::EmptyReduction {
                op: "positional reduction",
                axis,
                shape: input.shape().to_vec(),
            });
        }
    }
    let keepdims = !P::POSITIONAL;
    if !is_valid_reduction_shape(input.shape(), axes, out.shape(), keepdims) {
        return Err(Error::invalid_reduction_shape(
            input.shape(),
            axes,
            out.shape(),
            keepdims,
        ));
    }
    check_output_aliasing(input, out)?;

    launch(policy, input, axes, out);
    Ok(())
}

/// Run `policy` over tensors the caller has already checked
///
/// Callers must have established everything [`reduce_with_policy`] checks.
pub(crate) fn launch<P: ReducePolicy>(
    policy: P,
    input: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) {
    debug_assert_eq!(input.dtype(), P::In::DTYPE);
    debug_assert_eq!(out.dtype(), P::Out::DTYPE);

    let in_ptr = input.storage().handle() as *const P::In;
    let out_ptr = out.storage().handle() as *mut P::Out;

    // Tensor layouts are bounds-checked against their storage on construction.
    unsafe {
        reduce_kernel(
            policy,
            in_ptr.wrapping_add(input.offset()),
            input.shape(),
            input.strides(),
            axes,
            out_ptr.wrapping_add(out.offset()),
            out.strides(),
        );
    }
}

/// Reject outputs that share the input's storage or write one element twice
pub(crate) fn check_output_aliasing(
    input: &Tensor<CpuRuntime>,
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    if input.storage().same_buffer(out.storage()) {
        return Err(Error::InvalidArgument {
            arg: "out",
            reason: "output shares storage with the input".to_string(),
        });
    }
    let broadcast = out
        .shape()
        .iter()
        .zip(out.strides())
        .any(|(&len, &stride)| len > 1 && stride == 0);
    if broadcast {
        return Err(Error::InvalidArgument {
            arg: "out",
            reason: format!("output {:?} is a broadcast view", out.layout()),
        });
    }
    Ok(())
}

fn check_dtype(got: DType, expected: DType) -> Result<()> {
    if got != expected {
        return Err(Error::DTypeMismatch {
            lhs: expected,
            rhs: got,
        });
    }
    Ok(())
}

// ============================================================================
// Policies
// ============================================================================

/// Running extreme value and its position
///
/// `index == -1` marks a group where nothing has been seen yet.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArgExtremum<T> {
    /// Extreme value seen so far
    pub value: T,
    /// Position of `value` within the group
    pub index: i64,
}

/// Position of the first maximum
#[derive(Copy, Clone, Debug, Default)]
pub struct ArgMaxPolicy<T>(PhantomData<T>);

impl<T: Element> ArgMaxPolicy<T> {
    /// Create the policy
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Element> ReducePolicy for ArgMaxPolicy<T> {
    type In = T;
    type Out = i64;
    type Acc = ArgExtremum<T>;

    const POSITIONAL: bool = true;

    #[inline]
    fn identity(&self) -> Self::Acc {
        ArgExtremum {
            value: T::zero(),
            index: -1,
        }
    }

    #[inline]
    fn map_in(&self, value: T, index: i64) -> Self::Acc {
        ArgExtremum { value, index }
    }

    #[inline]
    fn combine(&self, next: Self::Acc, acc: &mut Self::Acc) {
        // Strict comparison: ties keep the earlier position.
        if acc.index < 0 || acc.value < next.value {
            *acc = next;
        }
    }

    #[inline]
    fn map_out(&self, acc: Self::Acc) -> i64 {
        acc.index
    }
}

/// Position of the first minimum
#[derive(Copy, Clone, Debug, Default)]
pub struct ArgMinPolicy<T>(PhantomData<T>);

impl<T: Element> ArgMinPolicy<T> {
    /// Create the policy
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Element> ReducePolicy for ArgMinPolicy<T> {
    type In = T;
    type Out = i64;
    type Acc = ArgExtremum<T>;

    const POSITIONAL: bool = true;

    #[inline]
    fn identity(&self) -> Self::Acc {
        ArgExtremum {
            value: T::zero(),
            index: -1,
        }
    }

    #[inline]
    fn map_in(&self, value: T, index: i64) -> Self::Acc {
        ArgExtremum { value, index }
    }

    #[inline]
    fn combine(&self, next: Self::Acc, acc: &mut Self::Acc) {
        if acc.index < 0 || acc.value > next.value {
            *acc = next;
        }
    }

    #[inline]
    fn map_out(&self, acc: Self::Acc) -> i64 {
        acc.index
    }
}

/// Sum of `In` elements accumulated in `Acc`, written as `Out`
#[derive(Copy, Clone, Debug, Default)]
pub struct SumPolicy<In, Out, Acc>(PhantomData<(In, Out, Acc)>);

impl<In, Out, Acc> SumPolicy<In, Out, Acc>
where
    In: Element + CastInto<Acc>,
    Out: Element,
    Acc: Element + CastInto<Out>,
{
    /// Create the policy
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<In, Out, Acc> ReducePolicy for SumPolicy<In, Out, Acc>
where
    In: Element + CastInto<Acc>,
    Out: Element,
    Acc: Element + CastInto<Out>,
{
    type In = In;
    type Out = Out;
    type Acc = Acc;

    #[inline]
    fn identity(&self) -> Acc {
        Acc::zero()
    }

    #[inline]
    fn map_in(&self, value: In, _index: i64) -> Acc {
        value.cast_into()
    }

    #[inline]
    fn combine(&self, next: Acc, acc: &mut Acc) {
        *acc = acc.accumulate(next);
    }

    #[inline]
    fn map_out(&self, acc: Acc) -> Out {
        acc.cast_into()
    }
}

/// Maximum value; a NaN anywhere in the group wins
#[derive(Copy, Clone, Debug, Default)]
pub struct AMaxPolicy<T>(PhantomData<T>);

impl<T: Element> AMaxPolicy<T> {
    /// Create the policy
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Element> ReducePolicy for AMaxPolicy<T> {
    type In = T;
    type Out = T;
    type Acc = T;

    #[inline]
    fn identity(&self) -> T {
        T::lowest_or_neg_inf()
    }

    #[inline]
    fn map_in(&self, value: T, _index: i64) -> T {
        value
    }

    #[inline]
    fn combine(&self, next: T, acc: &mut T) {
        // Once acc is NaN, `acc < next` is false for every later element.
        if next.is_nan() || *acc < next {
            *acc = next;
        }
    }

    #[inline]
    fn map_out(&self, acc: T) -> T {
        acc
    }
}

/// Minimum value; a NaN anywhere in the group wins
#[derive(Copy, Clone, Debug, Default)]
pub struct AMinPolicy<T>(PhantomData<T>);

impl<T: Element> AMinPolicy<T> {
    /// Create the policy
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Element> ReducePolicy for AMinPolicy<T> {
    type In = T;
    type Out = T;
    type Acc = T;

    #[inline]
    fn identity(&self) -> T {
        T::highest_or_inf()
    }

    #[inline]
    fn map_in(&self, value: T, _index: i64) -> T {
        value
    }

    #[inline]
    fn combine(&self, next: T, acc: &mut T) {
        if next.is_nan() || *acc > next {
            *acc = next;
        }
    }

    #[inline]
    fn map_out(&self, acc: T) -> T {
        acc
    }
}

/// Arithmetic mean of `T` accumulated in `Acc`
///
/// `count` is the group length; an empty group divides zero by zero and
/// yields NaN.
#[derive(Copy, Clone, Debug)]
pub struct MeanPolicy<T, Acc> {
    count: usize,
    _marker: PhantomData<(T, Acc)>,
}

impl<T, Acc> MeanPolicy<T, Acc>
where
    T: Element + CastInto<Acc>,
    Acc: Element + CastInto<T>,
{
    /// Create the policy for groups of `count` elements
    pub fn new(count: usize) -> Self {
        Self {
            count,
            _marker: PhantomData,
        }
    }
}

impl<T, Acc> ReducePolicy for MeanPolicy<T, Acc>
where
    T: Element + CastInto<Acc>,
    Acc: Element + CastInto<T>,
{
    type In = T;
    type Out = T;
    type Acc = Acc;

    #[inline]
    fn identity(&self) -> Acc {
        Acc::zero()
    }

    #[inline]
    fn map_in(&self, value: T, _index: i64) -> Acc {
        value.cast_into()
    }

    #[inline]
    fn combine(&self, next: Acc, acc: &mut Acc) {
        *acc = acc.accumulate(next);
    }

    #[inline]
    fn map_out(&self, acc: Acc) -> T {
        (acc / Acc::from_f64(self.count as f64)).cast_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<P: ReducePolicy>(
        policy: P,
        data: &[P::In],
        shape: &[usize],
        strides: &[isize],
        axes: &[usize],
        out_len: usize,
        out_strides: &[isize],
    ) -> Vec<P::Out> {
        let mut out = vec![P::Out::zero(); out_len];
        unsafe {
            reduce_kernel(
                policy,
                data.as_ptr(),
                shape,
                strides,
                axes,
                out.as_mut_ptr(),
                out_strides,
            );
        }
        out
    }

    #[test]
    fn test_argmax_rows() {
        let data = [1.0f32, 3.0, 2.0, 4.0, 0.0, 6.0];
        let out = run(ArgMaxPolicy::<f32>::new(), &data, &[2, 3], &[3, 1], &[1], 2, &[1]);
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_argmax_first_occurrence() {
        let data = [5i32, 5, 3, 5];
        let out = run(ArgMaxPolicy::<i32>::new(), &data, &[4], &[1], &[0], 1, &[]);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn test_argmin_negative_values() {
        let data = [-1i64, -5, -2];
        let out = run(ArgMinPolicy::<i64>::new(), &data, &[3], &[1], &[0], 1, &[]);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn test_transposed_visit_order() {
        // Storage [[1, 7], [7, 0], [7, 1]] read as its 2x3 transpose:
        // row 0 = [1, 7, 7], row 1 = [7, 0, 1].
        let data = [1u8, 7, 7, 0, 7, 1];
        let out = run(ArgMaxPolicy::<u8>::new(), &data, &[2, 3], &[1, 2], &[1], 2, &[1]);
        assert_eq!(out, vec![1, 0]);
    }

    #[test]
    fn test_multi_axis_position_is_row_major_in_group() {
        // shape [2, 2, 2], reduce axes {0, 2}; kept axis 1.
        let data = [0i32, 1, 2, 3, 4, 9, 6, 7];
        let out = run(
            ArgMaxPolicy::<i32>::new(),
            &data,
            &[2, 2, 2],
            &[4, 2, 1],
            &[2, 0],
            2,
            &[1],
        );
        // group 0 = [0, 1, 4, 9] (max at 3), group 1 = [2, 3, 6, 7] (max at 3)
        assert_eq!(out, vec![3, 3]);
    }

    #[test]
    fn test_sum_keepdims_output_strides() {
        let data = [1i32, 2, 3, 4, 5, 6];
        let policy = SumPolicy::<i32, i32, i32>::new();
        let out = run(policy, &data, &[2, 3], &[3, 1], &[0], 3, &[3, 1]);
        assert_eq!(out, vec![5, 7, 9]);
    }

    #[test]
    fn test_broadcast_input() {
        let data = [2.0f64, 3.0];
        // [2] broadcast to [4, 2] through a zero stride
        let policy = SumPolicy::<f64, f64, f64>::new();
        let out = run(policy, &data, &[4, 2], &[0, 1], &[0], 2, &[1]);
        assert_eq!(out, vec![8.0, 12.0]);
    }

    #[test]
    fn test_empty_group_writes_identity() {
        let data: [f32; 0] = [];
        let sums = run(
            SumPolicy::<f32, f32, f32>::new(),
            &data,
            &[0, 3],
            &[3, 1],
            &[0],
            3,
            &[1],
        );
        assert_eq!(sums, vec![0.0; 3]);

        let maxes = run(AMaxPolicy::<f32>::new(), &data, &[0, 3], &[3, 1], &[0], 3, &[1]);
        assert!(maxes.iter().all(|v| *v == f32::NEG_INFINITY));

        let means = run(MeanPolicy::<f32, f32>::new(0), &data, &[0], &[1], &[0], 1, &[]);
        assert!(means[0].is_nan());
    }

    #[test]
    fn test_empty_kept_extent_writes_nothing() {
        let data: [f32; 0] = [];
        let out = run(AMaxPolicy::<f32>::new(), &data, &[3, 0], &[1, 1], &[0], 0, &[1]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_amax_nan_dominates() {
        let data = [1.0f32, f32::NAN, 2.0];
        let out = run(AMaxPolicy::<f32>::new(), &data, &[1, 3], &[3, 1], &[1], 1, &[1]);
        assert!(out[0].is_nan());

        let out = run(AMinPolicy::<f32>::new(), &data, &[3], &[1], &[0], 1, &[]);
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_rank0_no_axes() {
        let data = [42u16];
        let out = run(AMaxPolicy::<u16>::new(), &data, &[], &[], &[], 1, &[]);
        assert_eq!(out, vec![42]);
    }

    #[test]
    fn test_integer_sum_wraps() {
        let data = [i8::MAX, 1];
        let out = run(SumPolicy::<i8, i8, i8>::new(), &data, &[2], &[1], &[0], 1, &[]);
        assert_eq!(out, vec![i8::MIN]);
    }

    #[test]
    fn test_mean_in_f64() {
        let data = [1.0f32, 2.0, 4.0, 5.0];
        let out = run(MeanPolicy::<f32, f64>::new(2), &data, &[2, 2], &[2, 1], &[1], 2, &[1]);
        assert_eq!(out, vec![1.5, 4.5]);
    }

    #[test]
    fn test_checked_entry_keepdims_only_for_values() {
        use crate::runtime::cpu::CpuDevice;

        let device = CpuDevice::new();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 3.0, 2.0, 4.0, 0.0, 6.0], &[2, 3], &device);

        let kept = Tensor::<CpuRuntime>::zeros(&[2, 1], DType::F32, &device);
        reduce_with_policy(AMaxPolicy::<f32>::new(), &a, &[1], &kept).unwrap();
        assert_eq!(kept.to_vec::<f32>(), vec![3.0, 6.0]);

        let kept_idx = Tensor::<CpuRuntime>::zeros(&[2, 1], DType::I64, &device);
        let err = reduce_with_policy(ArgMaxPolicy::<f32>::new(), &a, &[1], &kept_idx).unwrap_err();
        assert!(matches!(err, Error::InvalidReductionShape { keepdims: false, .. }));

        let idx = Tensor::<CpuRuntime>::zeros(&[2], DType::I64, &device);
        reduce_with_policy(ArgMaxPolicy::<f32>::new(), &a, &[1], &idx).unwrap();
        assert_eq!(idx.to_vec::<i64>(), vec![1, 2]);
    }

    #[test]
    fn test_checked_entry_rejects_empty_positional_axis() {
        use crate::runtime::cpu::CpuDevice;

        let device = CpuDevice::new();
        let a = Tensor::<CpuRuntime>::zeros(&[0, 3], DType::I32, &device);
        let out = Tensor::<CpuRuntime>::zeros(&[3], DType::I64, &device);
        let err = reduce_with_policy(ArgMinPolicy::<i32>::new(), &a, &[0], &out).unwrap_err();
        assert!(matches!(err, Error::EmptyReduction { axis: 0, .. }));

        let sums = Tensor::<CpuRuntime>::zeros(&[3], DType::I32, &device);
        reduce_with_policy(SumPolicy::<i32, i32, i32>::new(), &a, &[0], &sums).unwrap();
        assert_eq!(sums.to_vec::<i32>(), vec![0, 0, 0]);
    }

    #[test]
    fn test_checked_entry_rejects_wrong_dtype() {
        use crate::runtime::cpu::CpuDevice;

        let device = CpuDevice::new();
        let a = Tensor::<CpuRuntime>::zeros(&[3], DType::F64, &device);
        let out = Tensor::<CpuRuntime>::zeros(&[], DType::F64, &device);
        let err = reduce_with_policy(AMaxPolicy::<f32>::new(), &a, &[0], &out).unwrap_err();
        assert!(matches!(
            err,
            Error::DTypeMismatch {
                lhs: DType::F32,
                rhs: DType::F64
            }
        ));
    }
}
