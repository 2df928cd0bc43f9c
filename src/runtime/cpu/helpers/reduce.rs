//! Reduction operation helpers for CPU tensors
//!
//! Each `*_impl` validates its arguments, picks the element types from the
//! tensors' dtypes and runs the matching policy through the strided kernel.
//! Checks run in a fixed order so a call with several problems always
//! reports the same one: axes, operation-specific preconditions, output
//! shape, devices, aliasing, dtypes.

use super::super::kernels::reduce::{
    AMaxPolicy, AMinPolicy, ArgMaxPolicy, ArgMinPolicy, MeanPolicy, SumPolicy,
    check_output_aliasing, launch,
};
use super::super::{CpuClient, CpuRuntime};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::{
    AccumulationPrecision, ReduceKind, is_valid_reduction_shape, normalize_axes,
    reduce_output_shape, validate_axes,
};
use crate::runtime::Device;
use crate::tensor::Tensor;
use crate::{dispatch_dtype, dispatch_dtype_pair};
use tracing::debug;

/// Argument checks shared by every reduction, up to (not including) dtypes
fn check_reduction(
    kind: ReduceKind,
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    let shape = a.shape();
    validate_axes(shape.len(), axes)?;

    if kind.is_positional() {
        if let Some(&axis) = axes.iter().find(|&&axis| shape[axis] == 0) {
            return Err(Error::EmptyReduction {
                op: kind.name(),
                axis,
                shape: shape.to_vec(),
            });
        }
    }

    let keepdims = kind.allows_keepdims();
    if !is_valid_reduction_shape(shape, axes, out.shape(), keepdims) {
        return Err(Error::invalid_reduction_shape(
            shape,
            axes,
            out.shape(),
            keepdims,
        ));
    }

    client.device.check_compatible(a.device())?;
    a.device().check_compatible(out.device())?;
    check_output_aliasing(a, out)
}

fn check_same_dtype(a: &Tensor<CpuRuntime>, out: &Tensor<CpuRuntime>) -> Result<()> {
    if a.dtype() != out.dtype() {
        return Err(Error::DTypeMismatch {
            lhs: a.dtype(),
            rhs: out.dtype(),
        });
    }
    Ok(())
}

fn check_index_dtype(out: &Tensor<CpuRuntime>) -> Result<()> {
    if out.dtype() != DType::I64 {
        return Err(Error::DTypeMismatch {
            lhs: DType::I64,
            rhs: out.dtype(),
        });
    }
    Ok(())
}

fn log_call(kind: ReduceKind, a: &Tensor<CpuRuntime>, axes: &[usize], out: &Tensor<CpuRuntime>) {
    debug!(
        "{kind}: {:?} {} over axes {:?} into {:?} {}",
        a.shape(),
        a.dtype(),
        axes,
        out.shape(),
        out.dtype()
    );
}

/// Index of the first maximum over `axes`, written to an I64 `out`
pub fn argmax_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    log_call(ReduceKind::ArgMax, a, axes, out);
    check_reduction(ReduceKind::ArgMax, client, a, axes, out)?;
    check_index_dtype(out)?;

    dispatch_dtype!(a.dtype(), T => {
        launch(ArgMaxPolicy::<T>::new(), a, axes, out);
        Ok(())
    }, "argmax")
}

/// Index of the first minimum over `axes`, written to an I64 `out`
pub fn argmin_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    log_call(ReduceKind::ArgMin, a, axes, out);
    check_reduction(ReduceKind::ArgMin, client, a, axes, out)?;
    check_index_dtype(out)?;

    dispatch_dtype!(a.dtype(), T => {
        launch(ArgMinPolicy::<T>::new(), a, axes, out);
        Ok(())
    }, "argmin")
}

/// Sum over `axes` into `out`, whose dtype may differ from the input's
///
/// `precision` picks the accumulator for floating outputs; integer outputs
/// always accumulate in their own type.
pub fn sum_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
    precision: AccumulationPrecision,
) -> Result<()> {
    log_call(ReduceKind::Sum, a, axes, out);
    check_reduction(ReduceKind::Sum, client, a, axes, out)?;

    let float_out = out.dtype().is_float();
    dispatch_dtype_pair!(a.dtype(), out.dtype(), (In, Out) => {
        match precision {
            AccumulationPrecision::FP32 if float_out => {
                launch(SumPolicy::<In, Out, f32>::new(), a, axes, out)
            }
            AccumulationPrecision::FP64 if float_out => {
                launch(SumPolicy::<In, Out, f64>::new(), a, axes, out)
            }
            _ => launch(
                SumPolicy::<In, Out, <Out as Element>::SumAcc>::new(),
                a,
                axes,
                out,
            ),
        }
        Ok(())
    }, "sum")
}

/// Maximum over `axes`; NaN propagates
pub fn amax_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    log_call(ReduceKind::AMax, a, axes, out);
    check_reduction(ReduceKind::AMax, client, a, axes, out)?;
    check_same_dtype(a, out)?;

    dispatch_dtype!(a.dtype(), T => {
        launch(AMaxPolicy::<T>::new(), a, axes, out);
        Ok(())
    }, "amax")
}

/// Minimum over `axes`; NaN propagates
pub fn amin_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    log_call(ReduceKind::AMin, a, axes, out);
    check_reduction(ReduceKind::AMin, client, a, axes, out)?;
    check_same_dtype(a, out)?;

    dispatch_dtype!(a.dtype(), T => {
        launch(AMinPolicy::<T>::new(), a, axes, out);
        Ok(())
    }, "amin")
}

/// Mean over `axes` for floating dtypes
pub fn mean_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    log_call(ReduceKind::Mean, a, axes, out);
    check_reduction(ReduceKind::Mean, client, a, axes, out)?;
    check_same_dtype(a, out)?;
    if !a.dtype().is_float() {
        return Err(Error::unsupported_dtype(a.dtype(), "mean"));
    }

    let count: usize = axes.iter().map(|&axis| a.shape()[axis]).product();
    dispatch_dtype!(a.dtype(), T => {
        launch(
            MeanPolicy::<T, <T as Element>::SumAcc>::new(count),
            a,
            axes,
            out,
        );
        Ok(())
    }, "mean")
}

/// Normalize `axes` and allocate the output of reducing `a` over them
///
/// Returns the normalized axes along with the zero-initialised output.
pub fn alloc_reduce_output(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[isize],
    keepdim: bool,
    dtype: DType,
) -> Result<(Vec<usize>, Tensor<CpuRuntime>)> {
    let axes = normalize_axes(a.ndim(), axes)?;
    let out_shape = reduce_output_shape(a.shape(), &axes, keepdim);
    let out = Tensor::<CpuRuntime>::try_zeros(&out_shape, dtype, &client.device)?;
    Ok((axes, out))
}

/// Run a reduction by kind with the default accumulation
pub fn reduce_by_kind(
    kind: ReduceKind,
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    axes: &[usize],
    out: &Tensor<CpuRuntime>,
) -> Result<()> {
    match kind {
        ReduceKind::ArgMax => argmax_impl(client, a, axes, out),
        ReduceKind::ArgMin => argmin_impl(client, a, axes, out),
        ReduceKind::Sum => sum_impl(client, a, axes, out, AccumulationPrecision::Native),
        ReduceKind::AMax => amax_impl(client, a, axes, out),
        ReduceKind::AMin => amin_impl(client, a, axes, out),
        ReduceKind::Mean => mean_impl(client, a, axes, out),
    }
}
