//! Reduction operations trait.

use crate::dtype::DType;
use crate::error::Result;
use crate::ops::reduce::AccumulationPrecision;
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// Reduction operations
///
/// Every reduction comes in two forms:
///
/// - `*_into(a, axes, out)` writes into a caller-provided output. `axes` are
///   non-negative, distinct and in range; `out` must have the shape of `a` with
///   the reduced axes removed (or, for value reductions, kept with size 1).
/// - The allocating form takes possibly negative `axes` (`-1` is the last
///   axis), allocates the output on the client's device and returns it.
///
/// Axes are a set: their order never changes the result. An empty axis list
/// reduces nothing, so every output element is the fold of a single input
/// element.
///
/// # Example
///
/// ```
/// # use axfold::prelude::*;
/// # let device = CpuDevice::new();
/// # let client = CpuRuntime::default_client(&device);
/// let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 3.0, 2.0, 4.0, 0.0, 6.0], &[2, 3], &device);
/// let idx = client.argmax(&a, &[1])?;
/// assert_eq!(idx.to_vec::<i64>(), vec![1, 2]);
/// # Ok::<(), axfold::error::Error>(())
/// ```
pub trait ReduceOps<R: Runtime> {
    /// Index of the first maximum over `axes`, written to an I64 `out`
    ///
    /// The index is the row-major position within the reduced axes. Every
    /// reduced axis must be non-empty, and `out` may not keep reduced axes.
    /// NaN compares false, so it is only chosen when it comes first.
    fn argmax_into(&self, a: &Tensor<R>, axes: &[usize], out: &Tensor<R>) -> Result<()>;

    /// Index of the first minimum over `axes`, written to an I64 `out`
    fn argmin_into(&self, a: &Tensor<R>, axes: &[usize], out: &Tensor<R>) -> Result<()>;

    /// Sum over `axes` into `out`
    ///
    /// `out` may have any numeric dtype; inputs are converted with `as`
    /// semantics. F16/BF16 outputs accumulate in f32. Integer sums wrap on
    /// overflow. An empty group sums to zero.
    fn sum_into(&self, a: &Tensor<R>, axes: &[usize], out: &Tensor<R>) -> Result<()>;

    /// Maximum over `axes` into `out` (same dtype as `a`)
    ///
    /// Any NaN in a group makes the result NaN. An empty group yields -inf
    /// for floats and the minimum value for integers.
    fn amax_into(&self, a: &Tensor<R>, axes: &[usize], out: &Tensor<R>) -> Result<()>;

    /// Minimum over `axes` into `out` (same dtype as `a`)
    ///
    /// Any NaN in a group makes the result NaN. An empty group yields +inf
    /// for floats and the maximum value for integers.
    fn amin_into(&self, a: &Tensor<R>, axes: &[usize], out: &Tensor<R>) -> Result<()>;

    /// Mean over `axes` into `out` (floating dtypes, same dtype as `a`)
    ///
    /// An empty group yields NaN.
    fn mean_into(&self, a: &Tensor<R>, axes: &[usize], out: &Tensor<R>) -> Result<()>;

    /// Index of the first maximum along `axes`
    fn argmax(&self, a: &Tensor<R>, axes: &[isize]) -> Result<Tensor<R>>;

    /// Index of the first minimum along `axes`
    fn argmin(&self, a: &Tensor<R>, axes: &[isize]) -> Result<Tensor<R>>;

    /// Sum along `axes`, in the input dtype
    fn sum(&self, a: &Tensor<R>, axes: &[isize], keepdim: bool) -> Result<Tensor<R>>;

    /// Sum along `axes` into a tensor of `dtype`
    ///
    /// ```
    /// # use axfold::prelude::*;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[100u8, 200, 250], &[3], &device);
    /// let total = client.sum_as(&a, &[0], false, DType::I64)?;
    /// assert_eq!(total.item::<i64>()?, 550);
    /// # Ok::<(), axfold::error::Error>(())
    /// ```
    fn sum_as(
        &self,
        a: &Tensor<R>,
        axes: &[isize],
        keepdim: bool,
        dtype: DType,
    ) -> Result<Tensor<R>>;

    /// Sum along `axes` with explicit accumulation precision.
    ///
    /// See [`AccumulationPrecision`] for details on precision options.
    fn sum_with_precision(
        &self,
        a: &Tensor<R>,
        axes: &[isize],
        keepdim: bool,
        precision: AccumulationPrecision,
    ) -> Result<Tensor<R>>;

    /// Maximum along `axes`
    fn amax(&self, a: &Tensor<R>, axes: &[isize], keepdim: bool) -> Result<Tensor<R>>;

    /// Minimum along `axes`
    fn amin(&self, a: &Tensor<R>, axes: &[isize], keepdim: bool) -> Result<Tensor<R>>;

    /// Mean along `axes`
    fn mean(&self, a: &Tensor<R>, axes: &[isize], keepdim: bool) -> Result<Tensor<R>>;
}
