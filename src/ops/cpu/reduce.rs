//! CPU implementation of reduce operations.

use crate::dtype::DType;
use crate::error::Result;
use crate::ops::{AccumulationPrecision, ReduceOps};
use crate::runtime::cpu::{
    CpuClient, CpuRuntime,
    helpers::{
        alloc_reduce_output, amax_impl, amin_impl, argmax_impl, argmin_impl, mean_impl, sum_impl,
    },
};
use crate::tensor::Tensor;

/// ReduceOps implementation for CPU runtime.
impl ReduceOps<CpuRuntime> for CpuClient {
    fn argmax_into(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        argmax_impl(self, a, axes, out)
    }

    fn argmin_into(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        argmin_impl(self, a, axes, out)
    }

    fn sum_into(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        sum_impl(self, a, axes, out, AccumulationPrecision::Native)
    }

    fn amax_into(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        amax_impl(self, a, axes, out)
    }

    fn amin_into(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        amin_impl(self, a, axes, out)
    }

    fn mean_into(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        mean_impl(self, a, axes, out)
    }

    fn argmax(&self, a: &Tensor<CpuRuntime>, axes: &[isize]) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, false, DType::I64)?;
        argmax_impl(self, a, &axes, &out)?;
        Ok(out)
    }

    fn argmin(&self, a: &Tensor<CpuRuntime>, axes: &[isize]) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, false, DType::I64)?;
        argmin_impl(self, a, &axes, &out)?;
        Ok(out)
    }

    fn sum(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[isize],
        keepdim: bool,
    ) -> Result<Tensor<CpuRuntime>> {
        self.sum_as(a, axes, keepdim, a.dtype())
    }

    fn sum_as(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[isize],
        keepdim: bool,
        dtype: DType,
    ) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, keepdim, dtype)?;
        sum_impl(self, a, &axes, &out, AccumulationPrecision::Native)?;
        Ok(out)
    }

    fn sum_with_precision(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[isize],
        keepdim: bool,
        precision: AccumulationPrecision,
    ) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, keepdim, a.dtype())?;
        sum_impl(self, a, &axes, &out, precision)?;
        Ok(out)
    }

    fn amax(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[isize],
        keepdim: bool,
    ) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, keepdim, a.dtype())?;
        amax_impl(self, a, &axes, &out)?;
        Ok(out)
    }

    fn amin(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[isize],
        keepdim: bool,
    ) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, keepdim, a.dtype())?;
        amin_impl(self, a, &axes, &out)?;
        Ok(out)
    }

    fn mean(
        &self,
        a: &Tensor<CpuRuntime>,
        axes: &[isize],
        keepdim: bool,
    ) -> Result<Tensor<CpuRuntime>> {
        let (axes, out) = alloc_reduce_output(self, a, axes, keepdim, a.dtype())?;
        mean_impl(self, a, &axes, &out)?;
        Ok(out)
    }
}
