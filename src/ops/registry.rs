//! Process-wide table of reduction kernels
//!
//! Kernels are looked up by [`ReduceKind`] or by name. A registry is built
//! once with [`OpRegistryBuilder`] and is immutable afterwards, so lookups on
//! the global instance take no lock.
//!
//! ```
//! use axfold::ops::registry::{ReduceKind, global_registry};
//! # use axfold::prelude::*;
//! # let device = CpuDevice::new();
//! # let client = CpuRuntime::default_client(&device);
//!
//! let a = Tensor::<CpuRuntime>::from_slice(&[5i32, 5, 3, 5], &[4], &device);
//! let out = Tensor::<CpuRuntime>::zeros(&[], DType::I64, &device);
//! global_registry().call(ReduceKind::ArgMax, &client, &a, &[0], &out)?;
//! assert_eq!(out.item::<i64>()?, 0);
//! # Ok::<(), axfold::error::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::runtime::cpu::helpers::reduce_by_kind;
use crate::runtime::cpu::{CpuClient, CpuRuntime};
use crate::tensor::Tensor;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

pub use super::reduce::ReduceKind;

/// A reduction that can be called through the registry
pub trait ReductionKernel: Send + Sync {
    /// Name the kernel is registered under
    fn name(&self) -> &str;

    /// Reduce `input` over `axes` into `out`
    fn call(
        &self,
        client: &CpuClient,
        input: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()>;
}

/// Native CPU kernel for one [`ReduceKind`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NativeReduction {
    kind: ReduceKind,
}

impl NativeReduction {
    /// Create the native kernel for `kind`
    pub fn new(kind: ReduceKind) -> Self {
        Self { kind }
    }

    /// The reduction this kernel runs
    pub fn kind(&self) -> ReduceKind {
        self.kind
    }
}

impl ReductionKernel for NativeReduction {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn call(
        &self,
        client: &CpuClient,
        input: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        reduce_by_kind(self.kind, client, input, axes, out)
    }
}

/// Immutable name-to-kernel table
pub struct OpRegistry {
    kernels: HashMap<String, Box<dyn ReductionKernel>>,
}

impl OpRegistry {
    /// Start building a registry
    pub fn builder() -> OpRegistryBuilder {
        OpRegistryBuilder::new()
    }

    /// Registry holding every native reduction
    pub fn native() -> Self {
        register_native_ops(OpRegistryBuilder::new()).build()
    }

    /// Look a kernel up by name
    pub fn get_by_name(&self, name: &str) -> Result<&dyn ReductionKernel> {
        self.kernels
            .get(name)
            .map(|k| k.as_ref())
            .ok_or_else(|| Error::OpNotRegistered {
                name: name.to_string(),
            })
    }

    /// Look a kernel up by kind
    pub fn get(&self, kind: ReduceKind) -> Result<&dyn ReductionKernel> {
        self.get_by_name(kind.name())
    }

    /// Whether a kernel is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kernels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered kernels
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Run the kernel registered for `kind`
    pub fn call(
        &self,
        kind: ReduceKind,
        client: &CpuClient,
        input: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        self.get(kind)?.call(client, input, axes, out)
    }

    /// Run the kernel registered under `name`
    pub fn call_by_name(
        &self,
        name: &str,
        client: &CpuClient,
        input: &Tensor<CpuRuntime>,
        axes: &[usize],
        out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        self.get_by_name(name)?.call(client, input, axes, out)
    }
}

impl fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpRegistry")
            .field("kernels", &self.names())
            .finish()
    }
}

/// Builder for [`OpRegistry`]
///
/// Registering a second kernel under an existing name replaces the first.
#[derive(Default)]
pub struct OpRegistryBuilder {
    kernels: HashMap<String, Box<dyn ReductionKernel>>,
}

impl OpRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kernel under its own name
    pub fn register<K: ReductionKernel + 'static>(mut self, kernel: K) -> Self {
        let name = kernel.name().to_string();
        if self.kernels.insert(name.clone(), Box::new(kernel)).is_some() {
            debug!("replacing reduction kernel '{name}'");
        }
        self
    }

    /// Freeze the table
    pub fn build(self) -> OpRegistry {
        OpRegistry {
            kernels: self.kernels,
        }
    }
}

/// Register the native kernel for every [`ReduceKind`]
pub fn register_native_ops(builder: OpRegistryBuilder) -> OpRegistryBuilder {
    ReduceKind::ALL
        .into_iter()
        .fold(builder, |b, kind| b.register(NativeReduction::new(kind)))
}

static GLOBAL_REGISTRY: OnceLock<OpRegistry> = OnceLock::new();

/// Install the process-wide registry
///
/// Fails with [`Error::RegistryAlreadyInstalled`] if a registry was installed
/// before, or if [`global_registry`] already installed the native one.
pub fn install_global(registry: OpRegistry) -> Result<()> {
    let names = registry.names().join(", ");
    GLOBAL_REGISTRY
        .set(registry)
        .map_err(|_| Error::RegistryAlreadyInstalled)?;
    debug!("installed global reduction registry: [{names}]");
    Ok(())
}

/// The process-wide registry
///
/// Installs [`OpRegistry::native`] on first use if nothing was installed.
pub fn global_registry() -> &'static OpRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        debug!("installing native reduction registry");
        OpRegistry::native()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::runtime::cpu::CpuDevice;

    struct MaxAsSum;

    impl ReductionKernel for MaxAsSum {
        fn name(&self) -> &str {
            "sum"
        }

        fn call(
            &self,
            client: &CpuClient,
            input: &Tensor<CpuRuntime>,
            axes: &[usize],
            out: &Tensor<CpuRuntime>,
        ) -> Result<()> {
            reduce_by_kind(ReduceKind::AMax, client, input, axes, out)
        }
    }

    #[test]
    fn test_native_registry_has_every_kind() {
        let registry = OpRegistry::native();
        assert_eq!(registry.len(), ReduceKind::ALL.len());
        assert_eq!(
            registry.names(),
            vec!["amax", "amin", "argmax", "argmin", "mean", "sum"]
        );
        for kind in ReduceKind::ALL {
            assert_eq!(registry.get(kind).unwrap().name(), kind.name());
        }
    }

    #[test]
    fn test_missing_op() {
        let registry = OpRegistry::builder()
            .register(NativeReduction::new(ReduceKind::Sum))
            .build();
        assert!(registry.contains("sum"));
        let err = registry.get(ReduceKind::ArgMax).err().unwrap();
        assert!(matches!(err, Error::OpNotRegistered { ref name } if name == "argmax"));
    }

    #[test]
    fn test_later_registration_replaces() {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        let registry = register_native_ops(OpRegistry::builder())
            .register(MaxAsSum)
            .build();
        assert_eq!(registry.len(), ReduceKind::ALL.len());

        let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 4.0, 2.0], &[3], &device);
        let out = Tensor::<CpuRuntime>::zeros(&[], DType::F32, &device);
        registry.call_by_name("sum", &client, &a, &[0], &out).unwrap();
        assert_eq!(out.item::<f32>().unwrap(), 4.0);
    }

    #[test]
    fn test_global_registry_is_installed_once() {
        let first = global_registry();
        assert!(std::ptr::eq(first, global_registry()));
        assert!(matches!(
            install_global(OpRegistry::native()),
            Err(Error::RegistryAlreadyInstalled)
        ));
    }
}
