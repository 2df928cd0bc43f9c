//! Common test utilities
#![allow(dead_code)]

use axfold::runtime::Runtime;
use axfold::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Deterministic RNG for randomized checks
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random shape with `ndim` dimensions of length `1..=max_len`
pub fn random_shape(rng: &mut StdRng, ndim: usize, max_len: usize) -> Vec<usize> {
    (0..ndim).map(|_| rng.random_range(1..=max_len)).collect()
}

/// Random non-empty subset of `0..ndim`, in random order
pub fn random_axes(rng: &mut StdRng, ndim: usize) -> Vec<usize> {
    let mut axes: Vec<usize> = (0..ndim).filter(|_| rng.random_bool(0.5)).collect();
    if axes.is_empty() {
        axes.push(rng.random_range(0..ndim));
    }
    if axes.len() > 1 && rng.random_bool(0.5) {
        axes.reverse();
    }
    axes
}

/// Row-major strides for `shape`
pub fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Reference reduction over a contiguous buffer
///
/// Returns, for every output element in row-major order, the group's values in
/// ascending row-major order of the reduced axes.
pub fn reference_groups<T: Copy>(data: &[T], shape: &[usize], axes: &[usize]) -> Vec<Vec<T>> {
    let strides = contiguous_strides(shape);
    let kept: Vec<usize> = (0..shape.len()).filter(|d| !axes.contains(d)).collect();
    let mut reduced: Vec<usize> = axes.to_vec();
    reduced.sort_unstable();

    let coords = |dims: &[usize]| -> Vec<Vec<usize>> {
        let total: usize = dims.iter().map(|&d| shape[d]).product();
        (0..total)
            .map(|mut i| {
                let mut c = vec![0; dims.len()];
                for (k, &d) in dims.iter().enumerate().rev() {
                    c[k] = i % shape[d];
                    i /= shape[d];
                }
                c
            })
            .collect()
    };

    coords(&kept)
        .into_iter()
        .map(|kc| {
            coords(&reduced)
                .into_iter()
                .map(|rc| {
                    let offset: usize = kept
                        .iter()
                        .zip(&kc)
                        .chain(reduced.iter().zip(&rc))
                        .map(|(&d, &i)| i * strides[d])
                        .sum();
                    data[offset]
                })
                .collect()
        })
        .collect()
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert two f32 slices are close within tolerance
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}
