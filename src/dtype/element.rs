//! Numeric facts each element type contributes to a reduction

use super::{CastInto, DType};
use bytemuck::Pod;
use std::fmt;
use std::ops::{Add, Div};

/// A Rust type that can be stored in a tensor and reduced
///
/// Supplies the identities the reductions start from (`zero` for sums,
/// `lowest_or_neg_inf` for max, `highest_or_inf` for min), the NaN test that
/// makes max/min propagate NaN, and the type sums accumulate in.
///
/// `bool` is deliberately not an `Element`: boolean tensors are not reducible.
pub trait Element:
    Pod
    + Send
    + Sync
    + fmt::Debug
    + PartialOrd
    + Add<Output = Self>
    + Div<Output = Self>
{
    /// Runtime tag of this type
    const DTYPE: DType;

    /// Accumulator for sums written as this type
    ///
    /// `f32` for the 16-bit float formats, `Self` otherwise.
    type SumAcc: Element + CastInto<Self>;

    /// Nearest value of this type, with `as` semantics
    fn from_f64(v: f64) -> Self;

    /// Additive identity
    fn zero() -> Self;

    /// Negative infinity for floats, the minimum for integers
    fn lowest_or_neg_inf() -> Self;

    /// Positive infinity for floats, the maximum for integers
    fn highest_or_inf() -> Self;

    /// NaN test; always false for integers
    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    /// `self + other`, wrapping on integer overflow
    fn accumulate(self, other: Self) -> Self;
}

macro_rules! impl_element {
    (float: $($ty:ty => $dtype:ident),*) => {$(
        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;
            type SumAcc = $ty;

            #[inline]
            fn from_f64(v: f64) -> Self { v as $ty }
            #[inline]
            fn zero() -> Self { 0.0 }
            #[inline]
            fn lowest_or_neg_inf() -> Self { <$ty>::NEG_INFINITY }
            #[inline]
            fn highest_or_inf() -> Self { <$ty>::INFINITY }
            #[inline]
            fn is_nan(self) -> bool { <$ty>::is_nan(self) }
            #[inline]
            fn accumulate(self, other: Self) -> Self { self + other }
        }
    )*};
    (int: $($ty:ty => $dtype:ident),*) => {$(
        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;
            type SumAcc = $ty;

            #[inline]
            fn from_f64(v: f64) -> Self { v as $ty }
            #[inline]
            fn zero() -> Self { 0 }
            #[inline]
            fn lowest_or_neg_inf() -> Self { <$ty>::MIN }
            #[inline]
            fn highest_or_inf() -> Self { <$ty>::MAX }
            #[inline]
            fn accumulate(self, other: Self) -> Self { self.wrapping_add(other) }
        }
    )*};
    // 16-bit floats sum in f32: f16 stops counting exactly at 2048, bf16 at 256.
    (half: $($ty:ty => $dtype:ident),*) => {$(
        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;
            type SumAcc = f32;

            #[inline]
            fn from_f64(v: f64) -> Self { <$ty>::from_f64(v) }
            #[inline]
            fn zero() -> Self { <$ty>::ZERO }
            #[inline]
            fn lowest_or_neg_inf() -> Self { <$ty>::NEG_INFINITY }
            #[inline]
            fn highest_or_inf() -> Self { <$ty>::INFINITY }
            #[inline]
            fn is_nan(self) -> bool { <$ty>::is_nan(self) }
            #[inline]
            fn accumulate(self, other: Self) -> Self { self + other }
        }
    )*};
}

impl_element!(float: f64 => F64, f32 => F32);
impl_element!(int:
    i64 => I64, i32 => I32, i16 => I16, i8 => I8,
    u64 => U64, u32 => U32, u16 => U16, u8 => U8
);
#[cfg(feature = "f16")]
impl_element!(half: half::f16 => F16, half::bf16 => BF16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(i16::DTYPE, DType::I16);
        assert_eq!(u8::DTYPE, DType::U8);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(f32::lowest_or_neg_inf(), f32::NEG_INFINITY);
        assert_eq!(f64::highest_or_inf(), f64::INFINITY);
        assert_eq!(i8::lowest_or_neg_inf(), i8::MIN);
        assert_eq!(u16::lowest_or_neg_inf(), 0);
        assert_eq!(u16::highest_or_inf(), u16::MAX);
    }

    #[test]
    fn test_nan_only_for_floats() {
        assert!(Element::is_nan(f32::NAN));
        assert!(!Element::is_nan(1.0f64));
        assert!(!Element::is_nan(7i64));
    }

    #[test]
    fn test_accumulate_wraps_integers() {
        assert_eq!(i8::MAX.accumulate(1), i8::MIN);
        assert_eq!(250u8.accumulate(10), 4);
        assert_eq!(1.5f32.accumulate(2.0), 3.5);
    }

    #[cfg(feature = "f16")]
    #[test]
    fn test_half_sums_in_f32() {
        use half::{bf16, f16};
        assert_eq!(bf16::DTYPE, DType::BF16);
        assert!(Element::is_nan(f16::NAN));
        assert_eq!(<f16 as Element>::zero(), f16::ZERO);
        assert_eq!(<<f16 as Element>::SumAcc as Element>::DTYPE, DType::F32);
        assert_eq!(<f16 as Element>::from_f64(0.5), f16::from_f32(0.5));
    }
}
