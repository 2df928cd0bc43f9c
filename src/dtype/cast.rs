//! Element-to-element conversions with `as` semantics
//!
//! Reductions that read one dtype and accumulate or write another (sum into a
//! wider type, f16 accumulated in f32) need a conversion that is exact where
//! the target can represent the value. Routing integers through `f64` would
//! lose bits above 2^53, so primitive pairs convert with a direct `as` cast.
//! Half-precision types go through `f64`, which represents every f16/bf16
//! value exactly.

/// Conversion between element types, mirroring a numeric `as` cast
///
/// Float to integer conversions saturate and map NaN to zero; integer to
/// integer conversions wrap.
pub trait CastInto<T> {
    /// Convert `self` into `T`
    fn cast_into(self) -> T;
}

macro_rules! impl_cast_primitive {
    ($($src:ty),*) => {
        $(
            impl_cast_primitive!(@from $src => f64, f32, i64, i32, i16, i8, u64, u32, u16, u8);
        )*
    };
    (@from $src:ty => $($dst:ty),*) => {
        $(
            impl CastInto<$dst> for $src {
                #[inline]
                fn cast_into(self) -> $dst {
                    self as $dst
                }
            }
        )*
    };
}

impl_cast_primitive!(f64, f32, i64, i32, i16, i8, u64, u32, u16, u8);

#[cfg(feature = "f16")]
macro_rules! impl_cast_half {
    ($($half:ty),*) => {
        $(
            impl_cast_half!(@pair $half => f64, f32, i64, i32, i16, i8, u64, u32, u16, u8);

            impl CastInto<half::f16> for $half {
                #[inline]
                fn cast_into(self) -> half::f16 {
                    half::f16::from_f64(self.to_f64())
                }
            }

            impl CastInto<half::bf16> for $half {
                #[inline]
                fn cast_into(self) -> half::bf16 {
                    half::bf16::from_f64(self.to_f64())
                }
            }
        )*
    };
    (@pair $half:ty => $($prim:ty),*) => {
        $(
            impl CastInto<$prim> for $half {
                #[inline]
                fn cast_into(self) -> $prim {
                    self.to_f64() as $prim
                }
            }

            impl CastInto<$half> for $prim {
                #[inline]
                fn cast_into(self) -> $half {
                    <$half>::from_f64(self as f64)
                }
            }
        )*
    };
}

#[cfg(feature = "f16")]
impl_cast_half!(half::f16, half::bf16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_casts_are_exact() {
        let big: i64 = (1 << 60) + 1;
        let widened: i64 = CastInto::<i64>::cast_into(big);
        assert_eq!(widened, big);
        let as_u64: u64 = big.cast_into();
        assert_eq!(as_u64, big as u64);
    }

    #[test]
    fn test_integer_narrowing_wraps() {
        let v: i32 = 300;
        let narrowed: u8 = v.cast_into();
        assert_eq!(narrowed, 44);
    }

    #[test]
    fn test_float_to_int_saturates() {
        let nan: i32 = f32::NAN.cast_into();
        assert_eq!(nan, 0);
        let huge: i8 = 1e10f64.cast_into();
        assert_eq!(huge, i8::MAX);
    }

    #[cfg(feature = "f16")]
    #[test]
    fn test_half_casts() {
        let h: half::f16 = 1.5f32.cast_into();
        assert_eq!(h, half::f16::from_f32(1.5));
        let back: f32 = h.cast_into();
        assert_eq!(back, 1.5);
        let b: half::bf16 = h.cast_into();
        assert_eq!(b.to_f32(), 1.5);
        let i: i64 = half::f16::from_f32(-3.0).cast_into();
        assert_eq!(i, -3);
    }
}
