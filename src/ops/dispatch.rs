//! Runtime dtype dispatch
//!
//! A reduction is written once, generic over [`Element`]; `dispatch_dtype!`
//! turns a runtime [`DType`] into a match whose arms instantiate it with each
//! concrete type. The enclosing function must return
//! `crate::error::Result<_>`: `Bool`, and the 16-bit floats without the `f16`
//! feature, `return` an `UnsupportedDType` error from it.
//!
//! ```ignore
//! fn width(dtype: DType) -> Result<usize> {
//!     dispatch_dtype!(dtype, T => { Ok(std::mem::size_of::<T>()) }, "width")
//! }
//! ```
//!
//! [`Element`]: crate::dtype::Element
//! [`DType`]: crate::dtype::DType

/// One arm of [`dispatch_dtype!`] for a `half` type
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_f16_type {
    ($T:ident, $body:block, $dtype:expr, $error_op:expr, $type:ty) => {{
        #[cfg(feature = "f16")]
        {
            type $T = $type;
            $body
        }
        #[cfg(not(feature = "f16"))]
        {
            return Err($crate::error::Error::UnsupportedDType {
                dtype: $dtype,
                op: $error_op,
            });
        }
    }};
}

/// Run `$body` with `$T` bound to the Rust type of `$dtype`
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, $error_op, half::f16)
            }
            $crate::dtype::DType::BF16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, $error_op, half::bf16)
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: $dtype,
                    op: $error_op,
                })
            }
        }
    };
}

/// Dispatch over an (input, output) dtype pair.
///
/// Expands to two nested [`dispatch_dtype!`] matches, binding `$In` to the
/// input type and `$Out` to the output type. Used by reductions whose result
/// type may differ from the input type (sum).
#[macro_export]
macro_rules! dispatch_dtype_pair {
    ($in_dtype:expr, $out_dtype:expr, ($In:ident, $Out:ident) => $body:block, $error_op:expr) => {
        $crate::dispatch_dtype!($out_dtype, $Out => {
            $crate::dispatch_dtype!($in_dtype, $In => $body, $error_op)
        }, $error_op)
    };
}
