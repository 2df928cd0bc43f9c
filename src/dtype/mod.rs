//! Element types
//!
//! [`DType`] is the runtime tag a tensor carries; [`Element`] is the
//! compile-time side the kernels are generic over. `dispatch_dtype!` turns
//! one into the other.

mod cast;
mod element;

pub use cast::CastInto;
pub use element::Element;

use std::fmt;

/// Runtime element type of a tensor
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DType {
    /// `f64`
    F64,
    /// `f32`
    F32,
    /// IEEE half precision, `half::f16`
    F16,
    /// bfloat16, `half::bf16`
    BF16,
    /// `i64`; also the index type of argmax/argmin
    I64,
    /// `i32`
    I32,
    /// `i16`
    I16,
    /// `i8`
    I8,
    /// `u64`
    U64,
    /// `u32`
    U32,
    /// `u16`
    U16,
    /// `u8`
    U8,
    /// One byte per element; stored but never reduced
    Bool,
}

impl DType {
    /// Bytes per element
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F16 | Self::BF16 | Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 | Self::Bool => 1,
        }
    }

    /// Whether this is one of the floating point types
    ///
    /// Mean is only defined for these, and sum precision only applies to
    /// float outputs.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32 | Self::F16 | Self::BF16)
    }

    /// Lower-case name, e.g. `bf16`
    pub const fn name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::U64 => "u64",
            Self::U32 => "u32",
            Self::U16 => "u16",
            Self::U8 => "u8",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::BF16.size_in_bytes(), 2);
        assert_eq!(DType::U32.size_in_bytes(), 4);
        assert_eq!(DType::Bool.size_in_bytes(), 1);
    }

    #[test]
    fn test_float_types() {
        assert!(DType::F16.is_float());
        assert!(!DType::I32.is_float());
        assert!(!DType::Bool.is_float());
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::BF16.to_string(), "bf16");
        assert_eq!(format!("{}", DType::U64), "u64");
    }
}
