//! This module defines the canonical, type-safe tag describing the element type
//! of every array held in the data store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical, internal representation of an array element type.
///
/// Arrays carry this tag alongside their raw buffer; all typed access checks it
/// and reports `TypeMismatch` instead of reinterpreting memory.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Bool,
}

impl DataType {
    /// Size of one element in bytes, as laid out by the raw writer.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Bool => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Returns `true` if the data type is a signed integer.
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` if the data type is an unsigned integer.
    pub fn is_unsigned_int(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    /// Returns `true` if the data type is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Every type can be read as a scalar `f64`; booleans read as 0/1.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Bool)
    }
}

/// Provides the canonical string representation for a `DataType`.
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These names are part of the writer manifest contract.
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_and_categories() {
        assert_eq!(DataType::Bool.size_in_bytes(), 1);
        assert_eq!(DataType::UInt16.size_in_bytes(), 2);
        assert_eq!(DataType::Float32.size_in_bytes(), 4);
        assert_eq!(DataType::Int64.size_in_bytes(), 8);

        assert!(DataType::Int32.is_signed_int());
        assert!(DataType::UInt32.is_unsigned_int());
        assert!(DataType::Float64.is_float());
        assert!(!DataType::Bool.is_numeric());
    }

    #[test]
    fn test_serde_names_are_stable() {
        let json = serde_json::to_string(&DataType::Float32).unwrap();
        assert_eq!(json, "\"Float32\"");
        let back: DataType = serde_json::from_str("\"UInt8\"").unwrap();
        assert_eq!(back, DataType::UInt8);
        assert_eq!(DataType::Int16.to_string(), "Int16");
    }
}
