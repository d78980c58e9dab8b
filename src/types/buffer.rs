//! The closed, tagged storage used by every data array.
//!
//! `ArrayBuffer` is one contiguous `Vec<T>` per supported element type. The
//! `Element` trait links each Rust primitive to its variant so that typed views
//! can be borrowed without unchecked casts.

use std::borrow::Cow;

use num_traits::{NumCast, ToPrimitive};

use crate::types::DataType;

//==================================================================================
// 1. The Buffer Enum
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayBuffer {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
}

/// Runs `$body` with `$v` bound to the inner `Vec` of whichever variant `$buf` is.
macro_rules! with_buffer {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            ArrayBuffer::Int8($v) => $body,
            ArrayBuffer::UInt8($v) => $body,
            ArrayBuffer::Int16($v) => $body,
            ArrayBuffer::UInt16($v) => $body,
            ArrayBuffer::Int32($v) => $body,
            ArrayBuffer::UInt32($v) => $body,
            ArrayBuffer::Int64($v) => $body,
            ArrayBuffer::UInt64($v) => $body,
            ArrayBuffer::Float32($v) => $body,
            ArrayBuffer::Float64($v) => $body,
            ArrayBuffer::Bool($v) => $body,
        }
    };
}

/// Like `with_buffer!`, but re-wraps the produced `Vec` in the same variant.
macro_rules! map_buffer {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            ArrayBuffer::Int8($v) => ArrayBuffer::Int8($body),
            ArrayBuffer::UInt8($v) => ArrayBuffer::UInt8($body),
            ArrayBuffer::Int16($v) => ArrayBuffer::Int16($body),
            ArrayBuffer::UInt16($v) => ArrayBuffer::UInt16($body),
            ArrayBuffer::Int32($v) => ArrayBuffer::Int32($body),
            ArrayBuffer::UInt32($v) => ArrayBuffer::UInt32($body),
            ArrayBuffer::Int64($v) => ArrayBuffer::Int64($body),
            ArrayBuffer::UInt64($v) => ArrayBuffer::UInt64($body),
            ArrayBuffer::Float32($v) => ArrayBuffer::Float32($body),
            ArrayBuffer::Float64($v) => ArrayBuffer::Float64($body),
            ArrayBuffer::Bool($v) => ArrayBuffer::Bool($body),
        }
    };
}

impl ArrayBuffer {
    /// A zero-filled buffer of `len` elements.
    pub fn zeros(dtype: DataType, len: usize) -> Self {
        match dtype {
            DataType::Int8 => Self::Int8(vec![0; len]),
            DataType::UInt8 => Self::UInt8(vec![0; len]),
            DataType::Int16 => Self::Int16(vec![0; len]),
            DataType::UInt16 => Self::UInt16(vec![0; len]),
            DataType::Int32 => Self::Int32(vec![0; len]),
            DataType::UInt32 => Self::UInt32(vec![0; len]),
            DataType::Int64 => Self::Int64(vec![0; len]),
            DataType::UInt64 => Self::UInt64(vec![0; len]),
            DataType::Float32 => Self::Float32(vec![0.0; len]),
            DataType::Float64 => Self::Float64(vec![0.0; len]),
            DataType::Bool => Self::Bool(vec![false; len]),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int8(_) => DataType::Int8,
            Self::UInt8(_) => DataType::UInt8,
            Self::Int16(_) => DataType::Int16,
            Self::UInt16(_) => DataType::UInt16,
            Self::Int32(_) => DataType::Int32,
            Self::UInt32(_) => DataType::UInt32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
        }
    }

    pub fn len(&self) -> usize {
        with_buffer!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads element `index` as an `f64`. Booleans read as 0.0 / 1.0.
    pub fn value_f64(&self, index: usize) -> f64 {
        with_buffer!(self, v => Element::to_f64(v[index]))
    }

    /// Overwrites every element with `value`, cast to the buffer's element type.
    pub fn fill_f64(&mut self, value: f64) {
        with_buffer!(self, v => {
            let cast = Element::from_f64(value);
            v.iter_mut().for_each(|x| *x = cast);
        })
    }

    /// Copies the `components` elements of tuple `src` over tuple `dst`.
    pub fn copy_tuple(&mut self, src: usize, dst: usize, components: usize) {
        if src == dst {
            return;
        }
        with_buffer!(self, v => {
            v.copy_within(src * components..(src + 1) * components, dst * components)
        })
    }

    /// Builds a new buffer whose tuple `i` is the old tuple `map[i]`, or zeros for `None`.
    pub fn reindex(&self, map: &[Option<usize>], components: usize) -> Self {
        map_buffer!(self, v => {
            let mut out = Vec::with_capacity(map.len() * components);
            for source in map {
                match source {
                    Some(s) => out.extend_from_slice(&v[s * components..(s + 1) * components]),
                    None => out.resize(out.len() + components, Default::default()),
                }
            }
            out
        })
    }

    /// A byte view of the buffer in native byte order. Booleans are widened to one
    /// byte each, which requires a copy.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Int8(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::UInt8(v) => Cow::Borrowed(v.as_slice()),
            Self::Int16(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::UInt16(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::Int32(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::UInt32(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::Int64(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::UInt64(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::Float32(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::Float64(v) => Cow::Borrowed(bytemuck::cast_slice(v)),
            Self::Bool(v) => Cow::Owned(v.iter().map(|&b| b as u8).collect()),
        }
    }
}

//==================================================================================
// 2. The Element Trait
//==================================================================================

/// Links a Rust primitive to its `DataType` tag and `ArrayBuffer` variant.
pub trait Element: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static {
    const DATA_TYPE: DataType;

    fn view(buffer: &ArrayBuffer) -> Option<&[Self]>;
    fn view_mut(buffer: &mut ArrayBuffer) -> Option<&mut [Self]>;
    fn into_buffer(values: Vec<Self>) -> ArrayBuffer;

    fn to_f64(self) -> f64;
    /// Saturating-free cast: values that do not fit become `Default`.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_numeric_element {
    ($T:ty, $variant:ident) => {
        impl Element for $T {
            const DATA_TYPE: DataType = DataType::$variant;

            fn view(buffer: &ArrayBuffer) -> Option<&[Self]> {
                match buffer {
                    ArrayBuffer::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn view_mut(buffer: &mut ArrayBuffer) -> Option<&mut [Self]> {
                match buffer {
                    ArrayBuffer::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> ArrayBuffer {
                ArrayBuffer::$variant(values)
            }

            fn to_f64(self) -> f64 {
                ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
            }

            fn from_f64(value: f64) -> Self {
                <$T as NumCast>::from(value).unwrap_or_default()
            }
        }
    };
}

impl_numeric_element!(i8, Int8);
impl_numeric_element!(u8, UInt8);
impl_numeric_element!(i16, Int16);
impl_numeric_element!(u16, UInt16);
impl_numeric_element!(i32, Int32);
impl_numeric_element!(u32, UInt32);
impl_numeric_element!(i64, Int64);
impl_numeric_element!(u64, UInt64);
impl_numeric_element!(f32, Float32);
impl_numeric_element!(f64, Float64);

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn view(buffer: &ArrayBuffer) -> Option<&[Self]> {
        match buffer {
            ArrayBuffer::Bool(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn view_mut(buffer: &mut ArrayBuffer) -> Option<&mut [Self]> {
        match buffer {
            ArrayBuffer::Bool(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    fn into_buffer(values: Vec<Self>) -> ArrayBuffer {
        ArrayBuffer::Bool(values)
    }

    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    fn from_f64(value: f64) -> Self {
        value != 0.0
    }
}
