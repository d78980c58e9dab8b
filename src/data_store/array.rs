//! `DataArray`: a named, typed, flat buffer of `tuple_count × components` elements.

use crate::error::EbsdError;
use crate::types::{ArrayBuffer, DataType, Element};

#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    name: String,
    data_type: DataType,
    components: usize,
    tuple_count: usize,
    /// `None` for arrays declared in a proxy store.
    buffer: Option<ArrayBuffer>,
}

impl DataArray {
    /// A zero-filled array.
    pub fn zeros(
        name: impl Into<String>,
        data_type: DataType,
        tuple_count: usize,
        components: usize,
    ) -> Result<Self, EbsdError> {
        let name = name.into();
        check_components(&name, components)?;
        Ok(Self {
            buffer: Some(ArrayBuffer::zeros(data_type, tuple_count * components)),
            name,
            data_type,
            components,
            tuple_count,
        })
    }

    /// An array with structure only, as created during preflight.
    pub fn declared(
        name: impl Into<String>,
        data_type: DataType,
        tuple_count: usize,
        components: usize,
    ) -> Result<Self, EbsdError> {
        let name = name.into();
        check_components(&name, components)?;
        Ok(Self {
            name,
            data_type,
            components,
            tuple_count,
            buffer: None,
        })
    }

    /// Wraps an owned vector; its length must be a multiple of `components`.
    pub fn from_vec<T: Element>(
        name: impl Into<String>,
        values: Vec<T>,
        components: usize,
    ) -> Result<Self, EbsdError> {
        let name = name.into();
        check_components(&name, components)?;
        if values.len() % components != 0 {
            return Err(EbsdError::InvalidParameter(format!(
                "array '{}' has {} values, not a multiple of {} components",
                name,
                values.len(),
                components
            )));
        }
        Ok(Self {
            tuple_count: values.len() / components,
            data_type: T::DATA_TYPE,
            components,
            buffer: Some(T::into_buffer(values)),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn tuple_count(&self) -> usize {
        self.tuple_count
    }

    pub fn len(&self) -> usize {
        self.tuple_count * self.components
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer(&self) -> Option<&ArrayBuffer> {
        self.buffer.as_ref()
    }

    /// Typed read access; fails with `TypeMismatch` if `T` is not the stored type.
    pub fn as_slice<T: Element>(&self) -> Result<&[T], EbsdError> {
        self.check_type::<T>()?;
        let buffer = self.allocated()?;
        T::view(buffer).ok_or_else(|| self.mismatch::<T>())
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T], EbsdError> {
        self.check_type::<T>()?;
        if self.buffer.is_none() {
            return Err(not_allocated(&self.name));
        }
        let expected = T::DATA_TYPE;
        let found = self.data_type;
        let name = self.name.clone();
        self.buffer
            .as_mut()
            .and_then(T::view_mut)
            .ok_or(EbsdError::TypeMismatch {
                path: name,
                expected,
                found,
            })
    }

    /// Reads element `index` (flat, not tuple) as `f64`.
    pub fn value_f64(&self, index: usize) -> Result<f64, EbsdError> {
        let buffer = self.allocated()?;
        if index >= buffer.len() {
            return Err(EbsdError::InvalidParameter(format!(
                "index {} out of bounds for array '{}' of length {}",
                index,
                self.name,
                buffer.len()
            )));
        }
        Ok(buffer.value_f64(index))
    }

    /// Sets every element to `value` cast to the element type.
    pub fn fill_f64(&mut self, value: f64) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.fill_f64(value);
        }
    }

    /// Copies tuple `src` over tuple `dst`. No-op for declared arrays.
    pub fn copy_tuple(&mut self, src: usize, dst: usize) {
        let components = self.components;
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.copy_tuple(src, dst, components);
        }
    }

    /// New array with `map.len()` tuples where tuple `i` is old tuple `map[i]`
    /// (zeros where `None`).
    pub fn reindex_tuples(&self, map: &[Option<usize>]) -> Self {
        Self {
            name: self.name.clone(),
            data_type: self.data_type,
            components: self.components,
            tuple_count: map.len(),
            buffer: self
                .buffer
                .as_ref()
                .map(|b| b.reindex(map, self.components)),
        }
    }

    /// A structure-only copy for proxy stores.
    pub fn to_declared(&self) -> Self {
        Self {
            name: self.name.clone(),
            data_type: self.data_type,
            components: self.components,
            tuple_count: self.tuple_count,
            buffer: None,
        }
    }

    fn allocated(&self) -> Result<&ArrayBuffer, EbsdError> {
        self.buffer.as_ref().ok_or_else(|| not_allocated(&self.name))
    }

    fn check_type<T: Element>(&self) -> Result<(), EbsdError> {
        if T::DATA_TYPE != self.data_type {
            return Err(self.mismatch::<T>());
        }
        Ok(())
    }

    fn mismatch<T: Element>(&self) -> EbsdError {
        EbsdError::TypeMismatch {
            path: self.name.clone(),
            expected: T::DATA_TYPE,
            found: self.data_type,
        }
    }
}

fn check_components(name: &str, components: usize) -> Result<(), EbsdError> {
    if components == 0 {
        return Err(EbsdError::InvalidParameter(format!(
            "array '{name}' must have at least one component"
        )));
    }
    Ok(())
}

fn not_allocated(name: &str) -> EbsdError {
    EbsdError::AlgorithmicFailure(format!(
        "array '{name}' is declared but not allocated (preflight store)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_infers_type_and_tuples() {
        let array = DataArray::from_vec("Quats", vec![0.0f32; 8], 4).unwrap();
        assert_eq!(array.data_type(), DataType::Float32);
        assert_eq!(array.tuple_count(), 2);
        assert_eq!(array.components(), 4);
        assert!(DataArray::from_vec("bad", vec![1i32; 5], 2).is_err());
        assert!(DataArray::from_vec("zero", vec![1i32; 5], 0).is_err());
    }

    #[test]
    fn test_typed_access_checks_tag() {
        let mut array = DataArray::zeros("ids", DataType::Int32, 3, 1).unwrap();
        assert_eq!(array.as_slice::<i32>().unwrap(), &[0, 0, 0]);
        array.as_mut_slice::<i32>().unwrap()[1] = 7;
        assert_eq!(array.value_f64(1).unwrap(), 7.0);
        assert!(matches!(
            array.as_slice::<f32>(),
            Err(EbsdError::TypeMismatch { .. })
        ));
        assert!(array.value_f64(3).is_err());
    }

    #[test]
    fn test_declared_arrays_have_no_data() {
        let array = DataArray::declared("mask", DataType::Bool, 10, 1).unwrap();
        assert!(!array.is_allocated());
        assert_eq!(array.len(), 10);
        assert!(array.as_slice::<bool>().is_err());
        let filled = DataArray::zeros("mask", DataType::Bool, 10, 1).unwrap();
        assert_eq!(filled.to_declared(), array);
    }

    #[test]
    fn test_tuple_copy_and_reindex() {
        let mut array = DataArray::from_vec("e", vec![1u8, 2, 3, 4, 5, 6], 3).unwrap();
        array.copy_tuple(1, 0);
        assert_eq!(array.as_slice::<u8>().unwrap(), &[4, 5, 6, 4, 5, 6]);

        let shifted = array.reindex_tuples(&[None, Some(0)]);
        assert_eq!(shifted.as_slice::<u8>().unwrap(), &[0, 0, 0, 4, 5, 6]);
        assert_eq!(shifted.tuple_count(), 2);
    }
}
