//! Path resolution: `DataArrayPath` → typed, shape-checked view.
//!
//! Every check happens here so filters can rely on the invariants of the view:
//! correct element type, correct component count, and `len == tuples * comps`.
//! Resolution has no side effects.

use crate::data_store::{DataArray, DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::types::{DataType, Element};

/// A borrowed, typed view of an array's elements.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    components: usize,
}

impl<'a, T> ArrayView<'a, T> {
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn tuple_count(&self) -> usize {
        self.data.len() / self.components
    }

    pub fn tuple(&self, index: usize) -> &'a [T] {
        &self.data[index * self.components..(index + 1) * self.components]
    }
}

#[derive(Debug)]
pub struct ArrayViewMut<'a, T> {
    data: &'a mut [T],
    components: usize,
}

impl<T> ArrayViewMut<'_, T> {
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn tuple_count(&self) -> usize {
        self.data.len() / self.components
    }

    pub fn tuple_mut(&mut self, index: usize) -> &mut [T] {
        let c = self.components;
        &mut self.data[index * c..(index + 1) * c]
    }
}

impl DataContainerArray {
    /// Checks existence, element type and component count without borrowing
    /// the data. Works on proxy stores.
    pub fn require(
        &self,
        path: &DataArrayPath,
        data_type: DataType,
        components: usize,
    ) -> Result<&DataArray, EbsdError> {
        let array = self.get_array(path)?;
        if array.data_type() != data_type {
            return Err(EbsdError::TypeMismatch {
                path: path.to_string(),
                expected: data_type,
                found: array.data_type(),
            });
        }
        check_components(path, array, components)?;
        Ok(array)
    }

    /// A 1-component numeric or bool array, read through `value_f64`.
    pub fn resolve_numeric(&self, path: &DataArrayPath) -> Result<&DataArray, EbsdError> {
        let array = self.get_array(path)?;
        check_components(path, array, 1)?;
        Ok(array)
    }

    pub fn resolve<T: Element>(
        &self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<ArrayView<'_, T>, EbsdError> {
        let array = self.require(path, T::DATA_TYPE, components)?;
        Ok(ArrayView {
            data: array.as_slice::<T>()?,
            components,
        })
    }

    pub fn resolve_mut<T: Element>(
        &mut self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<ArrayViewMut<'_, T>, EbsdError> {
        self.require(path, T::DATA_TYPE, components)?;
        let array = self.get_array_mut(path)?;
        Ok(ArrayViewMut {
            data: array.as_mut_slice::<T>()?,
            components,
        })
    }
}

fn check_components(path: &DataArrayPath, array: &DataArray, expected: usize) -> Result<(), EbsdError> {
    if array.components() != expected {
        return Err(EbsdError::ComponentCountMismatch {
            path: path.to_string(),
            expected,
            found: array.components(),
        });
    }
    Ok(())
}
