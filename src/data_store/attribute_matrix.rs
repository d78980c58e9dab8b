// In: src/data_store/attribute_matrix.rs

//! An `AttributeMatrix` groups arrays that share one tuple count, e.g. every
//! per-voxel (Cell) or per-grain (Feature) array of a container.

use serde::{Deserialize, Serialize};

use crate::data_store::DataArray;
use crate::error::EbsdError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeMatrixType {
    Cell,
    Feature,
    Ensemble,
    Vertex,
    Face,
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMatrix {
    name: String,
    matrix_type: AttributeMatrixType,
    tuple_dims: Vec<usize>,
    /// Insertion-ordered.
    arrays: Vec<DataArray>,
}

impl AttributeMatrix {
    pub fn new(name: impl Into<String>, matrix_type: AttributeMatrixType, tuple_dims: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            matrix_type,
            tuple_dims,
            arrays: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matrix_type(&self) -> AttributeMatrixType {
        self.matrix_type
    }

    pub fn tuple_dims(&self) -> &[usize] {
        &self.tuple_dims
    }

    pub fn tuple_count(&self) -> usize {
        self.tuple_dims.iter().product()
    }

    pub fn arrays(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.iter()
    }

    pub fn array_names(&self) -> Vec<&str> {
        self.arrays.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DataArray> {
        self.arrays.iter_mut().find(|a| a.name() == name)
    }

    /// Adds `array`, which must match this matrix's tuple count. An existing
    /// array of the same name is replaced in place only when `overwrite` is set.
    pub fn insert_array(&mut self, array: DataArray, overwrite: bool) -> Result<(), EbsdError> {
        if array.tuple_count() != self.tuple_count() {
            return Err(EbsdError::TupleCountMismatch {
                path: format!("{}/{}", self.name, array.name()),
                expected: self.tuple_count(),
                found: array.tuple_count(),
            });
        }
        match self.position(array.name()) {
            Some(_) if !overwrite => Err(EbsdError::DuplicateName(format!(
                "array '{}' already exists in attribute matrix '{}'",
                array.name(),
                self.name
            ))),
            Some(index) => {
                self.arrays[index] = array;
                Ok(())
            }
            None => {
                self.arrays.push(array);
                Ok(())
            }
        }
    }

    pub fn remove_array(&mut self, name: &str) -> Option<DataArray> {
        self.position(name).map(|index| self.arrays.remove(index))
    }

    /// Copies tuple `src` over tuple `dst` in every array of the matrix.
    pub fn copy_tuple(&mut self, src: usize, dst: usize) {
        if src == dst {
            return;
        }
        for array in &mut self.arrays {
            array.copy_tuple(src, dst);
        }
    }

    /// Replaces every array with `array.reindex_tuples(map)`; the tuple count
    /// stays the same, so `map.len()` must equal it.
    pub fn apply_tuple_map(&mut self, map: &[Option<usize>]) -> Result<(), EbsdError> {
        if map.len() != self.tuple_count() {
            return Err(EbsdError::TupleCountMismatch {
                path: self.name.clone(),
                expected: self.tuple_count(),
                found: map.len(),
            });
        }
        for array in &mut self.arrays {
            *array = array.reindex_tuples(map);
        }
        Ok(())
    }

    /// Structure-only copy: same names, types and shapes; no buffers.
    pub fn to_declared(&self) -> Self {
        Self {
            name: self.name.clone(),
            matrix_type: self.matrix_type,
            tuple_dims: self.tuple_dims.clone(),
            arrays: self.arrays.iter().map(DataArray::to_declared).collect(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.arrays.iter().position(|a| a.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn cell_matrix() -> AttributeMatrix {
        let mut am = AttributeMatrix::new("Cells", AttributeMatrixType::Cell, vec![2, 2, 1]);
        am.insert_array(DataArray::from_vec("Phases", vec![1i32, 1, 2, 2], 1).unwrap(), false)
            .unwrap();
        am.insert_array(
            DataArray::from_vec("CI", vec![0.1f32, 0.2, 0.3, 0.4], 1).unwrap(),
            false,
        )
        .unwrap();
        am
    }

    #[test]
    fn test_insert_rules() {
        let mut am = cell_matrix();
        assert_eq!(am.tuple_count(), 4);
        assert_eq!(am.array_names(), vec!["Phases", "CI"]);

        let dup = DataArray::zeros("CI", DataType::Float32, 4, 1).unwrap();
        assert!(matches!(
            am.insert_array(dup.clone(), false),
            Err(EbsdError::DuplicateName(_))
        ));
        am.insert_array(dup, true).unwrap();
        assert_eq!(am.get("CI").unwrap().as_slice::<f32>().unwrap(), &[0.0; 4]);
        assert_eq!(am.array_names(), vec!["Phases", "CI"]);

        let short = DataArray::zeros("Short", DataType::Int8, 3, 1).unwrap();
        assert!(matches!(
            am.insert_array(short, false),
            Err(EbsdError::TupleCountMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn test_copy_tuple_touches_every_array() {
        let mut am = cell_matrix();
        am.copy_tuple(3, 0);
        assert_eq!(am.get("Phases").unwrap().as_slice::<i32>().unwrap(), &[2, 1, 2, 2]);
        assert_eq!(am.get("CI").unwrap().as_slice::<f32>().unwrap(), &[0.4, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_apply_tuple_map() {
        let mut am = cell_matrix();
        am.apply_tuple_map(&[Some(1), Some(2), Some(3), None]).unwrap();
        assert_eq!(am.get("Phases").unwrap().as_slice::<i32>().unwrap(), &[1, 2, 2, 0]);
        assert!(am.apply_tuple_map(&[None]).is_err());
    }
}
