// In: src/data_store/container_array.rs

//! The root of the data hierarchy.
//!
//! A `DataContainerArray` is constructed explicitly and handed to each filter by
//! `&mut` reference. It can be in one of two modes:
//!
//! * `Allocated`: every array owns a real buffer.
//! * `Proxy`: arrays carry name, type and shape only. Preflight runs against a
//!   proxy built with [`DataContainerArray::to_proxy`], so it can declare outputs
//!   without allocating or touching real data.

use crate::data_store::{
    AttributeMatrix, AttributeMatrixType, DataArray, DataArrayPath, DataContainer, Geometry,
    ImageGeometry,
};
use crate::error::EbsdError;
use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Allocated,
    Proxy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataContainerArray {
    mode: StoreMode,
    containers: Vec<DataContainer>,
}

impl Default for DataContainerArray {
    fn default() -> Self {
        Self::new()
    }
}

impl DataContainerArray {
    pub fn new() -> Self {
        Self {
            mode: StoreMode::Allocated,
            containers: Vec::new(),
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn is_proxy(&self) -> bool {
        self.mode == StoreMode::Proxy
    }

    /// A structure-only copy of this store.
    pub fn to_proxy(&self) -> Self {
        Self {
            mode: StoreMode::Proxy,
            containers: self.containers.iter().map(DataContainer::to_declared).collect(),
        }
    }

    //==============================================================================
    // Containers
    //==============================================================================

    pub fn containers(&self) -> impl Iterator<Item = &DataContainer> {
        self.containers.iter()
    }

    pub fn container_names(&self) -> Vec<&str> {
        self.containers.iter().map(|c| c.name()).collect()
    }

    pub fn create_container(
        &mut self,
        name: &str,
        overwrite: bool,
    ) -> Result<&mut DataContainer, EbsdError> {
        if name.is_empty() {
            return Err(EbsdError::InvalidParameter(
                "data container name must not be empty".to_string(),
            ));
        }
        let index = match self.containers.iter().position(|c| c.name() == name) {
            Some(_) if !overwrite => {
                return Err(EbsdError::DuplicateName(format!(
                    "data container '{name}' already exists"
                )))
            }
            Some(index) => {
                self.containers[index] = DataContainer::new(name);
                index
            }
            None => {
                self.containers.push(DataContainer::new(name));
                self.containers.len() - 1
            }
        };
        Ok(&mut self.containers[index])
    }

    pub fn container(&self, name: &str) -> Result<&DataContainer, EbsdError> {
        self.containers
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| EbsdError::PathNotFound(format!("data container '{name}' does not exist")))
    }

    pub fn container_mut(&mut self, name: &str) -> Result<&mut DataContainer, EbsdError> {
        self.containers
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| EbsdError::PathNotFound(format!("data container '{name}' does not exist")))
    }

    pub fn remove_container(&mut self, name: &str) -> Result<DataContainer, EbsdError> {
        let index = self
            .containers
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| EbsdError::PathNotFound(format!("data container '{name}' does not exist")))?;
        Ok(self.containers.remove(index))
    }

    pub fn set_geometry(&mut self, container: &str, geometry: Geometry) -> Result<(), EbsdError> {
        self.container_mut(container)?.set_geometry(geometry)
    }

    /// The image geometry of the container named in `path`.
    pub fn image_geometry(&self, path: &DataArrayPath) -> Result<&ImageGeometry, EbsdError> {
        self.container(path.require_container()?)?.image_geometry()
    }

    //==============================================================================
    // Attribute matrices
    //==============================================================================

    /// Creates the matrix addressed by `path` (container + matrix segments).
    pub fn create_attribute_matrix(
        &mut self,
        path: &DataArrayPath,
        matrix_type: AttributeMatrixType,
        tuple_dims: Vec<usize>,
        overwrite: bool,
    ) -> Result<&mut AttributeMatrix, EbsdError> {
        let (container, matrix) = path.require_matrix()?;
        let dc = self.container_mut(container)?;
        dc.add_matrix(AttributeMatrix::new(matrix, matrix_type, tuple_dims), overwrite)?;
        dc.get_matrix_mut(matrix)
            .ok_or_else(|| EbsdError::PathNotFound(path.to_string()))
    }

    pub fn get_matrix(&self, path: &DataArrayPath) -> Result<&AttributeMatrix, EbsdError> {
        let (container, matrix) = path.require_matrix()?;
        self.container(container)?.get_matrix(matrix).ok_or_else(|| {
            EbsdError::PathNotFound(format!(
                "{path}: attribute matrix '{matrix}' does not exist"
            ))
        })
    }

    pub fn get_matrix_mut(&mut self, path: &DataArrayPath) -> Result<&mut AttributeMatrix, EbsdError> {
        let (container, matrix) = path.require_matrix()?;
        let display = path.to_string();
        self.container_mut(container)?
            .get_matrix_mut(matrix)
            .ok_or_else(|| {
                EbsdError::PathNotFound(format!(
                    "{display}: attribute matrix '{matrix}' does not exist"
                ))
            })
    }

    pub fn remove_attribute_matrix(&mut self, path: &DataArrayPath) -> Result<AttributeMatrix, EbsdError> {
        let (container, matrix) = path.require_matrix()?;
        self.container_mut(container)?
            .remove_matrix(matrix)
            .ok_or_else(|| EbsdError::PathNotFound(path.to_string()))
    }

    //==============================================================================
    // Arrays
    //==============================================================================

    /// Creates a zero-filled array (a declared one in proxy mode) sized to the
    /// target matrix's tuple count.
    pub fn create_array(
        &mut self,
        path: &DataArrayPath,
        data_type: DataType,
        components: usize,
        overwrite: bool,
    ) -> Result<&mut DataArray, EbsdError> {
        let (_, _, name) = path.require_array()?;
        let proxy = self.is_proxy();
        let matrix = self.get_matrix_mut(path)?;
        let tuples = matrix.tuple_count();
        let array = if proxy {
            DataArray::declared(name, data_type, tuples, components)?
        } else {
            DataArray::zeros(name, data_type, tuples, components)?
        };
        matrix.insert_array(array, overwrite)?;
        matrix
            .get_mut(name)
            .ok_or_else(|| EbsdError::PathNotFound(path.to_string()))
    }

    /// Inserts a filled array into the matrix addressed by `matrix_path`. In
    /// proxy mode only its structure is kept.
    pub fn insert_array(
        &mut self,
        matrix_path: &DataArrayPath,
        array: DataArray,
        overwrite: bool,
    ) -> Result<(), EbsdError> {
        let array = if self.is_proxy() { array.to_declared() } else { array };
        self.get_matrix_mut(matrix_path)?.insert_array(array, overwrite)
    }

    pub fn contains_array(&self, path: &DataArrayPath) -> bool {
        self.get_array(path).is_ok()
    }

    pub fn get_array(&self, path: &DataArrayPath) -> Result<&DataArray, EbsdError> {
        let (_, _, name) = path.require_array()?;
        self.get_matrix(path)?
            .get(name)
            .ok_or_else(|| EbsdError::PathNotFound(format!("{path}: array '{name}' does not exist")))
    }

    pub fn get_array_mut(&mut self, path: &DataArrayPath) -> Result<&mut DataArray, EbsdError> {
        let display = path.to_string();
        let (_, _, name) = path.require_array()?;
        self.get_matrix_mut(path)?
            .get_mut(name)
            .ok_or_else(|| EbsdError::PathNotFound(format!("{display}: array '{name}' does not exist")))
    }

    pub fn remove_array(&mut self, path: &DataArrayPath) -> Result<DataArray, EbsdError> {
        let display = path.to_string();
        let (_, _, name) = path.require_array()?;
        self.get_matrix_mut(path)?
            .remove_array(name)
            .ok_or_else(|| EbsdError::PathNotFound(display))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        dca.create_container("Scan", false).unwrap();
        dca.set_geometry("Scan", Geometry::Image(ImageGeometry::new([2, 2, 1])))
            .unwrap();
        dca.create_attribute_matrix(
            &DataArrayPath::matrix_path("Scan", "Cells"),
            AttributeMatrixType::Cell,
            vec![2, 2, 1],
            false,
        )
        .unwrap();
        dca
    }

    #[test]
    fn test_create_and_lookup() {
        let mut dca = store();
        let path = DataArrayPath::new("Scan", "Cells", "CI");
        let array = dca.create_array(&path, DataType::Float32, 1, false).unwrap();
        array.as_mut_slice::<f32>().unwrap()[2] = 0.5;
        assert_eq!(dca.get_array(&path).unwrap().value_f64(2).unwrap(), 0.5);
        assert!(matches!(
            dca.create_array(&path, DataType::Float32, 1, false),
            Err(EbsdError::DuplicateName(_))
        ));
        assert!(matches!(
            dca.create_container("Scan", false),
            Err(EbsdError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_missing_segments_are_path_not_found() {
        let dca = store();
        for path in [
            DataArrayPath::new("Nope", "Cells", "CI"),
            DataArrayPath::new("Scan", "Nope", "CI"),
            DataArrayPath::new("Scan", "Cells", "Nope"),
            DataArrayPath::new("Scan", "Cells", ""),
        ] {
            assert!(matches!(dca.get_array(&path), Err(EbsdError::PathNotFound(_))));
        }
    }

    #[test]
    fn test_proxy_declares_without_allocating() {
        let mut dca = store();
        let path = DataArrayPath::new("Scan", "Cells", "Mask");
        dca.create_array(&path, DataType::Bool, 1, false).unwrap();

        let mut proxy = dca.to_proxy();
        assert!(proxy.is_proxy());
        assert!(!proxy.get_array(&path).unwrap().is_allocated());

        let new_path = DataArrayPath::new("Scan", "Cells", "Ids");
        proxy.create_array(&new_path, DataType::Int32, 1, false).unwrap();
        assert!(proxy.contains_array(&new_path));
        assert!(!dca.contains_array(&new_path));
    }

    #[test]
    fn test_remove() {
        let mut dca = store();
        let path = DataArrayPath::new("Scan", "Cells", "CI");
        dca.create_array(&path, DataType::Float32, 1, false).unwrap();
        dca.remove_array(&path).unwrap();
        assert!(!dca.contains_array(&path));
        dca.remove_attribute_matrix(&path.to_matrix_path()).unwrap();
        assert!(dca.get_matrix(&path).is_err());
        dca.remove_container("Scan").unwrap();
        assert!(dca.container_names().is_empty());
    }
}
