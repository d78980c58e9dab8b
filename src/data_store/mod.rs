// In: src/data_store/mod.rs

//! The hierarchical, addressable data store:
//! `DataContainerArray → DataContainer → AttributeMatrix → DataArray`.

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod array;
pub mod attribute_matrix;
pub mod container;
pub mod container_array;
pub mod geometry;
pub mod path;
pub mod resolver;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use array::DataArray;
pub use attribute_matrix::{AttributeMatrix, AttributeMatrixType};
pub use container::DataContainer;
pub use container_array::{DataContainerArray, StoreMode};
pub use geometry::{Geometry, ImageGeometry};
pub use path::DataArrayPath;
pub use resolver::{ArrayView, ArrayViewMut};
