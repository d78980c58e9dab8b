// In: src/filters/mod.rs

//! The concrete, path-addressed filters.
//!
//! Each filter is its own parameter struct: it derives serde so it can be
//! built from a pipeline description, offers `from_defaults(&FilterDefaults)`
//! with every path unset, and implements [`Filter`](crate::pipeline::Filter).
//! Filters resolve their inputs by path on every call, hand plain slices to
//! the kernels in `crate::kernels`, and write results back into the store.

pub mod alignment;
pub mod bad_data;
pub mod convert_orientations;
pub mod correlation;
pub mod create;
pub mod erode_dilate;
pub mod segment_features;
pub mod threshold;
pub mod write;

pub use alignment::{AdaptiveAlignmentMutualInformation, AlignmentSignal};
pub use bad_data::BadDataNeighborOrientationCheck;
pub use convert_orientations::ConvertOrientations;
pub use correlation::NeighborOrientationCorrelation;
pub use create::{CreateAttributeMatrix, CreateDataArray, CreateDataContainer};
pub use erode_dilate::ErodeDilateBadData;
pub use segment_features::EbsdSegmentFeatures;
pub use threshold::{MultiThresholdObjects, ThresholdTerm};
pub use write::WriteDataContainers;

use serde::{Deserialize, Serialize};

use crate::data_store::{DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::grid::VoxelGrid;
use crate::kernels::field::{OrientationField, TupleCopy};
use crate::orientation::PhaseSymmetry;
use crate::types::DataType;

//==================================================================================
// 1. Orientation Inputs
//==================================================================================

/// The three arrays every orientation-aware filter reads: `(x, y, z, w)`
/// quaternions and Int32 phases in the cell matrix, and the UInt32
/// "CrystalStructures" array of the ensemble matrix.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OrientationInputs {
    pub quats: DataArrayPath,
    pub phases: DataArrayPath,
    pub crystal_structures: DataArrayPath,
}

impl OrientationInputs {
    /// Checks types, shapes and the image geometry. Returns the cell grid.
    pub fn validate(&self, dca: &DataContainerArray) -> Result<VoxelGrid, EbsdError> {
        dca.require(&self.quats, DataType::Float32, 4)?;
        dca.require(&self.phases, DataType::Int32, 1)?;
        dca.require(&self.crystal_structures, DataType::UInt32, 1)?;
        if !self.quats.same_matrix(&self.phases) {
            return Err(EbsdError::InvalidParameter(format!(
                "quaternions {} and phases {} must live in the same attribute matrix",
                self.quats, self.phases
            )));
        }
        cell_grid(dca, &self.quats)
    }

    /// Copies the orientation state out of the store.
    pub fn load(&self, dca: &DataContainerArray) -> Result<LoadedOrientations, EbsdError> {
        let grid = self.validate(dca)?;
        let quats = dca.resolve::<f32>(&self.quats, 4)?.as_slice().to_vec();
        let phases = dca.resolve::<i32>(&self.phases, 1)?.as_slice().to_vec();
        let symmetry =
            PhaseSymmetry::from_structure_ids(dca.resolve::<u32>(&self.crystal_structures, 1)?.as_slice());
        Ok(LoadedOrientations {
            grid,
            quats,
            phases,
            symmetry,
        })
    }
}

/// Owned copies of the orientation arrays, from which a kernel field is built.
#[derive(Debug, Clone)]
pub struct LoadedOrientations {
    pub grid: VoxelGrid,
    pub quats: Vec<f32>,
    pub phases: Vec<i32>,
    pub symmetry: PhaseSymmetry,
}

impl LoadedOrientations {
    pub fn field(&self) -> OrientationField<'_> {
        OrientationField::from_arrays(self.grid, &self.quats, &self.phases, &self.symmetry)
    }
}

//==================================================================================
// 2. Shared Checks & Writes
//==================================================================================

/// The voxel grid of the container `path` lives in, after checking that the
/// addressed matrix is a full cell matrix of that grid.
pub fn cell_grid(dca: &DataContainerArray, path: &DataArrayPath) -> Result<VoxelGrid, EbsdError> {
    let geometry = dca.image_geometry(path)?;
    let matrix = dca.get_matrix(path)?;
    if matrix.tuple_count() != geometry.voxel_count() {
        return Err(EbsdError::TupleCountMismatch {
            path: path.to_matrix_path().to_string(),
            expected: geometry.voxel_count(),
            found: matrix.tuple_count(),
        });
    }
    Ok(geometry.grid())
}

/// An optional Bool mask that must match `expected` tuples.
pub fn require_mask(
    dca: &DataContainerArray,
    path: &DataArrayPath,
    expected: usize,
) -> Result<(), EbsdError> {
    let mask = dca.require(path, DataType::Bool, 1)?;
    if mask.tuple_count() != expected {
        return Err(EbsdError::TupleCountMismatch {
            path: path.to_string(),
            expected,
            found: mask.tuple_count(),
        });
    }
    Ok(())
}

/// Replays kernel tuple copies, in order, over every array of the matrix
/// that `path` addresses.
pub fn replay_copies(
    dca: &mut DataContainerArray,
    path: &DataArrayPath,
    copies: &[TupleCopy],
) -> Result<(), EbsdError> {
    let matrix = dca.get_matrix_mut(path)?;
    for copy in copies {
        matrix.copy_tuple(copy.src, copy.dst);
    }
    Ok(())
}

pub(crate) fn to_json<T: Serialize>(params: &T) -> serde_json::Value {
    serde_json::to_value(params).unwrap_or(serde_json::Value::Null)
}

pub(crate) fn degrees_to_radians(degrees: f64) -> Result<f64, EbsdError> {
    if !degrees.is_finite() || degrees < 0.0 {
        return Err(EbsdError::InvalidParameter(format!(
            "misorientation tolerance must be a non-negative angle, got {degrees}"
        )));
    }
    Ok(degrees.to_radians())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A small scan shared by the filter tests.

    use crate::data_store::{
        AttributeMatrixType, DataArray, DataArrayPath, DataContainerArray, Geometry, ImageGeometry,
    };
    use crate::filters::OrientationInputs;
    use crate::orientation::{CrystalStructure, Quat};

    pub const CONTAINER: &str = "Scan";
    pub const CELLS: &str = "CellData";
    pub const ENSEMBLE: &str = "EnsembleData";

    pub fn cell(name: &str) -> DataArrayPath {
        DataArrayPath::new(CONTAINER, CELLS, name)
    }

    pub fn inputs() -> OrientationInputs {
        OrientationInputs {
            quats: cell("Quats"),
            phases: cell("Phases"),
            crystal_structures: DataArrayPath::new(CONTAINER, ENSEMBLE, "CrystalStructures"),
        }
    }

    /// Quaternion rotated `degrees` about z.
    pub fn about_z(degrees: f64) -> Quat {
        Quat::from_axis_angle([0.0, 0.0, 1.0], degrees.to_radians())
    }

    /// A scan of `dims` with cubic phase 1 everywhere, the given orientations
    /// and a Float32 "Confidence" array.
    pub fn scan(dims: [usize; 3], orientations: &[Quat], confidence: &[f32]) -> DataContainerArray {
        let n: usize = dims.iter().product();
        assert_eq!(orientations.len(), n);
        assert_eq!(confidence.len(), n);

        let mut dca = DataContainerArray::new();
        dca.create_container(CONTAINER, false).unwrap();
        dca.set_geometry(CONTAINER, Geometry::Image(ImageGeometry::new(dims)))
            .unwrap();
        let cells = DataArrayPath::matrix_path(CONTAINER, CELLS);
        dca.create_attribute_matrix(&cells, AttributeMatrixType::Cell, dims.to_vec(), false)
            .unwrap();
        let ensemble = DataArrayPath::matrix_path(CONTAINER, ENSEMBLE);
        dca.create_attribute_matrix(&ensemble, AttributeMatrixType::Ensemble, vec![2], false)
            .unwrap();

        let mut quats = vec![0f32; n * 4];
        for (q, tuple) in orientations.iter().zip(quats.chunks_exact_mut(4)) {
            q.write_xyzw(tuple);
        }
        dca.insert_array(&cells, DataArray::from_vec("Quats", quats, 4).unwrap(), false)
            .unwrap();
        dca.insert_array(&cells, DataArray::from_vec("Phases", vec![1i32; n], 1).unwrap(), false)
            .unwrap();
        dca.insert_array(
            &cells,
            DataArray::from_vec("Confidence", confidence.to_vec(), 1).unwrap(),
            false,
        )
        .unwrap();
        dca.insert_array(
            &ensemble,
            DataArray::from_vec(
                "CrystalStructures",
                vec![CrystalStructure::Unknown.id(), CrystalStructure::CubicHigh.id()],
                1,
            )
            .unwrap(),
            false,
        )
        .unwrap();
        dca
    }
}
