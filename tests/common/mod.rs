//! Store fixtures shared by the integration tests.

#![allow(dead_code)]

use ebsd_pipeline::data_store::{
    AttributeMatrixType, DataArray, DataArrayPath, DataContainerArray, Geometry, ImageGeometry,
};
use ebsd_pipeline::filters::OrientationInputs;
use ebsd_pipeline::orientation::{CrystalStructure, Quat};

pub const CONTAINER: &str = "Small IN100";
pub const CELLS: &str = "EBSD Scan Data";
pub const ENSEMBLE: &str = "Phase Data";

pub fn cell(name: &str) -> DataArrayPath {
    DataArrayPath::new(CONTAINER, CELLS, name)
}

pub fn cells() -> DataArrayPath {
    DataArrayPath::matrix_path(CONTAINER, CELLS)
}

pub fn orientation_inputs() -> OrientationInputs {
    OrientationInputs {
        quats: cell("Quats"),
        phases: cell("Phases"),
        crystal_structures: DataArrayPath::new(CONTAINER, ENSEMBLE, "CrystalStructures"),
    }
}

/// A single-phase cubic scan with every voxel at the identity orientation and
/// the given Float32 "Confidence" values.
pub fn cubic_scan(dims: [usize; 3], confidence: &[f32]) -> DataContainerArray {
    let n: usize = dims.iter().product();
    assert_eq!(confidence.len(), n);

    let mut dca = DataContainerArray::new();
    dca.create_container(CONTAINER, false).unwrap();
    dca.set_geometry(CONTAINER, Geometry::Image(ImageGeometry::new(dims)))
        .unwrap();
    dca.create_attribute_matrix(&cells(), AttributeMatrixType::Cell, dims.to_vec(), false)
        .unwrap();
    let ensemble = DataArrayPath::matrix_path(CONTAINER, ENSEMBLE);
    dca.create_attribute_matrix(&ensemble, AttributeMatrixType::Ensemble, vec![2], false)
        .unwrap();

    let mut quats = vec![0f32; n * 4];
    for tuple in quats.chunks_exact_mut(4) {
        Quat::IDENTITY.write_xyzw(tuple);
    }
    dca.insert_array(&cells(), DataArray::from_vec("Quats", quats, 4).unwrap(), false)
        .unwrap();
    dca.insert_array(&cells(), DataArray::from_vec("Phases", vec![1i32; n], 1).unwrap(), false)
        .unwrap();
    dca.insert_array(
        &cells(),
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
