//! Geometries describe the topology an attribute matrix's tuples live on.

use serde::{Deserialize, Serialize};

use crate::data_store::AttributeMatrixType;
use crate::grid::VoxelGrid;

/// A regular voxel grid: `dims = [x, y, z]` with x varying fastest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub dims: [usize; 3],
    #[serde(default = "default_spacing")]
    pub spacing: [f32; 3],
    #[serde(default)]
    pub origin: [f32; 3],
}

fn default_spacing() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl ImageGeometry {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            spacing: default_spacing(),
            origin: [0.0; 3],
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn grid(&self) -> VoxelGrid {
        VoxelGrid::new(self.dims)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Image(ImageGeometry),
    /// A shared vertex list.
    Vertex { vertex_count: usize },
    /// A shared vertex list plus a quad connectivity list.
    Quad { vertex_count: usize, quad_count: usize },
}

impl Geometry {
    pub fn as_image(&self) -> Option<&ImageGeometry> {
        match self {
            Geometry::Image(image) => Some(image),
            _ => None,
        }
    }

    /// How this geometry constrains a matrix of `matrix_type` attached to it.
    pub fn tuple_constraint(&self, matrix_type: AttributeMatrixType) -> TupleConstraint {
        use AttributeMatrixType as M;
        match (self, matrix_type) {
            (_, M::Feature | M::Ensemble | M::Generic) => TupleConstraint::Any,
            (Geometry::Image(image), M::Cell) => TupleConstraint::Exactly(image.voxel_count()),
            (Geometry::Vertex { vertex_count }, M::Vertex) => TupleConstraint::Exactly(*vertex_count),
            (Geometry::Quad { vertex_count, .. }, M::Vertex) => TupleConstraint::Exactly(*vertex_count),
            (Geometry::Quad { quad_count, .. }, M::Face) => TupleConstraint::Exactly(*quad_count),
            _ => TupleConstraint::Incompatible,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Image(_) => "image",
            Geometry::Vertex { .. } => "vertex",
            Geometry::Quad { .. } => "quad",
        }
    }
}

/// What a geometry demands of an attached matrix's tuple count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleConstraint {
    Exactly(usize),
    /// Feature, Ensemble and Generic matrices may hold any number of tuples.
    Any,
    /// The matrix type cannot live on this geometry at all.
    Incompatible,
}
