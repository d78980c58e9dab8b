//! `DataContainer`: a named geometry plus the attribute matrices attached to it.

use crate::data_store::geometry::TupleConstraint;
use crate::data_store::{AttributeMatrix, Geometry, ImageGeometry};
use crate::error::EbsdError;

#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer {
    name: String,
    geometry: Option<Geometry>,
    matrices: Vec<AttributeMatrix>,
}

impl DataContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            matrices: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// The container's image geometry, or `MissingGeometry`.
    pub fn image_geometry(&self) -> Result<&ImageGeometry, EbsdError> {
        self.geometry
            .as_ref()
            .and_then(Geometry::as_image)
            .ok_or_else(|| {
                EbsdError::MissingGeometry(format!(
                    "data container '{}' has no image geometry",
                    self.name
                ))
            })
    }

    /// Attaches `geometry`, checking it against every matrix already present.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<(), EbsdError> {
        for matrix in &self.matrices {
            check_against_geometry(&self.name, &geometry, matrix)?;
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    pub fn matrices(&self) -> impl Iterator<Item = &AttributeMatrix> {
        self.matrices.iter()
    }

    pub fn matrices_mut(&mut self) -> impl Iterator<Item = &mut AttributeMatrix> {
        self.matrices.iter_mut()
    }

    pub fn get_matrix(&self, name: &str) -> Option<&AttributeMatrix> {
        self.matrices.iter().find(|m| m.name() == name)
    }

    pub fn get_matrix_mut(&mut self, name: &str) -> Option<&mut AttributeMatrix> {
        self.matrices.iter_mut().find(|m| m.name() == name)
    }

    pub fn add_matrix(&mut self, matrix: AttributeMatrix, overwrite: bool) -> Result<(), EbsdError> {
        if let Some(geometry) = &self.geometry {
            check_against_geometry(&self.name, geometry, &matrix)?;
        }
        match self.matrices.iter().position(|m| m.name() == matrix.name()) {
            Some(_) if !overwrite => Err(EbsdError::DuplicateName(format!(
                "attribute matrix '{}' already exists in data container '{}'",
                matrix.name(),
                self.name
            ))),
            Some(index) => {
                self.matrices[index] = matrix;
                Ok(())
            }
            None => {
                self.matrices.push(matrix);
                Ok(())
            }
        }
    }

    pub fn remove_matrix(&mut self, name: &str) -> Option<AttributeMatrix> {
        let index = self.matrices.iter().position(|m| m.name() == name)?;
        Some(self.matrices.remove(index))
    }

    pub(crate) fn to_declared(&self) -> Self {
        Self {
            name: self.name.clone(),
            geometry: self.geometry.clone(),
            matrices: self.matrices.iter().map(AttributeMatrix::to_declared).collect(),
        }
    }
}

fn check_against_geometry(
    container: &str,
    geometry: &Geometry,
    matrix: &AttributeMatrix,
) -> Result<(), EbsdError> {
    match geometry.tuple_constraint(matrix.matrix_type()) {
        TupleConstraint::Exactly(expected) if expected != matrix.tuple_count() => {
            Err(EbsdError::TupleCountMismatch {
                path: format!("{}/{}", container, matrix.name()),
                expected,
                found: matrix.tuple_count(),
            })
        }
        TupleConstraint::Incompatible => Err(EbsdError::MissingGeometry(format!(
            "{container}: a {:?} matrix '{}' cannot attach to a {} geometry",
            matrix.matrix_type(),
            matrix.name(),
            geometry.kind()
        ))),
        _ => Ok(()),
    }
}
