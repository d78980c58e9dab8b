//! Structure-building filters: containers, attribute matrices and arrays.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{AttributeMatrixType, DataArrayPath, DataContainerArray, Geometry};
use crate::error::EbsdError;
use crate::filters::to_json;
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::DataType;

//==================================================================================
// 1. CreateDataContainer
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CreateDataContainer {
    pub name: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl CreateDataContainer {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self::default()
    }

    fn build(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let container = dca.create_container(&self.name, false)?;
        if let Some(geometry) = &self.geometry {
            container.set_geometry(geometry.clone())?;
        }
        Ok(FilterOutcome::ok())
    }
}

impl Filter for CreateDataContainer {
    fn name(&self) -> &'static str {
        "create_data_container"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.build(dca)
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        log::debug!("Creating data container '{}'", self.name);
        self.build(dca)
    }
}

//==================================================================================
// 2. CreateAttributeMatrix
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateAttributeMatrix {
    /// Container and matrix segments; the array segment is ignored.
    pub path: DataArrayPath,
    pub matrix_type: AttributeMatrixType,
    pub tuple_dims: Vec<usize>,
}

impl CreateAttributeMatrix {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self {
            path: DataArrayPath::unset(),
            matrix_type: AttributeMatrixType::Generic,
            tuple_dims: Vec::new(),
        }
    }

    fn build(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        if self.tuple_dims.is_empty() {
            return Err(EbsdError::InvalidParameter(format!(
                "attribute matrix {} needs at least one tuple dimension",
                self.path.to_matrix_path()
            )));
        }
        dca.create_attribute_matrix(&self.path, self.matrix_type, self.tuple_dims.clone(), false)?;
        Ok(FilterOutcome::ok())
    }
}

impl Filter for CreateAttributeMatrix {
    fn name(&self) -> &'static str {
        "create_attribute_matrix"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.build(dca)
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.build(dca)
    }
}

//==================================================================================
// 3. CreateDataArray
//==================================================================================

/// Creates an array in an existing matrix, filled with `initial_value`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateDataArray {
    pub path: DataArrayPath,
    pub data_type: DataType,
    pub components: usize,
    #[serde(default)]
    pub initial_value: f64,
}

impl CreateDataArray {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self {
            path: DataArrayPath::unset(),
            data_type: DataType::Float32,
            components: 1,
            initial_value: 0.0,
        }
    }
}

impl Filter for CreateDataArray {
    fn name(&self) -> &'static str {
        "create_data_array"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        dca.create_array(&self.path, self.data_type, self.components, false)?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let array = dca.create_array(&self.path, self.data_type, self.components, false)?;
        if self.initial_value != 0.0 {
            array.fill_f64(self.initial_value);
        }
        Ok(FilterOutcome::ok())
    }
}
