// In: src/pipeline/description.rs

//! JSON pipeline descriptions.
//!
//! A description is an ordered array of filter entries:
//!
//! ```json
//! [
//!   {"filter": "multi_threshold_objects", "params": {"terms": [...]}},
//!   {"filter": "ebsd_segment_features", "params": {"quats": {...}, "mask": {...}}}
//! ]
//! ```
//!
//! `params` may be partial. Each top-level key given replaces the field of the
//! same name in the filter's `from_defaults` parameters; keys left out keep
//! their default. Nested objects are replaced whole, not merged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::FilterDefaults;
use crate::error::EbsdError;
use crate::filters::{
    AdaptiveAlignmentMutualInformation, BadDataNeighborOrientationCheck, ConvertOrientations,
    CreateAttributeMatrix, CreateDataArray, CreateDataContainer, EbsdSegmentFeatures, ErodeDilateBadData,
    MultiThresholdObjects, NeighborOrientationCorrelation, WriteDataContainers,
};
use crate::pipeline::{Filter, Pipeline};

/// One filter of a description, tagged by its snake_case name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "filter", content = "params", rename_all = "snake_case")]
pub enum FilterConfig {
    CreateDataContainer(CreateDataContainer),
    CreateAttributeMatrix(CreateAttributeMatrix),
    CreateDataArray(CreateDataArray),
    ConvertOrientations(ConvertOrientations),
    MultiThresholdObjects(MultiThresholdObjects),
    BadDataNeighborOrientationCheck(BadDataNeighborOrientationCheck),
    NeighborOrientationCorrelation(NeighborOrientationCorrelation),
    EbsdSegmentFeatures(EbsdSegmentFeatures),
    ErodeDilateBadData(ErodeDilateBadData),
    AdaptiveAlignmentMutualInformation(AdaptiveAlignmentMutualInformation),
    WriteDataContainers(WriteDataContainers),
}

/// An entry before its parameters are merged onto the defaults.
#[derive(Deserialize, Debug)]
struct RawEntry {
    filter: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl FilterConfig {
    /// The default-parameter configuration of the filter called `name`.
    pub fn from_defaults(name: &str, defaults: &FilterDefaults) -> Result<Self, EbsdError> {
        let config = match name {
            "create_data_container" => Self::CreateDataContainer(CreateDataContainer::from_defaults(defaults)),
            "create_attribute_matrix" => Self::CreateAttributeMatrix(CreateAttributeMatrix::from_defaults(defaults)),
            "create_data_array" => Self::CreateDataArray(CreateDataArray::from_defaults(defaults)),
            "convert_orientations" => Self::ConvertOrientations(ConvertOrientations::from_defaults(defaults)),
            "multi_threshold_objects" => Self::MultiThresholdObjects(MultiThresholdObjects::from_defaults(defaults)),
            "bad_data_neighbor_orientation_check" => {
                Self::BadDataNeighborOrientationCheck(BadDataNeighborOrientationCheck::from_defaults(defaults))
            }
            "neighbor_orientation_correlation" => {
                Self::NeighborOrientationCorrelation(NeighborOrientationCorrelation::from_defaults(defaults))
            }
            "ebsd_segment_features" => Self::EbsdSegmentFeatures(EbsdSegmentFeatures::from_defaults(defaults)),
            "erode_dilate_bad_data" => Self::ErodeDilateBadData(ErodeDilateBadData::from_defaults(defaults)),
            "adaptive_alignment_mutual_information" => {
                Self::AdaptiveAlignmentMutualInformation(AdaptiveAlignmentMutualInformation::from_defaults(defaults))
            }
            "write_data_containers" => Self::WriteDataContainers(WriteDataContainers::from_defaults(defaults)),
            other => {
                return Err(EbsdError::InvalidParameter(format!(
                    "unknown filter '{other}'"
                )))
            }
        };
        Ok(config)
    }

    /// Parses a description, filling omitted parameters from `defaults`.
    pub fn parse_list(json: &str, defaults: &FilterDefaults) -> Result<Vec<Self>, EbsdError> {
        let entries: Vec<RawEntry> = serde_json::from_str(json)?;
        entries
            .into_iter()
            .map(|entry| Self::merge(entry, defaults))
            .collect()
    }

    fn merge(entry: RawEntry, defaults: &FilterDefaults) -> Result<Self, EbsdError> {
        let base = Self::from_defaults(&entry.filter, defaults)?;
        let mut value = serde_json::to_value(&base)?;
        if let Some(Value::Object(params)) = value.get_mut("params") {
            params.extend(entry.params);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_filter(self) -> Box<dyn Filter> {
        match self {
            Self::CreateDataContainer(f) => Box::new(f),
            Self::CreateAttributeMatrix(f) => Box::new(f),
            Self::CreateDataArray(f) => Box::new(f),
            Self::ConvertOrientations(f) => Box::new(f),
            Self::MultiThresholdObjects(f) => Box::new(f),
            Self::BadDataNeighborOrientationCheck(f) => Box::new(f),
            Self::NeighborOrientationCorrelation(f) => Box::new(f),
            Self::EbsdSegmentFeatures(f) => Box::new(f),
            Self::ErodeDilateBadData(f) => Box::new(f),
            Self::AdaptiveAlignmentMutualInformation(f) => Box::new(f),
            Self::WriteDataContainers(f) => Box::new(f),
        }
    }
}

impl Pipeline {
    /// Builds a pipeline from a JSON description using the built-in defaults.
    pub fn from_json(json: &str) -> Result<Self, EbsdError> {
        Self::from_json_with_defaults(json, &FilterDefaults::default())
    }

    pub fn from_json_with_defaults(json: &str, defaults: &FilterDefaults) -> Result<Self, EbsdError> {
        let mut pipeline = Self::new();
        for config in FilterConfig::parse_list(json, defaults)? {
            pipeline.push_boxed(config.into_filter());
        }
        log::debug!("Parsed pipeline description: {:?}", pipeline);
        Ok(pipeline)
    }
}
