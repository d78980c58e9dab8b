// In: src/filters/segment_features.rs

//! EbsdSegmentFeatures: groups voxels into grains by misorientation.
//!
//! Writes an Int32 FeatureIds array into the cell matrix and creates a new
//! Feature matrix (one tuple per label, plus the unused label 0) holding the
//! Bool `Active` flags.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{AttributeMatrixType, DataArray, DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::{degrees_to_radians, require_mask, to_json, OrientationInputs};
use crate::grid::Connectivity;
use crate::kernels::segmentation::{
    randomize_labels, segment, GrowthReference, SegmentationParams, UndersizedPolicy,
};
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::DataType;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EbsdSegmentFeatures {
    #[serde(flatten)]
    pub orientations: OrientationInputs,
    /// Optional Bool good-voxel mask; masked voxels keep FeatureId 0.
    #[serde(default)]
    pub mask: Option<DataArrayPath>,
    /// Degrees.
    pub misorientation_tolerance: f64,
    pub connectivity: Connectivity,
    pub growth_reference: GrowthReference,
    pub min_feature_size: usize,
    pub undersized_policy: UndersizedPolicy,
    pub feature_ids_name: String,
    pub feature_matrix_name: String,
    pub active_name: String,
    /// Shuffles the labels deterministically when set.
    #[serde(default)]
    pub randomize_seed: Option<u64>,
}

impl EbsdSegmentFeatures {
    pub fn from_defaults(defaults: &FilterDefaults) -> Self {
        Self {
            orientations: OrientationInputs::default(),
            mask: None,
            misorientation_tolerance: defaults.misorientation_tolerance,
            connectivity: defaults.connectivity,
            growth_reference: defaults.growth_reference,
            min_feature_size: defaults.min_feature_size,
            undersized_policy: defaults.undersized_policy,
            feature_ids_name: "FeatureIds".to_string(),
            feature_matrix_name: "Grain Data".to_string(),
            active_name: "Active".to_string(),
            randomize_seed: None,
        }
    }

    pub fn feature_ids_path(&self) -> DataArrayPath {
        self.orientations.quats.with_array(self.feature_ids_name.clone())
    }

    pub fn feature_matrix_path(&self) -> DataArrayPath {
        DataArrayPath::matrix_path(self.orientations.quats.container(), self.feature_matrix_name.clone())
    }

    fn kernel_params(&self) -> Result<SegmentationParams, EbsdError> {
        Ok(SegmentationParams {
            tolerance: degrees_to_radians(self.misorientation_tolerance)?,
            connectivity: self.connectivity,
            reference: self.growth_reference,
            min_feature_size: self.min_feature_size,
            undersized: self.undersized_policy,
        })
    }

    fn validate(&self, dca: &DataContainerArray) -> Result<usize, EbsdError> {
        self.kernel_params()?;
        let grid = self.orientations.validate(dca)?;
        if let Some(mask) = &self.mask {
            require_mask(dca, mask, grid.len())?;
        }
        Ok(grid.len())
    }
}

impl Filter for EbsdSegmentFeatures {
    fn name(&self) -> &'static str {
        "ebsd_segment_features"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.validate(dca)?;
        dca.create_array(&self.feature_ids_path(), DataType::Int32, 1, false)?;
        // The feature count is only known after execution.
        let features = self.feature_matrix_path();
        dca.create_attribute_matrix(&features, AttributeMatrixType::Feature, vec![1], false)?;
        dca.create_array(&features.with_array(self.active_name.clone()), DataType::Bool, 1, false)?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.validate(dca)?;
        let params = self.kernel_params()?;
        let loaded = self.orientations.load(dca)?;
        let mask = match &self.mask {
            Some(path) => Some(dca.resolve::<bool>(path, 1)?.as_slice().to_vec()),
            None => None,
        };

        let mut segmentation = segment(&loaded.field(), mask.as_deref(), &params);
        if segmentation.seeds == 0 {
            return Err(EbsdError::AlgorithmicFailure(format!(
                "no eligible seed voxel found for {}",
                self.feature_ids_path()
            )));
        }
        if let Some(seed) = self.randomize_seed {
            randomize_labels(&mut segmentation, seed);
        }
        log::info!(
            "Segmented {} features ({} active)",
            segmentation.seeds,
            segmentation.active_count()
        );
        log_metric!("event" = "segment_features", "features" = &segmentation.seeds, "active" = &segmentation.active_count());

        let ids = DataArray::from_vec(self.feature_ids_name.clone(), segmentation.feature_ids, 1)?;
        dca.insert_array(&self.orientations.quats.to_matrix_path(), ids, false)?;

        let features = self.feature_matrix_path();
        dca.create_attribute_matrix(
            &features,
            AttributeMatrixType::Feature,
            vec![segmentation.seeds + 1],
            false,
        )?;
        let active = DataArray::from_vec(self.active_name.clone(), segmentation.active, 1)?;
        dca.insert_array(&features, active, false)?;
        Ok(FilterOutcome::ok())
    }
}
