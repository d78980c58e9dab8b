//! ErodeDilateBadData: grows or shrinks the FeatureId 0 region along the
//! enabled axes, carrying every cell array along.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::{cell_grid, replay_copies, to_json};
use crate::kernels::morphology::{erode_dilate, MorphologyOp};
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::DataType;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErodeDilateBadData {
    pub feature_ids: DataArrayPath,
    pub operation: MorphologyOp,
    pub iterations: usize,
    pub x_dir: bool,
    pub y_dir: bool,
    pub z_dir: bool,
}

impl ErodeDilateBadData {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self {
            feature_ids: DataArrayPath::unset(),
            operation: MorphologyOp::Dilate,
            iterations: 1,
            x_dir: true,
            y_dir: true,
            z_dir: true,
        }
    }

    fn validate(&self, dca: &DataContainerArray) -> Result<(), EbsdError> {
        if self.iterations == 0 {
            return Err(EbsdError::InvalidParameter(
                "iterations must be at least 1".to_string(),
            ));
        }
        dca.require(&self.feature_ids, DataType::Int32, 1)?;
        cell_grid(dca, &self.feature_ids)?;
        Ok(())
    }
}

impl Filter for ErodeDilateBadData {
    fn name(&self) -> &'static str {
        "erode_dilate_bad_data"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.validate(dca)?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.validate(dca)?;
        let grid = cell_grid(dca, &self.feature_ids)?;
        let mut ids = dca.resolve::<i32>(&self.feature_ids, 1)?.as_slice().to_vec();
        let copies = erode_dilate(
            grid,
            &mut ids,
            self.operation,
            self.iterations,
            [self.x_dir, self.y_dir, self.z_dir],
        );
        replay_copies(dca, &self.feature_ids, &copies)?;
        log::info!("{:?} changed {} voxels", self.operation, copies.len());
        Ok(FilterOutcome::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::DataArray;
    use crate::filters::test_support::{cell, scan, CELLS, CONTAINER};
    use crate::orientation::Quat;

    fn store(ids: Vec<i32>) -> DataContainerArray {
        let n = ids.len();
        let confidence: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let mut dca = scan([n, 1, 1], &vec![Quat::IDENTITY; n], &confidence);
        dca.insert_array(
            &DataArrayPath::matrix_path(CONTAINER, CELLS),
            DataArray::from_vec("FeatureIds", ids, 1).unwrap(),
            false,
        )
        .unwrap();
        dca
    }

    fn filter(operation: MorphologyOp, iterations: usize) -> ErodeDilateBadData {
        ErodeDilateBadData {
            feature_ids: cell("FeatureIds"),
            operation,
            iterations,
            ..ErodeDilateBadData::from_defaults(&FilterDefaults::default())
        }
    }

    #[test]
    fn test_dilate_fills_the_gap_and_carries_arrays() {
        let mut dca = store(vec![3, 0, 0, 5]);
        filter(MorphologyOp::Dilate, 1).execute(&mut dca).unwrap();
        let ids = dca.resolve::<i32>(&cell("FeatureIds"), 1).unwrap();
        assert_eq!(ids.as_slice(), &[3, 3, 5, 5]);
        let confidence = dca.resolve::<f32>(&cell("Confidence"), 1).unwrap();
        assert_eq!(confidence.as_slice(), &[0.0, 0.0, 3.0, 3.0]);
    }

    #[test]
    fn test_erode_grows_the_bad_region() {
        let mut dca = store(vec![1, 1, 0, 1, 1]);
        filter(MorphologyOp::Erode, 1).execute(&mut dca).unwrap();
        let ids = dca.resolve::<i32>(&cell("FeatureIds"), 1).unwrap();
        assert_eq!(ids.as_slice(), &[1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_zero_iterations_is_rejected() {
        let dca = store(vec![1, 0]);
        assert!(filter(MorphologyOp::Dilate, 0).preflight(&mut dca.to_proxy()).is_err());
    }
}
