//! NeighborOrientationCorrelation: replaces low-confidence voxels with the
//! orientation their neighbors most agree on.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::{degrees_to_radians, replay_copies, to_json, OrientationInputs};
use crate::grid::{shell_offsets, Connectivity};
use crate::kernels::correlation::{correlate, CorrelationParams};
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::DataType;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NeighborOrientationCorrelation {
    #[serde(flatten)]
    pub orientations: OrientationInputs,
    /// Float32 cell array, e.g. the confidence index.
    pub confidence: DataArrayPath,
    pub min_confidence: f32,
    /// Degrees.
    pub misorientation_tolerance: f64,
    /// Neighbors (the candidate included) that must agree.
    pub min_agreement: usize,
    pub connectivity: Connectivity,
    pub max_iterations: usize,
}

impl NeighborOrientationCorrelation {
    pub fn from_defaults(defaults: &FilterDefaults) -> Self {
        Self {
            orientations: OrientationInputs::default(),
            confidence: DataArrayPath::unset(),
            min_confidence: defaults.min_confidence,
            misorientation_tolerance: defaults.misorientation_tolerance,
            min_agreement: defaults.min_agreement,
            connectivity: defaults.connectivity,
            max_iterations: defaults.max_iterations,
        }
    }

    fn kernel_params(&self) -> Result<CorrelationParams, EbsdError> {
        if self.max_iterations == 0 {
            return Err(EbsdError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(CorrelationParams {
            min_confidence: self.min_confidence,
            tolerance: degrees_to_radians(self.misorientation_tolerance)?,
            min_agreement: self.min_agreement,
            max_iterations: self.max_iterations,
        })
    }

    fn validate(&self, dca: &DataContainerArray) -> Result<(), EbsdError> {
        self.kernel_params()?;
        self.orientations.validate(dca)?;
        dca.require(&self.confidence, DataType::Float32, 1)?;
        if !self.confidence.same_matrix(&self.orientations.quats) {
            return Err(EbsdError::InvalidParameter(format!(
                "{} must be in the same attribute matrix as {}",
                self.confidence, self.orientations.quats
            )));
        }
        Ok(())
    }
}

impl Filter for NeighborOrientationCorrelation {
    fn name(&self) -> &'static str {
        "neighbor_orientation_correlation"
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
        let params = self.kernel_params()?;
        let loaded = self.orientations.load(dca)?;
        let mut confidence = dca.resolve::<f32>(&self.confidence, 1)?.as_slice().to_vec();

        let mut field = loaded.field();
        let offsets = shell_offsets(1, self.connectivity);
        let report = correlate(&mut field, &mut confidence, &offsets, &params);

        // The confidence array lives in the cell matrix, so the replay updates it too.
        replay_copies(dca, &self.orientations.quats, &report.copies)?;

        log::info!(
            "Orientation correlation replaced {} voxels in {} iterations",
            report.copies.len(),
            report.iterations
        );
        log_metric!("event" = "orientation_correlation", "replaced" = &report.copies.len(), "iterations" = &report.iterations);

        if report.converged {
            Ok(FilterOutcome::ok())
        } else {
            Ok(FilterOutcome::with_warning(EbsdError::ConvergenceFailure {
                iterations: report.iterations,
                message: "low-confidence voxels were still being replaced".to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CODE_INVALID_PARAMETER;
    use crate::filters::test_support::{about_z, cell, inputs, scan};
    use crate::orientation::Quat;

    fn filter() -> NeighborOrientationCorrelation {
        NeighborOrientationCorrelation {
            orientations: inputs(),
            confidence: cell("Confidence"),
            ..NeighborOrientationCorrelation::from_defaults(&FilterDefaults::default())
        }
    }

    #[test]
    fn test_noisy_centre_takes_the_neighborhood_orientation() {
        let mut orientations = vec![Quat::IDENTITY; 9];
        orientations[4] = about_z(30.0);
        let mut confidence = vec![0.9f32; 9];
        confidence[4] = 0.02;
        let mut dca = scan([3, 3, 1], &orientations, &confidence);

        let outcome = filter().execute(&mut dca).unwrap();
        assert_eq!(outcome, FilterOutcome::ok());

        let quats = dca.resolve::<f32>(&cell("Quats"), 4).unwrap();
        assert!(Quat::from_xyzw(quats.tuple(4)).same_rotation(&Quat::IDENTITY, 1e-6));
        let confidence = dca.resolve::<f32>(&cell("Confidence"), 1).unwrap();
        assert_eq!(confidence.as_slice()[4], 0.9);
    }

    #[test]
    fn test_is_a_fixed_point_on_clean_data() {
        let mut dca = scan([3, 3, 1], &[Quat::IDENTITY; 9], &[0.9; 9]);
        let before = dca.clone();
        filter().execute(&mut dca).unwrap();
        assert_eq!(dca, before);
    }

    #[test]
    fn test_confidence_must_share_the_cell_matrix() {
        let mut dca = scan([2, 1, 1], &[Quat::IDENTITY; 2], &[0.9; 2]);
        let mut f = filter();
        f.confidence = DataArrayPath::new("Scan", "EnsembleData", "Confidence");
        dca.create_array(&f.confidence, DataType::Float32, 1, false).unwrap();
        assert_eq!(f.preflight(&mut dca.to_proxy()).unwrap_err().code(), CODE_INVALID_PARAMETER);
    }
}
