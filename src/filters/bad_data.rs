//! BadDataNeighborOrientationCheck: flips bad voxels to good when enough of
//! their neighbors agree with them, copying the closest neighbor's tuple.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::{degrees_to_radians, replay_copies, require_mask, to_json, OrientationInputs};
use crate::grid::Connectivity;
use crate::kernels::neighbor_check::{fill_bad_voxels, NeighborCheckParams};
use crate::pipeline::{Filter, FilterOutcome};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BadDataNeighborOrientationCheck {
    #[serde(flatten)]
    pub orientations: OrientationInputs,
    /// Bool cell array; `false` marks a bad voxel. Updated in place.
    pub good_voxels: DataArrayPath,
    /// Degrees.
    pub misorientation_tolerance: f64,
    pub min_neighbors: usize,
    pub search_radius: usize,
    pub connectivity: Connectivity,
    pub max_passes: usize,
}

impl BadDataNeighborOrientationCheck {
    pub fn from_defaults(defaults: &FilterDefaults) -> Self {
        Self {
            orientations: OrientationInputs::default(),
            good_voxels: DataArrayPath::unset(),
            misorientation_tolerance: defaults.misorientation_tolerance,
            min_neighbors: defaults.min_neighbors,
            search_radius: defaults.search_radius,
            connectivity: defaults.connectivity,
            max_passes: defaults.max_iterations,
        }
    }

    fn kernel_params(&self) -> Result<NeighborCheckParams, EbsdError> {
        if self.search_radius == 0 || self.max_passes == 0 {
            return Err(EbsdError::InvalidParameter(
                "search_radius and max_passes must both be at least 1".to_string(),
            ));
        }
        Ok(NeighborCheckParams {
            tolerance: degrees_to_radians(self.misorientation_tolerance)?,
            min_neighbors: self.min_neighbors,
            search_radius: self.search_radius,
            connectivity: self.connectivity,
            max_passes: self.max_passes,
        })
    }
}

impl Filter for BadDataNeighborOrientationCheck {
    fn name(&self) -> &'static str {
        "bad_data_neighbor_orientation_check"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        self.kernel_params()?;
        let grid = self.orientations.validate(dca)?;
        require_mask(dca, &self.good_voxels, grid.len())?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let params = self.kernel_params()?;
        let loaded = self.orientations.load(dca)?;
        require_mask(dca, &self.good_voxels, loaded.grid.len())?;
        let mut good = dca.resolve::<bool>(&self.good_voxels, 1)?.as_slice().to_vec();
        let initially_bad = good.iter().filter(|g| !**g).count();

        let mut field = loaded.field();
        let report = fill_bad_voxels(&mut field, &mut good, &params);

        replay_copies(dca, &self.orientations.quats, &report.copies)?;
        dca.resolve_mut::<bool>(&self.good_voxels, 1)?
            .as_mut_slice()
            .copy_from_slice(&good);

        log::info!(
            "Bad-data check filled {} of {} bad voxels in {} passes",
            report.copies.len(),
            initially_bad,
            report.passes
        );
        log_metric!("event" = "bad_data_check", "filled" = &report.copies.len(), "remaining" = &report.remaining_bad);

        if report.converged {
            Ok(FilterOutcome::ok())
        } else {
            Ok(FilterOutcome::with_warning(EbsdError::ConvergenceFailure {
                iterations: report.passes,
                message: format!(
                    "a level reached the cap of {} passes with voxels still changing",
                    self.max_passes
                ),
            }))
        }
    }
}
