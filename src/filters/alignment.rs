// In: src/filters/alignment.rs

//! AdaptiveAlignmentMutualInformation: registers the z-sections of an image
//! geometry against each other and optionally resamples the cell arrays.
//!
//! The registration signal is either a scalar image (binned over its global
//! value range) or the orientation field (each section segmented in 2-D, the
//! labels serving as histogram bins). The image may come from another
//! container, e.g. an SEM image acquired on the same grid, as long as its
//! geometry has the same dimensions.

use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{AttributeMatrixType, DataArray, DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::{cell_grid, degrees_to_radians, require_mask, to_json, OrientationInputs};
use crate::grid::VoxelGrid;
use crate::kernels::alignment::{
    align_sections, orientation_labels, section_views, shift_tuple_map, AlignmentMode, AlignmentParams,
    SearchStrategy,
};
use crate::kernels::mutual_information::{bin_index, EXCLUDED};
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::{ArrayBuffer, DataType};

//==================================================================================
// 1. Parameters
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentSignal {
    /// A 1-component numeric array.
    Image { path: DataArrayPath },
    Orientation(OrientationInputs),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdaptiveAlignmentMutualInformation {
    /// The cell matrix whose arrays are resampled; its container receives the
    /// shifts matrix.
    pub cell_matrix: DataArrayPath,
    pub signal: AlignmentSignal,
    /// Optional Bool mask over the cell matrix; masked pixels are excluded
    /// from every histogram.
    #[serde(default)]
    pub mask: Option<DataArrayPath>,
    /// Degrees; only used by the orientation signal.
    pub misorientation_tolerance: f64,
    /// Only used by the image signal.
    pub histogram_bins: usize,
    pub search_radius: i32,
    pub search: SearchStrategy,
    pub mode: AlignmentMode,
    /// Section every other one registers against in `Global` mode.
    #[serde(default)]
    pub reference_section: usize,
    pub shifts_matrix_name: String,
    pub shifts_array_name: String,
    pub apply_shifts: bool,
}

impl AdaptiveAlignmentMutualInformation {
    pub fn from_defaults(defaults: &FilterDefaults) -> Self {
        Self {
            cell_matrix: DataArrayPath::unset(),
            signal: AlignmentSignal::Orientation(OrientationInputs::default()),
            mask: None,
            misorientation_tolerance: defaults.misorientation_tolerance,
            histogram_bins: defaults.histogram_bins,
            search_radius: defaults.alignment_search_radius,
            search: defaults.alignment_search,
            mode: AlignmentMode::Local,
            reference_section: 0,
            shifts_matrix_name: "Alignment Data".to_string(),
            shifts_array_name: "SectionShifts".to_string(),
            apply_shifts: true,
        }
    }

    pub fn shifts_path(&self) -> DataArrayPath {
        DataArrayPath::new(
            self.cell_matrix.container(),
            self.shifts_matrix_name.clone(),
            self.shifts_array_name.clone(),
        )
    }

    fn kernel_params(&self) -> AlignmentParams {
        AlignmentParams {
            search_radius: self.search_radius,
            strategy: self.search,
            mode: self.mode,
            reference_section: self.reference_section,
        }
    }

    /// Checks every input and returns the cell grid.
    fn validate(&self, dca: &DataContainerArray) -> Result<VoxelGrid, EbsdError> {
        if self.search_radius < 0 {
            return Err(EbsdError::InvalidParameter(format!(
                "search radius must be non-negative, got {}",
                self.search_radius
            )));
        }
        let grid = cell_grid(dca, &self.cell_matrix)?;
        let [_, _, nz] = grid.dims();
        if nz < 2 {
            return Err(EbsdError::InvalidParameter(format!(
                "alignment needs at least 2 sections, found {nz}"
            )));
        }
        if self.mode == AlignmentMode::Global && self.reference_section >= nz {
            return Err(EbsdError::InvalidParameter(format!(
                "reference section {} is out of range for {} sections",
                self.reference_section, nz
            )));
        }

        let signal_grid = match &self.signal {
            AlignmentSignal::Image { path } => {
                if self.histogram_bins < 2 {
                    return Err(EbsdError::InvalidParameter(
                        "histogram_bins must be at least 2".to_string(),
                    ));
                }
                dca.resolve_numeric(path)?;
                cell_grid(dca, path)?
            }
            AlignmentSignal::Orientation(inputs) => {
                degrees_to_radians(self.misorientation_tolerance)?;
                inputs.validate(dca)?
            }
        };
        if signal_grid.dims() != grid.dims() {
            return Err(EbsdError::InvalidParameter(format!(
                "signal grid {:?} does not match cell grid {:?}",
                signal_grid.dims(),
                grid.dims()
            )));
        }
        if let Some(mask) = &self.mask {
            require_mask(dca, mask, grid.len())?;
        }
        Ok(grid)
    }

    /// Per-voxel histogram labels, `EXCLUDED` where masked.
    fn labels(&self, dca: &DataContainerArray, mask: Option<&[bool]>) -> Result<Vec<u32>, EbsdError> {
        match &self.signal {
            AlignmentSignal::Image { path } => {
                let values = dca
                    .resolve_numeric(path)?
                    .buffer()
                    .ok_or_else(|| EbsdError::AlgorithmicFailure(format!("{path} has no data")))?;
                Ok(image_labels(values, mask, self.histogram_bins))
            }
            AlignmentSignal::Orientation(inputs) => {
                let loaded = inputs.load(dca)?;
                let tolerance = degrees_to_radians(self.misorientation_tolerance)?;
                Ok(orientation_labels(&loaded.field(), mask, tolerance))
            }
        }
    }
}

/// Bins every included value over the global range of the included values.
fn image_labels(values: &ArrayBuffer, mask: Option<&[bool]>, bins: usize) -> Vec<u32> {
    let included = |i: usize| mask.map_or(true, |m| m[i]);
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for i in (0..values.len()).filter(|&i| included(i)) {
        let v = values.value_f64(i);
        min = min.min(v);
        max = max.max(v);
    }
    (0..values.len())
        .map(|i| {
            if included(i) {
                bin_index(values.value_f64(i), min, max, bins)
            } else {
                EXCLUDED
            }
        })
        .collect()
}

//==================================================================================
// 2. Filter
//==================================================================================

impl Filter for AdaptiveAlignmentMutualInformation {
    fn name(&self) -> &'static str {
        "adaptive_alignment_mutual_information"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let grid = self.validate(dca)?;
        let shifts = self.shifts_path();
        dca.create_attribute_matrix(
            &shifts.to_matrix_path(),
            AttributeMatrixType::Generic,
            vec![grid.dims()[2]],
            false,
        )?;
        dca.create_array(&shifts, DataType::Int32, 2, false)?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let grid = self.validate(dca)?;
        let mask = match &self.mask {
            Some(path) => Some(dca.resolve::<bool>(path, 1)?.as_slice().to_vec()),
            None => None,
        };
        let labels = self.labels(dca, mask.as_deref())?;
        let sections = section_views(&labels, grid.dims())?;
        let result = align_sections(&sections, &self.kernel_params())?;
        log::info!(
            "Aligned {} sections ({:?} mode), final shift {:?}",
            sections.len(),
            self.mode,
            result.shifts.last()
        );
        log_metric!("event" = "align_sections", "sections" = &sections.len(), "converged" = &result.converged);

        let flat: Vec<i32> = result.shifts.iter().flat_map(|&(sx, sy)| [sx, sy]).collect();
        let shifts = self.shifts_path();
        dca.create_attribute_matrix(
            &shifts.to_matrix_path(),
            AttributeMatrixType::Generic,
            vec![result.shifts.len()],
            false,
        )?;
        dca.insert_array(
            &shifts.to_matrix_path(),
            DataArray::from_vec(self.shifts_array_name.clone(), flat, 2)?,
            false,
        )?;

        if self.apply_shifts {
            let map = shift_tuple_map(grid, &result.shifts);
            dca.get_matrix_mut(&self.cell_matrix)?.apply_tuple_map(&map)?;
        }

        if result.converged {
            Ok(FilterOutcome::ok())
        } else {
            Ok(FilterOutcome::with_warning(EbsdError::ConvergenceFailure {
                iterations: match self.search {
                    SearchStrategy::HillClimb { max_steps } => max_steps,
                    SearchStrategy::Exhaustive => 0,
                },
                message: "a hill climb ran out of steps before reaching a local maximum".to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CODE_CONVERGENCE_FAILURE, CODE_INVALID_PARAMETER};
    use crate::filters::test_support::{cell, inputs, scan, CELLS, CONTAINER};
    use crate::orientation::Quat;

    const N: usize = 8;

    /// Distinct-looking labels over an extended domain, so translated windows
    /// are fully defined.
    fn pattern(x: i64, y: i64) -> f32 {
        (((x + 3) * 7 + y * 13 + (x + 3) * y).rem_euclid(11)) as f32
    }

    /// Two sections; section 1 is section 0 translated by `+tx` in x.
    fn store(tx: i64) -> DataContainerArray {
        let n = N * N * 2;
        let mut dca = scan([N, N, 2], &vec![Quat::IDENTITY; n], &vec![1.0; n]);
        let mut image = Vec::with_capacity(n);
        for z in 0..2i64 {
            for y in 0..N as i64 {
                for x in 0..N as i64 {
                    image.push(pattern(x - z * tx, y));
                }
            }
        }
        dca.insert_array(
            &DataArrayPath::matrix_path(CONTAINER, CELLS),
            DataArray::from_vec("Image", image, 1).unwrap(),
            false,
        )
        .unwrap();
        dca
    }

    fn filter() -> AdaptiveAlignmentMutualInformation {
        AdaptiveAlignmentMutualInformation {
            cell_matrix: DataArrayPath::matrix_path(CONTAINER, CELLS),
            signal: AlignmentSignal::Image { path: cell("Image") },
            histogram_bins: 11,
            search_radius: 1,
            ..AdaptiveAlignmentMutualInformation::from_defaults(&FilterDefaults::default())
        }
    }

    #[test]
    fn test_translated_section_is_shifted_back() {
        let mut dca = store(1);
        let f = filter();
        f.preflight(&mut dca.to_proxy()).unwrap();
        f.execute(&mut dca).unwrap();

        let shifts = dca.resolve::<i32>(&f.shifts_path(), 2).unwrap();
        assert_eq!(shifts.as_slice(), &[0, 0, 1, 0]);

        let image = dca.resolve::<f32>(&cell("Image"), 1).unwrap();
        let plane = N * N;
        for y in 0..N {
            for x in 0..N - 1 {
                assert_eq!(image.as_slice()[plane + y * N + x], pattern(x as i64, y as i64));
            }
            // The vacated column is zeroed.
            assert_eq!(image.as_slice()[plane + y * N + N - 1], 0.0);
        }
    }

    #[test]
    fn test_shifts_only_when_not_applied() {
        let mut dca = store(1);
        let before = dca.resolve::<f32>(&cell("Image"), 1).unwrap().as_slice().to_vec();
        let f = AdaptiveAlignmentMutualInformation {
            apply_shifts: false,
            ..filter()
        };
        f.execute(&mut dca).unwrap();
        assert_eq!(dca.resolve::<f32>(&cell("Image"), 1).unwrap().as_slice(), &before[..]);
        assert!(dca.contains_array(&f.shifts_path()));
    }

    #[test]
    fn test_orientation_signal_on_uniform_sections() {
        let mut dca = store(0);
        let f = AdaptiveAlignmentMutualInformation {
            signal: AlignmentSignal::Orientation(inputs()),
            ..filter()
        };
        f.execute(&mut dca).unwrap();
        let shifts = dca.resolve::<i32>(&f.shifts_path(), 2).unwrap();
        assert_eq!(shifts.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_hill_climb_without_steps_warns() {
        let mut dca = store(0);
        let f = AdaptiveAlignmentMutualInformation {
            search: SearchStrategy::HillClimb { max_steps: 0 },
            ..filter()
        };
        let outcome = f.execute(&mut dca).unwrap();
        assert_eq!(outcome.code(), CODE_CONVERGENCE_FAILURE);
    }

    #[test]
    fn test_preflight_rejects_single_section_and_bad_reference() {
        let dca = scan([2, 2, 1], &[Quat::IDENTITY; 4], &[1.0; 4]);
        let f = AdaptiveAlignmentMutualInformation {
            signal: AlignmentSignal::Orientation(inputs()),
            ..filter()
        };
        assert_eq!(f.preflight(&mut dca.to_proxy()).unwrap_err().code(), CODE_INVALID_PARAMETER);

        let dca = store(0);
        let f = AdaptiveAlignmentMutualInformation {
            mode: AlignmentMode::Global,
            reference_section: 2,
            ..filter()
        };
        assert_eq!(f.preflight(&mut dca.to_proxy()).unwrap_err().code(), CODE_INVALID_PARAMETER);
    }

    #[test]
    fn test_signal_json_form() {
        let json = serde_json::json!({"kind": "image", "path": {"container": "SEM", "matrix": "Cells", "array": "Intensity"}});
        let signal: AlignmentSignal = serde_json::from_value(json).unwrap();
        assert_eq!(
            signal,
            AlignmentSignal::Image {
                path: DataArrayPath::new("SEM", "Cells", "Intensity")
            }
        );
    }
}
