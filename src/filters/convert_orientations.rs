//! Converts a Float32 orientation array between Euler angles, quaternions and
//! axis-angle pairs. The output lands next to the input.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;
use crate::data_store::{DataArray, DataArrayPath, DataContainerArray};
use crate::error::EbsdError;
use crate::filters::to_json;
use crate::orientation::{
    axis_angle_to_quat, euler_to_quat, quat_to_axis_angle, quat_to_euler, AngleUnit,
    OrientationRepresentation, Quat,
};
use crate::pipeline::{Filter, FilterOutcome};
use crate::types::DataType;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConvertOrientations {
    pub input: DataArrayPath,
    pub input_type: OrientationRepresentation,
    pub output_type: OrientationRepresentation,
    pub output_name: String,
    /// Unit of Euler angles, on either side. Axis-angle angles are radians.
    #[serde(default)]
    pub angle_unit: AngleUnit,
}

impl ConvertOrientations {
    pub fn from_defaults(_defaults: &FilterDefaults) -> Self {
        Self {
            input: DataArrayPath::unset(),
            input_type: OrientationRepresentation::Euler,
            output_type: OrientationRepresentation::Quaternion,
            output_name: "Quats".to_string(),
            angle_unit: AngleUnit::Radians,
        }
    }

    fn output_path(&self) -> DataArrayPath {
        self.input.with_array(self.output_name.clone())
    }

    /// `tuple` holds exactly `input_type.components()` values.
    fn to_quat(&self, tuple: &[f32]) -> Quat {
        let at = |i: usize| f64::from(tuple[i]);
        match self.input_type {
            OrientationRepresentation::Euler => euler_to_quat([at(0), at(1), at(2)], self.angle_unit),
            OrientationRepresentation::Quaternion => Quat::from_xyzw(tuple).normalized(),
            OrientationRepresentation::AxisAngle => axis_angle_to_quat([at(0), at(1), at(2), at(3)]),
        }
    }

    fn write(&self, q: &Quat, out: &mut [f32]) {
        match self.output_type {
            OrientationRepresentation::Euler => {
                let e = quat_to_euler(q, self.angle_unit);
                out.iter_mut().zip(e).for_each(|(o, v)| *o = v as f32);
            }
            OrientationRepresentation::Quaternion => q.write_xyzw(out),
            OrientationRepresentation::AxisAngle => {
                let aa = quat_to_axis_angle(q);
                out.iter_mut().zip(aa).for_each(|(o, v)| *o = v as f32);
            }
        }
    }
}

impl Filter for ConvertOrientations {
    fn name(&self) -> &'static str {
        "convert_orientations"
    }

    fn parameters(&self) -> serde_json::Value {
        to_json(self)
    }

    fn preflight(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        if self.input_type == self.output_type {
            return Err(EbsdError::InvalidParameter(format!(
                "input and output representation are both {:?}",
                self.input_type
            )));
        }
        dca.require(&self.input, DataType::Float32, self.input_type.components())?;
        dca.create_array(&self.output_path(), DataType::Float32, self.output_type.components(), false)?;
        Ok(FilterOutcome::ok())
    }

    fn execute(&self, dca: &mut DataContainerArray) -> Result<FilterOutcome, EbsdError> {
        let in_comps = self.input_type.components();
        let out_comps = self.output_type.components();
        let input = dca.resolve::<f32>(&self.input, in_comps)?;

        let mut converted = vec![0f32; input.tuple_count() * out_comps];
        converted
            .par_chunks_exact_mut(out_comps)
            .zip(input.as_slice().par_chunks_exact(in_comps))
            .for_each(|(out, tuple)| self.write(&self.to_quat(tuple), out));

        log::debug!(
            "Converted {} orientations {:?} -> {:?}",
            input.tuple_count(),
            self.input_type,
            self.output_type
        );
        let array = DataArray::from_vec(self.output_name.clone(), converted, out_comps)?;
        dca.insert_array(&self.input.to_matrix_path(), array, false)?;
        Ok(FilterOutcome::ok())
    }
}
