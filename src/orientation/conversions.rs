//! Conversions between orientation representations.
//!
//! Euler angles follow the Bunge (ZXZ) convention `(φ1, Φ, φ2)`, i.e. the
//! rotation `Rz(φ1) · Rx(Φ) · Rz(φ2)`. Axis-angle tuples are `(ax, ay, az, ω)`.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::orientation::Quat;

/// Below this `sin(Φ/2)` (or `cos(Φ/2)`) the Euler decomposition is degenerate.
const GIMBAL_EPSILON: f64 = 1e-10;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    pub fn to_radians(&self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_radians(),
        }
    }

    pub fn from_radians(&self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_degrees(),
        }
    }
}

/// The representations `ConvertOrientations` can translate between.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrientationRepresentation {
    Euler,
    Quaternion,
    AxisAngle,
}

impl OrientationRepresentation {
    pub fn components(&self) -> usize {
        match self {
            OrientationRepresentation::Euler => 3,
            OrientationRepresentation::Quaternion | OrientationRepresentation::AxisAngle => 4,
        }
    }
}

//==================================================================================
// 1. Euler <-> Quaternion
//==================================================================================

/// Bunge Euler angles to a unit quaternion.
pub fn euler_to_quat(euler: [f64; 3], unit: AngleUnit) -> Quat {
    let phi1 = unit.to_radians(euler[0]);
    let big_phi = unit.to_radians(euler[1]);
    let phi2 = unit.to_radians(euler[2]);

    let (s, c) = (big_phi * 0.5).sin_cos();
    let sum = (phi1 + phi2) * 0.5;
    let diff = (phi1 - phi2) * 0.5;

    Quat::new(c * sum.cos(), s * diff.cos(), s * diff.sin(), c * sum.sin()).renormalize_if_drifted()
}

/// Unit quaternion to Bunge Euler angles with `φ1, φ2 ∈ [0, 2π)` and `Φ ∈ [0, π]`.
///
/// In the degenerate cases (Φ ≈ 0 or Φ ≈ π) only one of the sums is defined and
/// `φ2` is set to zero.
pub fn quat_to_euler(q: &Quat, unit: AngleUnit) -> [f64; 3] {
    let q = q.normalized();
    let vec_part = (q.x * q.x + q.y * q.y).sqrt();
    let scalar_part = (q.w * q.w + q.z * q.z).sqrt();
    let big_phi = 2.0 * vec_part.atan2(scalar_part);

    let (phi1, phi2) = if vec_part < GIMBAL_EPSILON {
        (2.0 * q.z.atan2(q.w), 0.0)
    } else if scalar_part < GIMBAL_EPSILON {
        (2.0 * q.y.atan2(q.x), 0.0)
    } else {
        let sum = 2.0 * q.z.atan2(q.w);
        let diff = 2.0 * q.y.atan2(q.x);
        ((sum + diff) * 0.5, (sum - diff) * 0.5)
    };

    [
        unit.from_radians(wrap_two_pi(phi1)),
        unit.from_radians(big_phi),
        unit.from_radians(wrap_two_pi(phi2)),
    ]
}

/// Wraps an angle into `[0, 2π)`.
pub fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can return exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

//==================================================================================
// 2. Axis-Angle <-> Quaternion
//==================================================================================

/// `(ax, ay, az, ω)` with ω in radians.
pub fn axis_angle_to_quat(axis_angle: [f64; 4]) -> Quat {
    Quat::from_axis_angle([axis_angle[0], axis_angle[1], axis_angle[2]], axis_angle[3])
}

/// Unit axis plus an angle in `[0, π]`. The identity maps to `(0, 0, 1, 0)`.
pub fn quat_to_axis_angle(q: &Quat) -> [f64; 4] {
    let q = q.normalized();
    let q = if q.w < 0.0 { q.negated() } else { q };
    let s = (q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
    if s < GIMBAL_EPSILON {
        return [0.0, 0.0, 1.0, 0.0];
    }
    let angle = 2.0 * s.atan2(q.w);
    [q.x / s, q.y / s, q.z / s, angle.min(PI)]
}
