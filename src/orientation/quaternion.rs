//! Unit quaternions for crystal orientations.
//!
//! Arrays store quaternions as `(x, y, z, w)` (vector part first) in `f32`; all
//! math here is carried out in `f64`.

use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Drift from unit norm beyond which a composed quaternion is renormalized.
pub const RENORMALIZE_TOLERANCE: f64 = 1e-4;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Reads one `(x, y, z, w)` tuple as stored in a 4-component array.
    pub fn from_xyzw(tuple: &[f32]) -> Self {
        Self::new(
            tuple[3] as f64,
            tuple[0] as f64,
            tuple[1] as f64,
            tuple[2] as f64,
        )
    }

    /// Writes the quaternion back as an `(x, y, z, w)` tuple.
    pub fn write_xyzw(&self, tuple: &mut [f32]) {
        tuple[0] = self.x as f32;
        tuple[1] = self.y as f32;
        tuple[2] = self.z as f32;
        tuple[3] = self.w as f32;
    }

    /// Rotation of `angle` radians about `axis` (need not be normalized).
    pub fn from_axis_angle(axis: [f64; 3], angle: f64) -> Self {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if len < 1e-12 {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, s * axis[0] / len, s * axis[1] / len, s * axis[2] / len)
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, other: &Quat) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn normalized(&self) -> Self {
        let n = self.norm();
        if n < 1e-12 {
            return Self::IDENTITY;
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Renormalizes only when the norm has drifted past `RENORMALIZE_TOLERANCE`.
    pub fn renormalize_if_drifted(self) -> Self {
        if (self.norm() - 1.0).abs() > RENORMALIZE_TOLERANCE {
            self.normalized()
        } else {
            self
        }
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// For unit quaternions the inverse is the conjugate.
    pub fn inverse(&self) -> Self {
        self.conjugate()
    }

    pub fn negated(&self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    /// Composition `self * rhs` followed by the drift check.
    pub fn compose(&self, rhs: &Quat) -> Self {
        (*self * *rhs).renormalize_if_drifted()
    }

    /// Rotation angle in `[0, π]`, insensitive to the sign ambiguity `q ≡ -q`.
    pub fn angle(&self) -> f64 {
        2.0 * self.w.abs().min(1.0).acos()
    }

    /// Canonical sign: `w >= 0`, with ties broken on the first non-zero component.
    pub fn canonical(&self) -> Self {
        let keys = [self.w, self.x, self.y, self.z];
        match keys.iter().find(|v| v.abs() > 1e-12) {
            Some(&first) if first < 0.0 => self.negated(),
            _ => *self,
        }
    }

    /// Same rotation check, tolerant of sign.
    pub fn same_rotation(&self, other: &Quat, tolerance: f64) -> bool {
        self.dot(other).abs() > 1.0 - tolerance
    }
}

/// Hamilton product.
impl Mul for Quat {
    type Output = Quat;

    fn mul(self, r: Quat) -> Quat {
        Quat::new(
            self.w * r.w - self.x * r.x - self.y * r.y - self.z * r.z,
            self.w * r.x + self.x * r.w + self.y * r.z - self.z * r.y,
            self.w * r.y - self.x * r.z + self.y * r.w + self.z * r.x,
            self.w * r.z + self.x * r.y - self.y * r.x + self.z * r.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_xyzw_layout_roundtrip() {
        let tuple = [0.1f32, 0.2, 0.3, 0.9];
        let q = Quat::from_xyzw(&tuple);
        assert!((q.w - 0.9).abs() < 1e-6);
        let mut out = [0.0f32; 4];
        q.write_xyzw(&mut out);
        assert_eq!(out, tuple);
    }

    #[test]
    fn test_hamilton_product_of_basis() {
        let i = Quat::new(0.0, 1.0, 0.0, 0.0);
        let j = Quat::new(0.0, 0.0, 1.0, 0.0);
        let k = Quat::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(i * j, k);
        assert_eq!(j * i, k.negated());
    }

    #[test]
    fn test_angle_ignores_sign() {
        let q = Quat::from_axis_angle([0.0, 0.0, 1.0], PI / 3.0);
        assert!((q.angle() - PI / 3.0).abs() < 1e-12);
        assert!((q.negated().angle() - PI / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_renormalizes_drift() {
        let drifted = Quat::new(1.01, 0.0, 0.0, 0.0);
        let out = Quat::IDENTITY.compose(&drifted);
        assert!((out.norm() - 1.0).abs() < 1e-12);

        let tiny = Quat::new(1.0 + 1e-6, 0.0, 0.0, 0.0);
        assert_eq!(tiny.renormalize_if_drifted(), tiny);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let q = Quat::from_axis_angle([1.0, 2.0, 3.0], 1.1);
        let id = q.compose(&q.inverse());
        assert!(id.same_rotation(&Quat::IDENTITY, 1e-12));
    }
}
