use std::marker::PhantomData;
use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis_angle::AxisAngle;
use crate::euler_angles_xyz::EulerAnglesXyz;
use crate::euler_angles_zyx::EulerAnglesZyx;
use crate::quaternion::RotationQuaternion;
use crate::rotation_matrix::RotationMatrix;
use crate::usage::{Active, RotationUsage};
use crate::{Rotation, RotationTrait};

/// A rotation encoded as angle times unit axis in a single vector.
///
/// The norm of the vector is the rotation angle, its direction the rotation
/// axis. The zero vector is a valid encoding of the identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationVector<U: RotationUsage = Active> {
    v: Vector3<f64>,
    usage: PhantomData<U>,
}

impl<U: RotationUsage> RotationVector<U> {
    pub const IDENTITY: Self = Self { v: Vector3::new(0.0, 0.0, 0.0), usage: PhantomData };

    /// Creates a new rotation from nominal vector components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_vector(Vector3::new(x, y, z))
    }

    /// Creates a new rotation from a nominal vector.
    pub fn from_vector(v: Vector3<f64>) -> Self {
        Self { v: v * U::SIGN, usage: PhantomData }
    }

    /// Creates a rotation directly from a stored vector, no sign convention
    /// applied.
    pub fn from_implementation(v: Vector3<f64>) -> Self {
        Self { v, usage: PhantomData }
    }

    /// Returns the stored vector.
    pub fn to_implementation(&self) -> Vector3<f64> {
        self.v
    }

    /// Element-wise cast of a single precision stored vector.
    pub fn from_f32(v: Vector3<f32>) -> Self {
        Self::from_implementation(v.cast::<f64>())
    }

    /// Element-wise cast of the stored vector to single precision.
    pub fn to_f32_implementation(&self) -> Vector3<f32> {
        self.v.cast::<f32>()
    }

    pub fn x(&self) -> f64 {
        U::SIGN * self.v[0]
    }

    pub fn y(&self) -> f64 {
        U::SIGN * self.v[1]
    }

    pub fn z(&self) -> f64 {
        U::SIGN * self.v[2]
    }

    pub fn set_x(&mut self, x: f64) {
        self.v[0] = U::SIGN * x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.v[1] = U::SIGN * y;
    }

    pub fn set_z(&mut self, z: f64) {
        self.v[2] = U::SIGN * z;
    }

    pub fn set_identity(&mut self) {
        self.v = Vector3::zeros();
    }

    /// Nominal rotation angle, the norm of the vector.
    pub fn angle(&self) -> f64 {
        self.v.norm()
    }
}

impl<U: RotationUsage> RotationTrait for RotationVector<U> {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationQuaternion::from(self).rotate(v)
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationQuaternion::from(self).transform(v)
    }

    fn rotate_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        RotationMatrix::from(self).to_implementation() * m
    }

    fn inv(&self) -> Self {
        Self { v: -self.v, usage: PhantomData }
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> Mul<RotationVector<U>> for RotationVector<U> {
    type Output = Self;

    /// Composes two rotations via the unit quaternion lift.
    fn mul(self, rhs: RotationVector<U>) -> Self::Output {
        Self::from(&(RotationQuaternion::from(&self) * RotationQuaternion::from(&rhs)))
    }
}

impl<U: RotationUsage> From<&AxisAngle<U>> for RotationVector<U> {
    /// The stored angle scales the unit axis directly.
    fn from(axis_angle: &AxisAngle<U>) -> Self {
        let (angle, axis) = axis_angle.to_implementation();
        Self::from_implementation(angle * axis)
    }
}

impl<U: RotationUsage> From<&RotationQuaternion<U>> for RotationVector<U> {
    fn from(quat: &RotationQuaternion<U>) -> Self {
        Self::from(&AxisAngle::from(quat))
    }
}

impl<U: RotationUsage> From<&RotationMatrix<U>> for RotationVector<U> {
    fn from(matrix: &RotationMatrix<U>) -> Self {
        Self::from(&AxisAngle::from(matrix))
    }
}

impl<U: RotationUsage> From<&EulerAnglesZyx<U>> for RotationVector<U> {
    fn from(euler: &EulerAnglesZyx<U>) -> Self {
        Self::from(&AxisAngle::from(euler))
    }
}

impl<U: RotationUsage> From<&EulerAnglesXyz<U>> for RotationVector<U> {
    fn from(euler: &EulerAnglesXyz<U>) -> Self {
        Self::from(&AxisAngle::from(euler))
    }
}

impl<U: RotationUsage> From<&Rotation<U>> for RotationVector<U> {
    fn from(rotation: &Rotation<U>) -> Self {
        match rotation {
            Rotation::RotationVector(v) => *v,
            Rotation::AxisAngle(v) => Self::from(v),
            Rotation::EulerAnglesZyx(v) => Self::from(v),
            Rotation::EulerAnglesXyz(v) => Self::from(v),
            Rotation::Quaternion(v) => Self::from(v),
            Rotation::RotationMatrix(v) => Self::from(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::Passive;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;
    const TOL: f64 = 1e-12;

    #[test]
    fn test_zero_vector_is_identity() {
        let rv = RotationVector::<Active>::new(0.0, 0.0, 0.0);
        let aa = AxisAngle::from(&rv);
        assert_abs_diff_eq!(aa.angle(), 0.0, epsilon = TOL);
        assert_abs_diff_eq!(aa.axis()[0], 1.0, epsilon = TOL);
        let q = RotationQuaternion::from(&rv);
        assert!(q.angle_to(&RotationQuaternion::identity()) < TOL);
    }

    #[test]
    fn test_norm_is_angle() {
        let rv = RotationVector::<Active>::new(0.0, 0.0, FRAC_PI_2);
        assert_abs_diff_eq!(rv.angle(), FRAC_PI_2, epsilon = TOL);
        let v = rv.rotate(&Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(v[1], 1.0, epsilon = TOL);
    }

    #[test]
    fn test_usage_sign_law() {
        let a = RotationVector::<Active>::new(0.1, -0.2, 0.3).to_implementation();
        let p = RotationVector::<Passive>::new(0.1, -0.2, 0.3).to_implementation();
        assert_abs_diff_eq!(p[0], -a[0], epsilon = TOL);
        assert_abs_diff_eq!(p[1], -a[1], epsilon = TOL);
        assert_abs_diff_eq!(p[2], -a[2], epsilon = TOL);
    }

    #[test]
    fn test_axis_angle_round_trip() {
        let rv = RotationVector::<Active>::new(0.3, -0.6, 1.1);
        let back = RotationVector::from(&AxisAngle::from(&rv));
        assert_abs_diff_eq!(back.x(), rv.x(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.y(), rv.y(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.z(), rv.z(), epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_negates_vector() {
        let rv = RotationVector::<Active>::new(0.3, -0.6, 1.1);
        let q = RotationQuaternion::from(&(rv.inv() * rv));
        assert!(q.angle_to(&RotationQuaternion::identity()) < 1e-9);
    }

    #[test]
    fn test_f32_cast_round_trip() {
        let rv = RotationVector::<Active>::new(0.25, -0.5, 0.75);
        let back = RotationVector::<Active>::from_f32(rv.to_f32_implementation());
        assert_abs_diff_eq!(back.x(), rv.x(), epsilon = 1e-6);
    }
}
