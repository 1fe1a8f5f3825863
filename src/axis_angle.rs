use std::marker::PhantomData;
use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::euler_angles_xyz::EulerAnglesXyz;
use crate::euler_angles_zyx::EulerAnglesZyx;
use crate::quaternion::RotationQuaternion;
use crate::rotation_matrix::RotationMatrix;
use crate::rotation_vector::RotationVector;
use crate::usage::{Active, RotationUsage};
use crate::{Rotation, RotationTrait};

#[derive(Debug, Error, Copy, Clone)]
pub enum AxisAngleError {
    #[error("magnitude of the axis is too small, should be normalizable to a magnitude of 1.0")]
    ZeroMagnitudeAxis,
}

/// A rotation by a scalar angle about a unit axis.
///
/// The identity convention is a zero angle about the unit x axis; the zero
/// guard of the rotation-vector conversion produces exactly this value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAngle<U: RotationUsage = Active> {
    angle: f64,
    axis: Vector3<f64>,
    usage: PhantomData<U>,
}

impl<U: RotationUsage> AxisAngle<U> {
    pub const IDENTITY: Self =
        Self { angle: 0.0, axis: Vector3::new(1.0, 0.0, 0.0), usage: PhantomData };

    /// Creates a new rotation from a nominal angle and an axis, normalizing
    /// the axis.
    ///
    /// # Errors
    ///
    /// Returns `AxisAngleError::ZeroMagnitudeAxis` if the axis norm is below
    /// `1e-12`.
    pub fn new(angle: f64, axis: Vector3<f64>) -> Result<Self, AxisAngleError> {
        if axis.norm() < 1e-12 {
            return Err(AxisAngleError::ZeroMagnitudeAxis);
        }
        Ok(Self { angle: U::SIGN * angle, axis: axis.normalize(), usage: PhantomData })
    }

    /// Creates a rotation directly from a stored angle and unit axis, no
    /// sign convention applied.
    ///
    /// # Errors
    ///
    /// Returns `AxisAngleError::ZeroMagnitudeAxis` if the axis norm is below
    /// `1e-12`.
    pub fn from_implementation(angle: f64, axis: Vector3<f64>) -> Result<Self, AxisAngleError> {
        if axis.norm() < 1e-12 {
            return Err(AxisAngleError::ZeroMagnitudeAxis);
        }
        Ok(Self { angle, axis: axis.normalize(), usage: PhantomData })
    }

    /// Returns the stored (angle, axis) payload.
    pub fn to_implementation(&self) -> (f64, Vector3<f64>) {
        (self.angle, self.axis)
    }

    /// Element-wise cast of a single precision stored payload.
    ///
    /// # Errors
    ///
    /// Returns `AxisAngleError::ZeroMagnitudeAxis` for a degenerate axis.
    pub fn from_f32(angle: f32, axis: Vector3<f32>) -> Result<Self, AxisAngleError> {
        Self::from_implementation(f64::from(angle), axis.cast::<f64>())
    }

    /// Element-wise cast of the stored payload to single precision.
    pub fn to_f32_implementation(&self) -> (f32, Vector3<f32>) {
        (self.angle as f32, self.axis.cast::<f32>())
    }

    /// Nominal rotation angle in radians.
    pub fn angle(&self) -> f64 {
        U::SIGN * self.angle
    }

    /// Unit rotation axis. The axis is usage independent, only the angle
    /// carries the sign convention.
    pub fn axis(&self) -> Vector3<f64> {
        self.axis
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = U::SIGN * angle;
    }

    /// Replaces the axis, normalizing it.
    ///
    /// # Errors
    ///
    /// Returns `AxisAngleError::ZeroMagnitudeAxis` for a degenerate axis.
    pub fn set_axis(&mut self, axis: Vector3<f64>) -> Result<(), AxisAngleError> {
        if axis.norm() < 1e-12 {
            return Err(AxisAngleError::ZeroMagnitudeAxis);
        }
        self.axis = axis.normalize();
        Ok(())
    }

    pub fn set_identity(&mut self) {
        *self = Self::IDENTITY;
    }
}

impl<U: RotationUsage> Default for AxisAngle<U> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> RotationTrait for AxisAngle<U> {
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
        Self { angle: -self.angle, axis: self.axis, usage: PhantomData }
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> Mul<AxisAngle<U>> for AxisAngle<U> {
    type Output = Self;

    /// Composes two rotations via the unit quaternion lift.
    fn mul(self, rhs: AxisAngle<U>) -> Self::Output {
        Self::from(&(RotationQuaternion::from(&self) * RotationQuaternion::from(&rhs)))
    }
}

impl<U: RotationUsage> From<&RotationQuaternion<U>> for AxisAngle<U> {
    /// Extracts angle and axis from the stored quaternion. The quaternion
    /// sign is flipped first when the scalar part is negative so the
    /// extracted angle lies in [0, pi].
    fn from(quat: &RotationQuaternion<U>) -> Self {
        let q = quat.to_implementation();
        let q = if q.w < 0.0 { -q } else { q };
        let v = Vector3::new(q.x, q.y, q.z);
        let vn = v.norm();
        if vn < 1e-12 {
            return Self::IDENTITY;
        }
        Self { angle: 2.0 * vn.atan2(q.w), axis: v / vn, usage: PhantomData }
    }
}

impl<U: RotationUsage> From<&RotationVector<U>> for AxisAngle<U> {
    /// The norm of a rotation vector is its angle. A vector below `1e-12`
    /// norm has no usable direction and degenerates to the identity
    /// convention, zero angle about the unit x axis.
    fn from(rotation_vector: &RotationVector<U>) -> Self {
        let v = rotation_vector.to_implementation();
        let angle = v.norm();
        if angle < 1e-12 {
            return Self::IDENTITY;
        }
        Self { angle, axis: v / angle, usage: PhantomData }
    }
}

impl<U: RotationUsage> From<&EulerAnglesZyx<U>> for AxisAngle<U> {
    fn from(euler: &EulerAnglesZyx<U>) -> Self {
        Self::from(&RotationQuaternion::from(euler))
    }
}

impl<U: RotationUsage> From<&EulerAnglesXyz<U>> for AxisAngle<U> {
    fn from(euler: &EulerAnglesXyz<U>) -> Self {
        Self::from(&RotationQuaternion::from(euler))
    }
}

impl<U: RotationUsage> From<&RotationMatrix<U>> for AxisAngle<U> {
    fn from(matrix: &RotationMatrix<U>) -> Self {
        Self::from(&RotationQuaternion::from(matrix))
    }
}

impl<U: RotationUsage> From<&Rotation<U>> for AxisAngle<U> {
    fn from(rotation: &Rotation<U>) -> Self {
        match rotation {
            Rotation::AxisAngle(v) => *v,
            Rotation::EulerAnglesZyx(v) => Self::from(v),
            Rotation::EulerAnglesXyz(v) => Self::from(v),
            Rotation::RotationVector(v) => Self::from(v),
            Rotation::Quaternion(v) => Self::from(v),
            Rotation::RotationMatrix(v) => Self::from(v),
        }
    }
}
