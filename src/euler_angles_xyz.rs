use std::fmt;
use std::marker::PhantomData;
use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis_angle::AxisAngle;
use crate::euler_angles_zyx::{inverse_ypr, unique_euler, EulerAnglesZyx};
use crate::quaternion::RotationQuaternion;
use crate::rotation_matrix::RotationMatrix;
use crate::rotation_vector::RotationVector;
use crate::usage::{Active, RotationUsage};
use crate::{Rotation, RotationTrait};

/// Euler angles in the fixed-axis x-y-z (roll-pitch-yaw) order.
///
/// The payload is ordered `[roll, pitch, yaw]`. The angles are applied about
/// the fixed x, then y, then z axes, which makes this type the exact
/// axis-order remap of [`EulerAnglesZyx`]: both encode the rotation
/// `Rz(yaw) * Ry(pitch) * Rx(roll)`, so converting between the two reverses
/// the payload and touches no trigonometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAnglesXyz<U: RotationUsage = Active> {
    xyz: Vector3<f64>,
    usage: PhantomData<U>,
}

/// Roll-pitch-yaw, the conventional name for the fixed-axis XYZ order.
pub type EulerAnglesRpy<U = Active> = EulerAnglesXyz<U>;

impl<U: RotationUsage> EulerAnglesXyz<U> {
    pub const IDENTITY: Self = Self { xyz: Vector3::new(0.0, 0.0, 0.0), usage: PhantomData };

    /// Creates a new rotation from nominal roll, pitch and yaw angles in radians.
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::from_vector(Vector3::new(roll, pitch, yaw))
    }

    /// Creates a new rotation from a nominal `[roll, pitch, yaw]` triple.
    pub fn from_vector(xyz: Vector3<f64>) -> Self {
        Self { xyz: xyz * U::SIGN, usage: PhantomData }
    }

    /// Creates a rotation directly from a stored payload, no sign convention applied.
    pub fn from_implementation(xyz: Vector3<f64>) -> Self {
        Self { xyz, usage: PhantomData }
    }

    /// Returns the stored `[roll, pitch, yaw]` payload.
    pub fn to_implementation(&self) -> Vector3<f64> {
        self.xyz
    }

    /// Element-wise cast of a single precision stored payload.
    pub fn from_f32(xyz: Vector3<f32>) -> Self {
        Self::from_implementation(xyz.cast::<f64>())
    }

    /// Element-wise cast of the stored payload to single precision.
    pub fn to_f32_implementation(&self) -> Vector3<f32> {
        self.xyz.cast::<f32>()
    }

    /// Roll angle, the first rotation about the fixed x axis.
    pub fn roll(&self) -> f64 {
        U::SIGN * self.xyz[0]
    }

    /// Pitch angle, the second rotation about the fixed y axis.
    pub fn pitch(&self) -> f64 {
        U::SIGN * self.xyz[1]
    }

    /// Yaw angle, the third rotation about the fixed z axis.
    pub fn yaw(&self) -> f64 {
        U::SIGN * self.xyz[2]
    }

    pub fn set_roll(&mut self, roll: f64) {
        self.xyz[0] = U::SIGN * roll;
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.xyz[1] = U::SIGN * pitch;
    }

    pub fn set_yaw(&mut self, yaw: f64) {
        self.xyz[2] = U::SIGN * yaw;
    }

    /// Axis alias for roll.
    pub fn x(&self) -> f64 {
        self.roll()
    }

    /// Axis alias for pitch.
    pub fn y(&self) -> f64 {
        self.pitch()
    }

    /// Axis alias for yaw.
    pub fn z(&self) -> f64 {
        self.yaw()
    }

    pub fn set_x(&mut self, x: f64) {
        self.set_roll(x);
    }

    pub fn set_y(&mut self, y: f64) {
        self.set_pitch(y);
    }

    pub fn set_z(&mut self, z: f64) {
        self.set_yaw(z);
    }

    /// Resets to the identity rotation.
    pub fn set_identity(&mut self) {
        self.xyz = Vector3::zeros();
    }

    /// Returns the canonical representative, with roll in [-pi, pi), pitch
    /// in [-pi/2, pi/2] and yaw in [-pi, pi).
    ///
    /// The double-cover remap is the same as for the ZYX order with the
    /// outer angles swapped, so the shared helper applies unchanged.
    pub fn get_unique(&self) -> Self {
        let (roll, pitch, yaw) = unique_euler(self.roll(), self.pitch(), self.yaw());
        Self::new(roll, pitch, yaw)
    }

    /// Canonicalizes in place.
    pub fn set_unique(&mut self) {
        *self = self.get_unique();
    }
}

impl<U: RotationUsage> RotationTrait for EulerAnglesXyz<U> {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationQuaternion::from(self).rotate(v)
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationQuaternion::from(self).transform(v)
    }

    fn rotate_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        RotationMatrix::from(self).to_implementation() * m
    }

    /// Closed-form inverse through the shared inverse-ypr relation.
    fn inv(&self) -> Self {
        let xyz = self.xyz * U::SIGN;
        let (yaw, pitch, roll) = inverse_ypr(xyz[2], xyz[1], xyz[0]);
        Self::from_vector(Vector3::new(roll, pitch, yaw))
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> Mul<EulerAnglesXyz<U>> for EulerAnglesXyz<U> {
    type Output = Self;

    /// Composes two rotations via the unit quaternion lift.
    fn mul(self, rhs: EulerAnglesXyz<U>) -> Self::Output {
        Self::from(&(RotationQuaternion::from(&self) * RotationQuaternion::from(&rhs)))
    }
}

impl<U: RotationUsage> fmt::Display for EulerAnglesXyz<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.xyz[0], self.xyz[1], self.xyz[2])
    }
}

impl<U: RotationUsage> From<&EulerAnglesZyx<U>> for EulerAnglesXyz<U> {
    /// Axis-order remap: the ZYX payload read backwards.
    fn from(zyx: &EulerAnglesZyx<U>) -> Self {
        let ypr = zyx.to_implementation();
        Self::from_implementation(Vector3::new(ypr[2], ypr[1], ypr[0]))
    }
}

impl<U: RotationUsage> From<&RotationQuaternion<U>> for EulerAnglesXyz<U> {
    fn from(quat: &RotationQuaternion<U>) -> Self {
        Self::from(&EulerAnglesZyx::from(quat))
    }
}

impl<U: RotationUsage> From<&RotationMatrix<U>> for EulerAnglesXyz<U> {
    fn from(matrix: &RotationMatrix<U>) -> Self {
        Self::from(&EulerAnglesZyx::from(matrix))
    }
}

impl<U: RotationUsage> From<&AxisAngle<U>> for EulerAnglesXyz<U> {
    fn from(axis_angle: &AxisAngle<U>) -> Self {
        Self::from(&EulerAnglesZyx::from(axis_angle))
    }
}

impl<U: RotationUsage> From<&RotationVector<U>> for EulerAnglesXyz<U> {
    fn from(rotation_vector: &RotationVector<U>) -> Self {
        Self::from(&EulerAnglesZyx::from(rotation_vector))
    }
}

impl<U: RotationUsage> From<&Rotation<U>> for EulerAnglesXyz<U> {
    fn from(rotation: &Rotation<U>) -> Self {
        match rotation {
            Rotation::EulerAnglesXyz(v) => *v,
            Rotation::EulerAnglesZyx(v) => Self::from(v),
            Rotation::AxisAngle(v) => Self::from(v),
            Rotation::RotationVector(v) => Self::from(v),
            Rotation::Quaternion(v) => Self::from(v),
            Rotation::RotationMatrix(v) => Self::from(v),
        }
    }
}
