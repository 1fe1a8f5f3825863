use std::fmt;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::marker::PhantomData;
use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis_angle::AxisAngle;
use crate::euler_angles_xyz::EulerAnglesXyz;
use crate::quaternion::RotationQuaternion;
use crate::rotation_matrix::RotationMatrix;
use crate::rotation_vector::RotationVector;
use crate::usage::{Active, RotationUsage};
use crate::{Rotation, RotationTrait, GIMBAL_EPS};

/// Euler angles in the intrinsic Z-Y'-X'' (yaw-pitch-roll) sequence.
///
/// The payload is ordered `[yaw, pitch, roll]`. Angles are unrestricted
/// until canonicalized with [`EulerAnglesZyx::get_unique`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAnglesZyx<U: RotationUsage = Active> {
    zyx: Vector3<f64>,
    usage: PhantomData<U>,
}

/// Yaw-pitch-roll, the conventional name for the ZYX sequence.
pub type EulerAnglesYpr<U = Active> = EulerAnglesZyx<U>;

/// Wraps an angle into [-pi, pi).
pub(crate) fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Canonicalizes an Euler triple whose middle angle is the pitch-like one.
///
/// Wraps all three angles into [-pi, pi), then resolves the double cover:
/// a triple with |pitch| beyond pi/2 maps to the equivalent triple with the
/// outer angles shifted by pi and the pitch reflected. The published remap
/// oscillates at exactly pitch = pi/2, so that gimbal point is pinned by
/// attributing the whole degenerate rotation to the first angle.
///
/// Resulting ranges: first in [-pi, pi), middle in [-pi/2, pi/2], last in
/// [-pi, pi).
pub(crate) fn unique_euler(first: f64, middle: f64, last: f64) -> (f64, f64, f64) {
    let mut first = wrap_angle(first);
    let mut middle = wrap_angle(middle);
    let mut last = wrap_angle(last);

    if middle >= FRAC_PI_2 {
        first += if first >= 0.0 { -PI } else { PI };
        middle = -(middle - PI);
        last += if last >= 0.0 { -PI } else { PI };
    } else if middle < -FRAC_PI_2 {
        first += if first >= 0.0 { -PI } else { PI };
        middle = -(middle + PI);
        last += if last >= 0.0 { -PI } else { PI };
    }

    if middle >= FRAC_PI_2 {
        // gimbal fixed point, only first - last is observable
        first = wrap_angle(first - last);
        last = 0.0;
    }

    (first, middle, last)
}

/// Closed-form ZYX triple of the inverse rotation.
///
/// Extracts the angles of the transposed rotation matrix algebraically from
/// the sines and cosines of the input triple, with the usual guarded branch
/// when the inverse sits at the gimbal singularity.
pub(crate) fn inverse_ypr(yaw: f64, pitch: f64, roll: f64) -> (f64, f64, f64) {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sr, cr) = roll.sin_cos();

    // elements of R(yaw, pitch, roll) transposed
    let sin_pitch_inv = cy * sp * cr + sy * sr;
    if sin_pitch_inv.abs() >= 1.0 - GIMBAL_EPS {
        let yaw_inv = (-sy * cp).atan2(sy * sp * sr + cy * cr);
        let pitch_inv = -FRAC_PI_2.copysign(sin_pitch_inv);
        (yaw_inv, pitch_inv, 0.0)
    } else {
        let yaw_inv = (cy * sp * sr - sy * cr).atan2(cy * cp);
        let pitch_inv = -sin_pitch_inv.clamp(-1.0, 1.0).asin();
        let roll_inv = (sy * sp * cr - cy * sr).atan2(cp * cr);
        (yaw_inv, pitch_inv, roll_inv)
    }
}

impl<U: RotationUsage> EulerAnglesZyx<U> {
    pub const IDENTITY: Self = Self { zyx: Vector3::new(0.0, 0.0, 0.0), usage: PhantomData };

    /// Creates a new rotation from nominal yaw, pitch and roll angles in radians.
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self::from_vector(Vector3::new(yaw, pitch, roll))
    }

    /// Creates a new rotation from a nominal `[yaw, pitch, roll]` triple.
    pub fn from_vector(zyx: Vector3<f64>) -> Self {
        Self { zyx: zyx * U::SIGN, usage: PhantomData }
    }

    /// Creates a rotation directly from a stored payload, no sign convention applied.
    pub fn from_implementation(zyx: Vector3<f64>) -> Self {
        Self { zyx, usage: PhantomData }
    }

    /// Returns the stored `[yaw, pitch, roll]` payload.
    pub fn to_implementation(&self) -> Vector3<f64> {
        self.zyx
    }

    /// Element-wise cast of a single precision stored payload.
    pub fn from_f32(zyx: Vector3<f32>) -> Self {
        Self::from_implementation(zyx.cast::<f64>())
    }

    /// Element-wise cast of the stored payload to single precision.
    pub fn to_f32_implementation(&self) -> Vector3<f32> {
        self.zyx.cast::<f32>()
    }

    /// Yaw angle, the first rotation about Z.
    pub fn yaw(&self) -> f64 {
        U::SIGN * self.zyx[0]
    }

    /// Pitch angle, the second rotation about Y'.
    pub fn pitch(&self) -> f64 {
        U::SIGN * self.zyx[1]
    }

    /// Roll angle, the third rotation about X''.
    pub fn roll(&self) -> f64 {
        U::SIGN * self.zyx[2]
    }

    pub fn set_yaw(&mut self, yaw: f64) {
        self.zyx[0] = U::SIGN * yaw;
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.zyx[1] = U::SIGN * pitch;
    }

    pub fn set_roll(&mut self, roll: f64) {
        self.zyx[2] = U::SIGN * roll;
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

    /// Resets to the identity rotation. The zero triple is usage independent.
    pub fn set_identity(&mut self) {
        self.zyx = Vector3::zeros();
    }

    /// Returns the canonical representative among the triples encoding this
    /// rotation, with yaw in [-pi, pi), pitch in [-pi/2, pi/2] and roll in
    /// [-pi, pi).
    ///
    /// Operates on the nominal angles, so the result is sign-correct for
    /// both usages without separate casing.
    pub fn get_unique(&self) -> Self {
        let (yaw, pitch, roll) = unique_euler(self.yaw(), self.pitch(), self.roll());
        Self::new(yaw, pitch, roll)
    }

    /// Canonicalizes in place.
    pub fn set_unique(&mut self) {
        *self = self.get_unique();
    }
}

impl<U: RotationUsage> RotationTrait for EulerAnglesZyx<U> {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationQuaternion::from(self).rotate(v)
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationQuaternion::from(self).transform(v)
    }

    fn rotate_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        RotationMatrix::from(self).to_implementation() * m
    }

    /// Closed-form inverse, never a generic matrix inverse.
    fn inv(&self) -> Self {
        let zyx = self.zyx * U::SIGN;
        let (yaw, pitch, roll) = inverse_ypr(zyx[0], zyx[1], zyx[2]);
        Self::from_vector(Vector3::new(yaw, pitch, roll))
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> Mul<EulerAnglesZyx<U>> for EulerAnglesZyx<U> {
    type Output = Self;

    /// Composes two rotations by lifting both operands to unit quaternions,
    /// multiplying, and lowering the product back.
    fn mul(self, rhs: EulerAnglesZyx<U>) -> Self::Output {
        Self::from(&(RotationQuaternion::from(&self) * RotationQuaternion::from(&rhs)))
    }
}

impl<U: RotationUsage> fmt::Display for EulerAnglesZyx<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.zyx[0], self.zyx[1], self.zyx[2])
    }
}

impl<U: RotationUsage> From<&RotationQuaternion<U>> for EulerAnglesZyx<U> {
    /// Extracts yaw, pitch and roll with the atan2 based closed form. Near
    /// pitch = +-pi/2 the extraction degenerates; the guarded branch
    /// attributes the remaining rotation to yaw and zeroes the roll.
    fn from(quat: &RotationQuaternion<U>) -> Self {
        // undo the conjugate storage so the extraction sees the nominal rotation
        let q = quat.to_implementation();
        let (x, y, z, w) = (U::SIGN * q.x, U::SIGN * q.y, U::SIGN * q.z, q.w);

        let sin_pitch = 2.0 * (w * y - x * z);
        let zyx = if sin_pitch.abs() >= 1.0 - GIMBAL_EPS {
            let yaw = 2.0 * z.atan2(w);
            let pitch = FRAC_PI_2.copysign(sin_pitch);
            Vector3::new(yaw, pitch, 0.0)
        } else {
            let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
            let pitch = sin_pitch.clamp(-1.0, 1.0).asin();
            let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
            Vector3::new(yaw, pitch, roll)
        };
        Self::from_vector(zyx)
    }
}

impl<U: RotationUsage> From<&RotationMatrix<U>> for EulerAnglesZyx<U> {
    /// Extracts yaw, pitch and roll from the matrix elements, with the same
    /// guarded gimbal branch as the quaternion extraction.
    fn from(matrix: &RotationMatrix<U>) -> Self {
        // the nominal matrix, not the stored one: passive storage transposes
        let m = matrix.matrix();

        let zyx = if m[(2, 0)].abs() >= 1.0 - GIMBAL_EPS {
            let yaw = (-m[(0, 1)]).atan2(m[(1, 1)]);
            let pitch = -FRAC_PI_2.copysign(m[(2, 0)]);
            Vector3::new(yaw, pitch, 0.0)
        } else {
            let yaw = m[(1, 0)].atan2(m[(0, 0)]);
            let pitch = -m[(2, 0)].clamp(-1.0, 1.0).asin();
            let roll = m[(2, 1)].atan2(m[(2, 2)]);
            Vector3::new(yaw, pitch, roll)
        };
        Self::from_vector(zyx)
    }
}

impl<U: RotationUsage> From<&AxisAngle<U>> for EulerAnglesZyx<U> {
    /// Closed form through the Rodrigues matrix elements, computed inline
    /// without constructing an intermediate matrix value.
    fn from(axis_angle: &AxisAngle<U>) -> Self {
        let (angle, axis) = axis_angle.to_implementation();
        // nominal angle: the stored one is negated for passive values
        let (s, c) = (U::SIGN * angle).sin_cos();
        let t = 1.0 - c;
        let (ax, ay, az) = (axis[0], axis[1], axis[2]);

        let r00 = c + ax * ax * t;
        let r10 = ax * ay * t + az * s;
        let r20 = ax * az * t - ay * s;
        let r21 = ay * az * t + ax * s;
        let r22 = c + az * az * t;

        let zyx = if r20.abs() >= 1.0 - GIMBAL_EPS {
            let r01 = ax * ay * t - az * s;
            let r11 = c + ay * ay * t;
            let yaw = (-r01).atan2(r11);
            let pitch = -FRAC_PI_2.copysign(r20);
            Vector3::new(yaw, pitch, 0.0)
        } else {
            let yaw = r10.atan2(r00);
            let pitch = -r20.clamp(-1.0, 1.0).asin();
            let roll = r21.atan2(r22);
            Vector3::new(yaw, pitch, roll)
        };
        Self::from_vector(zyx)
    }
}

impl<U: RotationUsage> From<&RotationVector<U>> for EulerAnglesZyx<U> {
    /// Normalizes to an axis-angle pair first; the zero guard lives in that
    /// conversion.
    fn from(rotation_vector: &RotationVector<U>) -> Self {
        Self::from(&AxisAngle::from(rotation_vector))
    }
}

impl<U: RotationUsage> From<&EulerAnglesXyz<U>> for EulerAnglesZyx<U> {
    /// Axis-order remap: the fixed-axis XYZ payload read backwards.
    fn from(xyz: &EulerAnglesXyz<U>) -> Self {
        let rpy = xyz.to_implementation();
        Self::from_implementation(Vector3::new(rpy[2], rpy[1], rpy[0]))
    }
}

impl<U: RotationUsage> From<&Rotation<U>> for EulerAnglesZyx<U> {
    fn from(rotation: &Rotation<U>) -> Self {
        match rotation {
            Rotation::EulerAnglesZyx(v) => *v,
            Rotation::EulerAnglesXyz(v) => Self::from(v),
            Rotation::AxisAngle(v) => Self::from(v),
            Rotation::RotationVector(v) => Self::from(v),
            Rotation::Quaternion(v) => Self::from(v),
            Rotation::RotationMatrix(v) => Self::from(v),
        }
    }
}
