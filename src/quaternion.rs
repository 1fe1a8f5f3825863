use std::fmt;
use std::marker::PhantomData;
use std::ops::{Mul, Neg};

use nalgebra::{Vector3, Vector4};
use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::axis_angle::AxisAngle;
use crate::euler_angles_xyz::EulerAnglesXyz;
use crate::euler_angles_zyx::EulerAnglesZyx;
use crate::rotation_matrix::RotationMatrix;
use crate::rotation_vector::RotationVector;
use crate::usage::{Active, RotationUsage};
use crate::{Rotation, RotationTrait};

/// Errors that can occur when creating a unit quaternion.
#[derive(Debug, Clone, Error, Copy)]
pub enum QuaternionError {
    #[error("got zero magnitude quaternion")]
    ZeroMagnitude,
}

/// A raw quaternion over the numeric substrate.
///
/// Carries no rotation semantics of its own; [`RotationQuaternion`] wraps it
/// with the unit-norm invariant and the usage tag.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Dot product of two quaternions.
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn mag(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Conjugate. Equals the inverse for a unit quaternion.
    pub fn conj(&self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn normalize(&self) -> Result<Self, QuaternionError> {
        let mag = self.mag();
        if mag < f64::EPSILON {
            return Err(QuaternionError::ZeroMagnitude);
        }
        Ok(Quaternion::new(
            self.x / mag,
            self.y / mag,
            self.z / mag,
            self.w / mag,
        ))
    }

    /// Creates a random quaternion with components sampled in [-1, 1).
    pub fn rand() -> Quaternion {
        let mut rng = rng();
        let x = rng.random_range(-1.0..1.0);
        let y = rng.random_range(-1.0..1.0);
        let z = rng.random_range(-1.0..1.0);
        let w = rng.random_range(-1.0..1.0);

        Quaternion::new(x, y, z, w)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;

    /// Hamilton product. Composing rotations with unit quaternions,
    /// `(a * b)` applies `b` first and then `a`, matching the product of
    /// the corresponding rotation matrices.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y + self.y * rhs.w + self.z * rhs.x - self.x * rhs.z,
            self.w * rhs.z + self.z * rhs.w + self.x * rhs.y - self.y * rhs.x,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<f64> for Quaternion {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl From<Vector4<f64>> for Quaternion {
    fn from(q: Vector4<f64>) -> Self {
        Self { x: q[0], y: q[1], z: q[2], w: q[3] }
    }
}

impl fmt::Debug for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quaternion ")?;
        writeln!(f, "   x: {: >10.6}", self.x)?;
        writeln!(f, "   y: {: >10.6}", self.y)?;
        writeln!(f, "   z: {: >10.6}", self.z)?;
        writeln!(f, "   w: {: >10.6}", self.w)
    }
}

/// A unit quaternion with a usage tag, the pivot representation of the
/// conversion engine.
///
/// For `Passive` usage the stored quaternion is the conjugate of the nominal
/// one, so the stored payload always encodes the same mapping as the stored
/// payload of every other representation with the same tag.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationQuaternion<U: RotationUsage = Active> {
    q: Quaternion,
    usage: PhantomData<U>,
}

impl<U: RotationUsage> RotationQuaternion<U> {
    pub const IDENTITY: Self = Self { q: Quaternion::IDENTITY, usage: PhantomData };

    /// Creates a normalized rotation quaternion from nominal components.
    ///
    /// # Errors
    ///
    /// Returns `QuaternionError::ZeroMagnitude` if all components are zero.
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Result<Self, QuaternionError> {
        let q = Quaternion::new(U::SIGN * x, U::SIGN * y, U::SIGN * z, w).normalize()?;
        Ok(Self { q, usage: PhantomData })
    }

    /// Creates a rotation quaternion directly from a stored payload.
    pub fn from_implementation(q: Quaternion) -> Result<Self, QuaternionError> {
        Ok(Self { q: q.normalize()?, usage: PhantomData })
    }

    /// Returns the stored payload.
    pub fn to_implementation(&self) -> Quaternion {
        self.q
    }

    /// Element-wise cast of a single precision stored payload, ordered (x, y, z, w).
    pub fn from_f32(q: Vector4<f32>) -> Result<Self, QuaternionError> {
        Self::from_implementation(Quaternion::from(q.cast::<f64>()))
    }

    /// Element-wise cast of the stored payload to single precision, ordered (x, y, z, w).
    pub fn to_f32_implementation(&self) -> Vector4<f32> {
        Vector4::new(self.q.x, self.q.y, self.q.z, self.q.w).cast::<f32>()
    }

    pub fn x(&self) -> f64 {
        U::SIGN * self.q.x
    }

    pub fn y(&self) -> f64 {
        U::SIGN * self.q.y
    }

    pub fn z(&self) -> f64 {
        U::SIGN * self.q.z
    }

    pub fn w(&self) -> f64 {
        self.q.w
    }

    pub fn set_identity(&mut self) {
        self.q = Quaternion::IDENTITY;
    }

    /// Geodesic angle between the rotations encoded by `self` and `other`.
    ///
    /// Computed with atan2 on the relative quaternion rather than acos of
    /// the dot product, which stays accurate for nearly identical rotations
    /// where acos would amplify rounding in the saturated dot product.
    pub fn angle_to(&self, other: &Self) -> f64 {
        let d = self.q * other.q.conj();
        let vn = Vector3::new(d.x, d.y, d.z).norm();
        2.0 * vn.atan2(d.w.abs())
    }

    /// Creates a random unit quaternion.
    ///
    /// # Errors
    ///
    /// Returns `QuaternionError::ZeroMagnitude` in the (practically
    /// impossible) event that all sampled components are zero.
    pub fn rand() -> Result<Self, QuaternionError> {
        Self::from_implementation(Quaternion::rand())
    }
}

impl<U: RotationUsage> Default for RotationQuaternion<U> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> Mul<RotationQuaternion<U>> for RotationQuaternion<U> {
    type Output = Self;

    /// Composes two rotations by the Hamilton product of the stored payloads.
    fn mul(self, rhs: RotationQuaternion<U>) -> Self::Output {
        Self { q: self.q * rhs.q, usage: PhantomData }
    }
}

impl<U: RotationUsage> RotationTrait for RotationQuaternion<U> {
    /// Rotates a vector by the stored rotation:
    /// `v' = v + 2w(u x v) + 2u x (u x v)` with `u` the vector part.
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let u = Vector3::new(self.q.x, self.q.y, self.q.z);
        let uv = u.cross(v);
        v + uv * (2.0 * self.q.w) + u.cross(&uv) * 2.0
    }

    /// Transforms a vector by the inverse of the stored rotation.
    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let u = Vector3::new(self.q.x, self.q.y, self.q.z);
        let uv = u.cross(v);
        v - uv * (2.0 * self.q.w) + u.cross(&uv) * 2.0
    }

    fn rotate_matrix(&self, m: &nalgebra::Matrix3<f64>) -> nalgebra::Matrix3<f64> {
        RotationMatrix::from(self).to_implementation() * m
    }

    fn inv(&self) -> Self {
        // no renormalization needed, conjugation preserves the norm
        Self { q: self.q.conj(), usage: PhantomData }
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> From<&EulerAnglesZyx<U>> for RotationQuaternion<U> {
    /// Converts ZYX Euler angles via the half-angle product formula.
    /// Reference: Markley & Crassidis, Fundamentals of Spacecraft Attitude
    /// Determination and Control.
    fn from(euler: &EulerAnglesZyx<U>) -> Self {
        // negating a ZYX triple does not invert the rotation, so recover the
        // nominal angles first and conjugate on the way out for passive values
        let zyx = euler.to_implementation() * U::SIGN;
        let (sy, cy) = (zyx[0] / 2.0).sin_cos();
        let (sp, cp) = (zyx[1] / 2.0).sin_cos();
        let (sr, cr) = (zyx[2] / 2.0).sin_cos();

        let x = sr * cp * cy - cr * sp * sy;
        let y = cr * sp * cy + sr * cp * sy;
        let z = cr * cp * sy - sr * sp * cy;
        let w = cr * cp * cy + sr * sp * sy;

        Self {
            q: Quaternion::new(U::SIGN * x, U::SIGN * y, U::SIGN * z, w),
            usage: PhantomData,
        }
    }
}

impl<U: RotationUsage> From<&EulerAnglesXyz<U>> for RotationQuaternion<U> {
    /// Fixed-axis XYZ angles are the axis-order remap of ZYX.
    fn from(euler: &EulerAnglesXyz<U>) -> Self {
        Self::from(&EulerAnglesZyx::from(euler))
    }
}

impl<U: RotationUsage> From<&AxisAngle<U>> for RotationQuaternion<U> {
    fn from(axis_angle: &AxisAngle<U>) -> Self {
        let (angle, axis) = axis_angle.to_implementation();
        let (s, c) = (angle / 2.0).sin_cos();
        Self {
            q: Quaternion::new(s * axis[0], s * axis[1], s * axis[2], c),
            usage: PhantomData,
        }
    }
}

impl<U: RotationUsage> From<&RotationVector<U>> for RotationQuaternion<U> {
    fn from(rotation_vector: &RotationVector<U>) -> Self {
        Self::from(&AxisAngle::from(rotation_vector))
    }
}

impl<U: RotationUsage> From<&RotationMatrix<U>> for RotationQuaternion<U> {
    /// Converts a rotation matrix by Shepperd's method: branch on the trace
    /// or the dominant diagonal element so the divisor stays well away from
    /// zero for every proper rotation.
    fn from(matrix: &RotationMatrix<U>) -> Self {
        let m = matrix.to_implementation();
        let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];

        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quaternion::new(
                (m[(2, 1)] - m[(1, 2)]) / s,
                (m[(0, 2)] - m[(2, 0)]) / s,
                (m[(1, 0)] - m[(0, 1)]) / s,
                0.25 * s,
            )
        } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
            let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0;
            Quaternion::new(
                0.25 * s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(2, 1)] - m[(1, 2)]) / s,
            )
        } else if m[(1, 1)] > m[(2, 2)] {
            let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0;
            Quaternion::new(
                (m[(0, 1)] + m[(1, 0)]) / s,
                0.25 * s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                (m[(0, 2)] - m[(2, 0)]) / s,
            )
        } else {
            let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0;
            Quaternion::new(
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                0.25 * s,
                (m[(1, 0)] - m[(0, 1)]) / s,
            )
        };

        // keep the scalar part non-negative, q and -q encode the same rotation
        let q = if q.w < 0.0 { -q } else { q };
        // safe for an orthonormal matrix
        let q = q.normalize().unwrap();
        Self { q, usage: PhantomData }
    }
}

impl<U: RotationUsage> From<&Rotation<U>> for RotationQuaternion<U> {
    fn from(rotation: &Rotation<U>) -> Self {
        match rotation {
            Rotation::Quaternion(v) => *v,
            Rotation::EulerAnglesZyx(v) => Self::from(v),
            Rotation::EulerAnglesXyz(v) => Self::from(v),
            Rotation::AxisAngle(v) => Self::from(v),
            Rotation::RotationVector(v) => Self::from(v),
            Rotation::RotationMatrix(v) => Self::from(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::Passive;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
    const TOL: f64 = 1e-12;

    #[test]
    fn test_quaternion_normalization() {
        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0).normalize().unwrap();

        assert_abs_diff_eq!(q.x, 0.18257418583505536, epsilon = TOL);
        assert_abs_diff_eq!(q.y, 0.3651483716701107, epsilon = TOL);
        assert_abs_diff_eq!(q.z, 0.5477225575051661, epsilon = TOL);
        assert_abs_diff_eq!(q.w, 0.7302967433402214, epsilon = TOL);
    }

    #[test]
    fn test_zero_quaternion_rejected() {
        assert!(RotationQuaternion::<Active>::new(0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_quaternion_conjugate() {
        let q = Quaternion::rand();
        let conj = q.conj();
        assert_abs_diff_eq!(conj.w, q.w, epsilon = TOL);
        assert_abs_diff_eq!(conj.x, -q.x, epsilon = TOL);
        assert_abs_diff_eq!(conj.y, -q.y, epsilon = TOL);
        assert_abs_diff_eq!(conj.z, -q.z, epsilon = TOL);
    }

    #[test]
    fn test_hamilton_product() {
        // qz(90) * qx(90) = (0.5, 0.5, 0.5, 0.5)
        let qz = RotationQuaternion::<Active>::new(0.0, 0.0, FRAC_PI_4.sin(), FRAC_PI_4.cos())
            .unwrap();
        let qx = RotationQuaternion::<Active>::new(FRAC_PI_4.sin(), 0.0, 0.0, FRAC_PI_4.cos())
            .unwrap();
        let q = (qz * qx).to_implementation();

        assert_abs_diff_eq!(q.x, 0.5, epsilon = TOL);
        assert_abs_diff_eq!(q.y, 0.5, epsilon = TOL);
        assert_abs_diff_eq!(q.z, 0.5, epsilon = TOL);
        assert_abs_diff_eq!(q.w, 0.5, epsilon = TOL);
    }

    #[test]
    fn test_composition_matches_sequential_rotation() {
        let a = RotationQuaternion::<Active>::rand().unwrap();
        let b = RotationQuaternion::<Active>::rand().unwrap();
        let v = Vector3::new(0.3, -1.2, 2.5);

        let composed = (a * b).rotate(&v);
        let sequential = a.rotate(&b.rotate(&v));

        assert_abs_diff_eq!(composed[0], sequential[0], epsilon = TOL);
        assert_abs_diff_eq!(composed[1], sequential[1], epsilon = TOL);
        assert_abs_diff_eq!(composed[2], sequential[2], epsilon = TOL);
    }

    #[test]
    fn test_rotate_about_z() {
        let q = RotationQuaternion::<Active>::from(&EulerAnglesZyx::new(FRAC_PI_2, 0.0, 0.0));
        let v = Vector3::new(1.0, 0.0, 0.0);
        let result = q.rotate(&v);

        assert_abs_diff_eq!(result[0], 0.0, epsilon = TOL);
        assert_abs_diff_eq!(result[1], 1.0, epsilon = TOL);
        assert_abs_diff_eq!(result[2], 0.0, epsilon = TOL);
    }

    #[test]
    fn test_transform_is_inverse_rotate() {
        let q = RotationQuaternion::<Active>::rand().unwrap();
        let v = Vector3::new(-0.4, 0.9, 1.7);
        let back = q.transform(&q.rotate(&v));

        assert_abs_diff_eq!(back[0], v[0], epsilon = TOL);
        assert_abs_diff_eq!(back[1], v[1], epsilon = TOL);
        assert_abs_diff_eq!(back[2], v[2], epsilon = TOL);
    }

    #[test]
    fn test_passive_stores_conjugate() {
        let a = RotationQuaternion::<Active>::new(0.1, 0.2, 0.3, 0.9).unwrap();
        let p = RotationQuaternion::<Passive>::new(0.1, 0.2, 0.3, 0.9).unwrap();

        let qa = a.to_implementation();
        let qp = p.to_implementation();
        assert_abs_diff_eq!(qp.x, -qa.x, epsilon = TOL);
        assert_abs_diff_eq!(qp.y, -qa.y, epsilon = TOL);
        assert_abs_diff_eq!(qp.z, -qa.z, epsilon = TOL);
        assert_abs_diff_eq!(qp.w, qa.w, epsilon = TOL);

        // nominal accessors agree between the two usages
        assert_abs_diff_eq!(p.x(), a.x(), epsilon = TOL);
        assert_abs_diff_eq!(p.y(), a.y(), epsilon = TOL);
        assert_abs_diff_eq!(p.z(), a.z(), epsilon = TOL);
        assert_abs_diff_eq!(p.w(), a.w(), epsilon = TOL);
    }

    #[test]
    fn test_passive_composition_reverses_nominal_order() {
        let a = RotationQuaternion::<Passive>::new(0.1, -0.4, 0.3, 0.8).unwrap();
        let b = RotationQuaternion::<Passive>::new(-0.2, 0.5, 0.1, 0.9).unwrap();
        let composed = (a * b).to_implementation();

        let an = RotationQuaternion::<Active>::new(0.1, -0.4, 0.3, 0.8).unwrap();
        let bn = RotationQuaternion::<Active>::new(-0.2, 0.5, 0.1, 0.9).unwrap();
        // the stored product is the conjugate of the nominal product taken
        // in the opposite order
        let nominal = (bn * an).to_implementation().conj();

        assert_abs_diff_eq!(composed.x, nominal.x, epsilon = TOL);
        assert_abs_diff_eq!(composed.y, nominal.y, epsilon = TOL);
        assert_abs_diff_eq!(composed.z, nominal.z, epsilon = TOL);
        assert_abs_diff_eq!(composed.w, nominal.w, epsilon = TOL);
    }

    #[test]
    fn test_angle_to_is_stable_near_zero() {
        let q = RotationQuaternion::<Active>::rand().unwrap();
        assert_abs_diff_eq!(q.angle_to(&q), 0.0, epsilon = TOL);
        // a double-cover flip of the payload is still the same rotation
        let flipped = RotationQuaternion::from_implementation(-q.to_implementation()).unwrap();
        assert_abs_diff_eq!(q.angle_to(&flipped), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_from_rotation_matrix_round_trip() {
        let q = RotationQuaternion::<Active>::rand().unwrap();
        let m = RotationMatrix::from(&q);
        let back = RotationQuaternion::from(&m);

        assert!(q.angle_to(&back) < 1e-9);
    }

    #[test]
    fn test_matrix_conversion_near_trace_minus_one() {
        // 180 degree rotation about x, trace = -1, exercises the branch logic
        let e = EulerAnglesZyx::<Active>::new(0.0, 0.0, std::f64::consts::PI);
        let m = RotationMatrix::from(&e);
        let q = RotationQuaternion::from(&m).to_implementation();

        assert_abs_diff_eq!(q.x.abs(), 1.0, epsilon = TOL);
        assert_abs_diff_eq!(q.y, 0.0, epsilon = TOL);
        assert_abs_diff_eq!(q.z, 0.0, epsilon = TOL);
        assert_abs_diff_eq!(q.w, 0.0, epsilon = TOL);
    }

    #[test]
    fn test_precision_cast_round_trip() {
        let q = RotationQuaternion::<Active>::new(0.1, 0.2, 0.3, 0.9).unwrap();
        let single = q.to_f32_implementation();
        let back = RotationQuaternion::<Active>::from_f32(single).unwrap();

        assert!(q.angle_to(&back) < 1e-6);
    }
}
