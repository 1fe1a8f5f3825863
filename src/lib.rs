//! Strongly typed 3D rotation representations and conversions.
//!
//! Six interchangeable representations are provided: intrinsic Z-Y'-X'' and
//! fixed-axis x-y-z Euler angles, angle-axis, rotation vector, unit
//! quaternion and rotation matrix. Each carries a [`usage`] tag, [`Active`]
//! by default, as a type parameter; a value tagged [`Passive`] encodes the
//! inverse mapping and cannot be mixed with active values without an explicit
//! conversion. Any representation converts into any other through [`From`]
//! impls on references, and all of them compose with `*` and rotate vectors
//! through [`RotationTrait`].

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

pub mod axis_angle;
pub mod euler_angles_xyz;
pub mod euler_angles_zyx;
pub mod quaternion;
pub mod rotation_matrix;
pub mod rotation_vector;
pub mod usage;

pub use axis_angle::{AxisAngle, AxisAngleError};
pub use euler_angles_xyz::{EulerAnglesRpy, EulerAnglesXyz};
pub use euler_angles_zyx::{EulerAnglesYpr, EulerAnglesZyx};
pub use quaternion::{Quaternion, QuaternionError, RotationQuaternion};
pub use rotation_matrix::{RotationMatrix, RotationMatrixError};
pub use rotation_vector::RotationVector;
pub use usage::{Active, Passive, RotationUsage};

pub mod prelude {
    pub use crate::{
        Active, AxisAngle, EulerAnglesXyz, EulerAnglesZyx, Passive, Rotation, RotationMatrix,
        RotationQuaternion, RotationTrait, RotationVector,
    };
}

/// Threshold on the sine of the pitch-like angle below which an Euler
/// extraction switches to its guarded gimbal branch.
pub(crate) const GIMBAL_EPS: f64 = 1e-9;

/// Operations shared by every rotation representation.
pub trait RotationTrait {
    /// Rotates a vector by the stored rotation.
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64>;

    /// Transforms a vector by the inverse of the stored rotation.
    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64>;

    /// Left-multiplies a matrix by the stored rotation matrix.
    fn rotate_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64>;

    /// The inverse rotation, in the same representation.
    fn inv(&self) -> Self
    where
        Self: Sized;

    /// Inverts in place.
    fn inv_mut(&mut self)
    where
        Self: Sized,
    {
        let inv = self.inv();
        *self = inv;
    }

    /// The identity rotation.
    fn identity() -> Self
    where
        Self: Sized;
}

/// A rotation in any representation, for call sites that pick the
/// representation at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Rotation<U: RotationUsage = Active> {
    AxisAngle(AxisAngle<U>),
    EulerAnglesXyz(EulerAnglesXyz<U>),
    EulerAnglesZyx(EulerAnglesZyx<U>),
    Quaternion(RotationQuaternion<U>),
    RotationMatrix(RotationMatrix<U>),
    RotationVector(RotationVector<U>),
}

impl<U: RotationUsage> Rotation<U> {
    pub const IDENTITY: Self = Self::Quaternion(RotationQuaternion::IDENTITY);

    /// Geodesic angle to another rotation, in radians.
    pub fn angle_to(&self, other: &Self) -> f64 {
        RotationQuaternion::from(self).angle_to(&RotationQuaternion::from(other))
    }
}

impl<U: RotationUsage> Default for Rotation<U> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> From<AxisAngle<U>> for Rotation<U> {
    fn from(v: AxisAngle<U>) -> Self {
        Self::AxisAngle(v)
    }
}

impl<U: RotationUsage> From<EulerAnglesXyz<U>> for Rotation<U> {
    fn from(v: EulerAnglesXyz<U>) -> Self {
        Self::EulerAnglesXyz(v)
    }
}

impl<U: RotationUsage> From<EulerAnglesZyx<U>> for Rotation<U> {
    fn from(v: EulerAnglesZyx<U>) -> Self {
        Self::EulerAnglesZyx(v)
    }
}

impl<U: RotationUsage> From<RotationQuaternion<U>> for Rotation<U> {
    fn from(v: RotationQuaternion<U>) -> Self {
        Self::Quaternion(v)
    }
}

impl<U: RotationUsage> From<RotationMatrix<U>> for Rotation<U> {
    fn from(v: RotationMatrix<U>) -> Self {
        Self::RotationMatrix(v)
    }
}

impl<U: RotationUsage> From<RotationVector<U>> for Rotation<U> {
    fn from(v: RotationVector<U>) -> Self {
        Self::RotationVector(v)
    }
}

impl<U: RotationUsage> Mul<Rotation<U>> for Rotation<U> {
    type Output = Self;

    /// Composes two rotations. Two matrices multiply directly; every other
    /// pairing lifts both operands to unit quaternions.
    fn mul(self, rhs: Rotation<U>) -> Self::Output {
        match (self, rhs) {
            (Rotation::RotationMatrix(a), Rotation::RotationMatrix(b)) => {
                Rotation::RotationMatrix(a * b)
            }
            (a, b) => {
                Rotation::Quaternion(RotationQuaternion::from(&a) * RotationQuaternion::from(&b))
            }
        }
    }
}

impl<U: RotationUsage> RotationTrait for Rotation<U> {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Rotation::AxisAngle(r) => r.rotate(v),
            Rotation::EulerAnglesXyz(r) => r.rotate(v),
            Rotation::EulerAnglesZyx(r) => r.rotate(v),
            Rotation::Quaternion(r) => r.rotate(v),
            Rotation::RotationMatrix(r) => r.rotate(v),
            Rotation::RotationVector(r) => r.rotate(v),
        }
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Rotation::AxisAngle(r) => r.transform(v),
            Rotation::EulerAnglesXyz(r) => r.transform(v),
            Rotation::EulerAnglesZyx(r) => r.transform(v),
            Rotation::Quaternion(r) => r.transform(v),
            Rotation::RotationMatrix(r) => r.transform(v),
            Rotation::RotationVector(r) => r.transform(v),
        }
    }

    fn rotate_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        match self {
            Rotation::AxisAngle(r) => r.rotate_matrix(m),
            Rotation::EulerAnglesXyz(r) => r.rotate_matrix(m),
            Rotation::EulerAnglesZyx(r) => r.rotate_matrix(m),
            Rotation::Quaternion(r) => r.rotate_matrix(m),
            Rotation::RotationMatrix(r) => r.rotate_matrix(m),
            Rotation::RotationVector(r) => r.rotate_matrix(m),
        }
    }

    fn inv(&self) -> Self {
        match self {
            Rotation::AxisAngle(r) => Rotation::AxisAngle(r.inv()),
            Rotation::EulerAnglesXyz(r) => Rotation::EulerAnglesXyz(r.inv()),
            Rotation::EulerAnglesZyx(r) => Rotation::EulerAnglesZyx(r.inv()),
            Rotation::Quaternion(r) => Rotation::Quaternion(r.inv()),
            Rotation::RotationMatrix(r) => Rotation::RotationMatrix(r.inv()),
            Rotation::RotationVector(r) => Rotation::RotationVector(r.inv()),
        }
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;
    const TOL: f64 = 1e-9;

    fn random_rotations() -> Vec<Rotation<Active>> {
        let q = RotationQuaternion::rand().unwrap();
        vec![
            Rotation::from(AxisAngle::from(&q)),
            Rotation::from(EulerAnglesXyz::from(&q)),
            Rotation::from(EulerAnglesZyx::from(&q)),
            Rotation::from(q),
            Rotation::from(RotationMatrix::from(&q)),
            Rotation::from(RotationVector::from(&q)),
        ]
    }

    #[test]
    fn test_all_representations_encode_same_rotation() {
        for _ in 0..100 {
            let rotations = random_rotations();
            let reference = rotations[0];
            for r in &rotations {
                assert!(reference.angle_to(r) < TOL);
            }
        }
    }

    #[test]
    fn test_all_representations_rotate_alike() {
        let v = Vector3::new(0.4, -1.1, 2.0);
        for _ in 0..100 {
            let rotations = random_rotations();
            let reference = rotations[0].rotate(&v);
            for r in &rotations {
                let rotated = r.rotate(&v);
                assert_abs_diff_eq!(rotated[0], reference[0], epsilon = TOL);
                assert_abs_diff_eq!(rotated[1], reference[1], epsilon = TOL);
                assert_abs_diff_eq!(rotated[2], reference[2], epsilon = TOL);
            }
        }
    }

    #[test]
    fn test_round_trip_through_every_representation() {
        for _ in 0..100 {
            let q = RotationQuaternion::<Active>::rand().unwrap();
            let start = Rotation::from(q);
            for intermediate in random_rotations() {
                // convert start into the intermediate's representation and back
                let via = match intermediate {
                    Rotation::AxisAngle(_) => Rotation::from(AxisAngle::from(&start)),
                    Rotation::EulerAnglesXyz(_) => Rotation::from(EulerAnglesXyz::from(&start)),
                    Rotation::EulerAnglesZyx(_) => Rotation::from(EulerAnglesZyx::from(&start)),
                    Rotation::Quaternion(_) => Rotation::from(RotationQuaternion::from(&start)),
                    Rotation::RotationMatrix(_) => Rotation::from(RotationMatrix::from(&start)),
                    Rotation::RotationVector(_) => Rotation::from(RotationVector::from(&start)),
                };
                assert!(start.angle_to(&via) < TOL);
            }
        }
    }

    #[test]
    fn test_inverse_law() {
        for _ in 0..100 {
            for r in random_rotations() {
                let residual = r.inv() * r;
                assert!(residual.angle_to(&Rotation::IDENTITY) < TOL);
            }
        }
    }

    #[test]
    fn test_composition_is_associative() {
        for _ in 0..100 {
            let a = Rotation::from(RotationQuaternion::<Active>::rand().unwrap());
            let b = Rotation::from(RotationQuaternion::<Active>::rand().unwrap());
            let c = Rotation::from(RotationQuaternion::<Active>::rand().unwrap());
            let left = (a * b) * c;
            let right = a * (b * c);
            assert!(left.angle_to(&right) < TOL);
        }
    }

    #[test]
    fn test_cross_representation_composition() {
        let yaw = Rotation::from(EulerAnglesZyx::<Active>::new(FRAC_PI_2, 0.0, 0.0));
        let roll = Rotation::from(
            AxisAngle::<Active>::new(FRAC_PI_2, Vector3::new(1.0, 0.0, 0.0)).unwrap(),
        );
        let composed = yaw * roll;
        let expected = Rotation::from(
            RotationQuaternion::<Active>::new(0.5, 0.5, 0.5, 0.5).unwrap(),
        );
        assert!(composed.angle_to(&expected) < TOL);
    }

    #[test]
    fn test_passive_composition_order() {
        // passive stored payloads are inverses, so composing passive values
        // corresponds to the nominal rotations composed in the opposite order
        let a = EulerAnglesZyx::<Passive>::new(0.3, -0.5, 0.9);
        let b = EulerAnglesZyx::<Passive>::new(-1.2, 0.4, 0.2);
        let composed = RotationQuaternion::from(&(a * b)).to_implementation();

        let an = RotationQuaternion::from(&EulerAnglesZyx::<Active>::new(0.3, -0.5, 0.9));
        let bn = RotationQuaternion::from(&EulerAnglesZyx::<Active>::new(-1.2, 0.4, 0.2));
        let nominal = (bn * an).inv().to_implementation();

        // compare up to the double-cover sign
        assert_abs_diff_eq!(composed.dot(&nominal).abs(), 1.0, epsilon = TOL);
    }

    #[test]
    fn test_matrix_pair_composes_directly() {
        let a = Rotation::from(RotationMatrix::from(&EulerAnglesZyx::<Active>::new(
            0.3, -0.2, 0.8,
        )));
        let b = Rotation::from(RotationMatrix::from(&EulerAnglesZyx::<Active>::new(
            -1.0, 0.5, 0.1,
        )));
        let composed = a * b;
        assert!(matches!(composed, Rotation::RotationMatrix(_)));
        let lifted = Rotation::Quaternion(
            RotationQuaternion::from(&a) * RotationQuaternion::from(&b),
        );
        assert!(composed.angle_to(&lifted) < TOL);
    }

    #[test]
    fn test_passive_enum_round_trip() {
        let e = EulerAnglesZyx::<Passive>::new(0.7, -0.3, 1.9);
        let r = Rotation::from(e);
        let back = EulerAnglesZyx::from(&r);
        assert_abs_diff_eq!(back.yaw(), e.yaw(), epsilon = TOL);
        assert_abs_diff_eq!(back.pitch(), e.pitch(), epsilon = TOL);
        assert_abs_diff_eq!(back.roll(), e.roll(), epsilon = TOL);
    }

    #[test]
    fn test_active_passive_stored_payloads_invert() {
        // the same nominal angles produce mutually inverse stored rotations
        let a = EulerAnglesZyx::<Active>::new(0.6, 0.2, -0.9);
        let p = EulerAnglesZyx::<Passive>::new(0.6, 0.2, -0.9);
        let qa = RotationQuaternion::from(&a).to_implementation();
        let qp = RotationQuaternion::from(&p).to_implementation();
        let product = qa * qp;
        assert_abs_diff_eq!(product.w.abs(), 1.0, epsilon = TOL);
    }

    #[test]
    fn test_identity_and_default() {
        let r = Rotation::<Active>::default();
        let v = Vector3::new(1.0, 2.0, 3.0);
        let rotated = r.rotate(&v);
        assert_abs_diff_eq!(rotated[0], v[0], epsilon = TOL);
        assert_abs_diff_eq!(rotated[1], v[1], epsilon = TOL);
        assert_abs_diff_eq!(rotated[2], v[2], epsilon = TOL);
    }

    #[test]
    fn test_inv_mut() {
        let mut q = RotationQuaternion::<Active>::new(0.1, 0.2, 0.3, 0.9).unwrap();
        let inv = q.inv();
        q.inv_mut();
        assert!(q.angle_to(&inv) < TOL);
    }

    #[test]
    fn test_rotate_matrix_dispatch() {
        let e = EulerAnglesZyx::<Active>::new(0.5, -0.1, 0.7);
        let r = Rotation::from(e);
        let m = Matrix3::new(1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0);
        let via_enum = r.rotate_matrix(&m);
        let via_value = e.rotate_matrix(&m);
        assert_abs_diff_eq!((via_enum - via_value).norm(), 0.0, epsilon = TOL);
    }
}
