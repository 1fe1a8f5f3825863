use std::marker::PhantomData;
use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::axis_angle::AxisAngle;
use crate::euler_angles_xyz::EulerAnglesXyz;
use crate::euler_angles_zyx::EulerAnglesZyx;
use crate::quaternion::RotationQuaternion;
use crate::rotation_vector::RotationVector;
use crate::usage::{Active, RotationUsage};
use crate::{Rotation, RotationTrait};

#[derive(Debug, Error, Copy, Clone)]
pub enum RotationMatrixError {
    #[error("magnitude of a matrix column is too small, should be normalizable to a magnitude of 1.0")]
    ZeroMagnitudeColumn,
}

/// A rotation stored as a 3x3 orthonormal matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationMatrix<U: RotationUsage = Active> {
    m: Matrix3<f64>,
    usage: PhantomData<U>,
}

fn normalize_columns(mut m: Matrix3<f64>) -> Result<Matrix3<f64>, RotationMatrixError> {
    for i in 0..3 {
        let norm = m.column(i).norm();
        if norm < 1e-12 {
            return Err(RotationMatrixError::ZeroMagnitudeColumn);
        }
        m.set_column(i, &(m.column(i) / norm));
    }
    Ok(m)
}

impl<U: RotationUsage> RotationMatrix<U> {
    pub const IDENTITY: Self = Self {
        m: Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
        usage: PhantomData,
    };

    /// Creates a new rotation from nominal matrix elements in row-major
    /// order, normalizing each column.
    ///
    /// # Errors
    ///
    /// Returns `RotationMatrixError::ZeroMagnitudeColumn` if any column norm
    /// is below `1e-12`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        e11: f64,
        e12: f64,
        e13: f64,
        e21: f64,
        e22: f64,
        e23: f64,
        e31: f64,
        e32: f64,
        e33: f64,
    ) -> Result<Self, RotationMatrixError> {
        Self::from_matrix(Matrix3::new(e11, e12, e13, e21, e22, e23, e31, e32, e33))
    }

    /// Creates a new rotation from a nominal matrix, normalizing each column.
    ///
    /// # Errors
    ///
    /// Returns `RotationMatrixError::ZeroMagnitudeColumn` if any column norm
    /// is below `1e-12`.
    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self, RotationMatrixError> {
        let m = normalize_columns(m)?;
        let m = if U::SIGN < 0.0 { m.transpose() } else { m };
        Ok(Self { m, usage: PhantomData })
    }

    /// Creates a rotation directly from a stored matrix, no sign convention
    /// applied and no normalization.
    pub fn from_implementation(m: Matrix3<f64>) -> Self {
        Self { m, usage: PhantomData }
    }

    /// Returns the stored matrix.
    pub fn to_implementation(&self) -> Matrix3<f64> {
        self.m
    }

    /// Nominal rotation matrix, independent of the storage convention.
    pub fn matrix(&self) -> Matrix3<f64> {
        if U::SIGN < 0.0 {
            self.m.transpose()
        } else {
            self.m
        }
    }

    /// Element-wise cast of a single precision stored matrix.
    pub fn from_f32(m: Matrix3<f32>) -> Self {
        Self::from_implementation(m.cast::<f64>())
    }

    /// Element-wise cast of the stored matrix to single precision.
    pub fn to_f32_implementation(&self) -> Matrix3<f32> {
        self.m.cast::<f32>()
    }

    pub fn set_identity(&mut self) {
        self.m = Matrix3::identity();
    }

    /// Determinant of the stored matrix, 1.0 for a proper rotation.
    pub fn determinant(&self) -> f64 {
        self.m.determinant()
    }
}

impl<U: RotationUsage> Default for RotationMatrix<U> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> RotationTrait for RotationMatrix<U> {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.m * v
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.m.transpose() * v
    }

    fn rotate_matrix(&self, m: &Matrix3<f64>) -> Matrix3<f64> {
        self.m * m
    }

    fn inv(&self) -> Self {
        Self { m: self.m.transpose(), usage: PhantomData }
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

impl<U: RotationUsage> Mul<RotationMatrix<U>> for RotationMatrix<U> {
    type Output = Self;

    /// Composes two rotations by direct matrix product.
    fn mul(self, rhs: RotationMatrix<U>) -> Self::Output {
        Self { m: self.m * rhs.m, usage: PhantomData }
    }
}

impl<U: RotationUsage> From<&RotationQuaternion<U>> for RotationMatrix<U> {
    fn from(quat: &RotationQuaternion<U>) -> Self {
        let q = quat.to_implementation();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        Self::from_implementation(Matrix3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ))
    }
}

impl<U: RotationUsage> From<&EulerAnglesZyx<U>> for RotationMatrix<U> {
    /// Builds the product of the three elementary rotations about z, y and x.
    fn from(euler: &EulerAnglesZyx<U>) -> Self {
        // nominal angles: negating the stored triple would not transpose
        // the product, so the storage convention is applied to the matrix
        let ypr = euler.to_implementation() * U::SIGN;
        let (sy, cy) = ypr[0].sin_cos();
        let (sp, cp) = ypr[1].sin_cos();
        let (sr, cr) = ypr[2].sin_cos();

        let rotz = Matrix3::new(cy, -sy, 0.0, sy, cy, 0.0, 0.0, 0.0, 1.0);
        let roty = Matrix3::new(cp, 0.0, sp, 0.0, 1.0, 0.0, -sp, 0.0, cp);
        let rotx = Matrix3::new(1.0, 0.0, 0.0, 0.0, cr, -sr, 0.0, sr, cr);

        let m = rotz * roty * rotx;
        let m = if U::SIGN < 0.0 { m.transpose() } else { m };
        Self::from_implementation(m)
    }
}

impl<U: RotationUsage> From<&EulerAnglesXyz<U>> for RotationMatrix<U> {
    fn from(euler: &EulerAnglesXyz<U>) -> Self {
        Self::from(&EulerAnglesZyx::from(euler))
    }
}

impl<U: RotationUsage> From<&AxisAngle<U>> for RotationMatrix<U> {
    /// Rodrigues' formula on the stored angle and axis.
    fn from(axis_angle: &AxisAngle<U>) -> Self {
        let (angle, axis) = axis_angle.to_implementation();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis[0], axis[1], axis[2]);
        Self::from_implementation(Matrix3::new(
            t * x * x + c,
            t * x * y - s * z,
            t * x * z + s * y,
            t * x * y + s * z,
            t * y * y + c,
            t * y * z - s * x,
            t * x * z - s * y,
            t * y * z + s * x,
            t * z * z + c,
        ))
    }
}

impl<U: RotationUsage> From<&RotationVector<U>> for RotationMatrix<U> {
    fn from(rotation_vector: &RotationVector<U>) -> Self {
        Self::from(&AxisAngle::from(rotation_vector))
    }
}

impl<U: RotationUsage> From<&Rotation<U>> for RotationMatrix<U> {
    fn from(rotation: &Rotation<U>) -> Self {
        match rotation {
            Rotation::RotationMatrix(v) => *v,
            Rotation::EulerAnglesZyx(v) => Self::from(v),
            Rotation::EulerAnglesXyz(v) => Self::from(v),
            Rotation::AxisAngle(v) => Self::from(v),
            Rotation::RotationVector(v) => Self::from(v),
            Rotation::Quaternion(v) => Self::from(v),
        }
    }
}
