use serde::{Deserialize, Serialize};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Active {}
    impl Sealed for super::Passive {}
}

/// Marker trait for the usage of a rotation value.
///
/// Every representation type carries one of the two usages as a type
/// parameter (defaulting to [`Active`]). A `Passive` value behaves as the
/// inverse mapping: angle payloads are stored negated, quaternions
/// conjugated and matrices transposed. Negating an Euler triple does not
/// invert the underlying rotation, so the Euler conversions recover the
/// nominal angles before changing representation instead of reading the
/// stored payload as a rotation directly. Mixing usages in a conversion or
/// a product does not type check.
pub trait RotationUsage:
    sealed::Sealed + Copy + Clone + std::fmt::Debug + Default + PartialEq + 'static
{
    /// Sign applied to angle-valued payloads on the way into and out of storage.
    const SIGN: f64;
}

/// Active rotation ("alibi"): the object moves, the axes stay fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Active;

/// Passive rotation ("alias"): the reference frame moves, the object stays fixed.
///
/// Stored payloads are the negation (angles) or inverse (quaternion, matrix)
/// of the nominal parameters handed to the constructor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passive;

impl RotationUsage for Active {
    const SIGN: f64 = 1.0;
}

impl RotationUsage for Passive {
    const SIGN: f64 = -1.0;
}
