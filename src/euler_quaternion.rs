//! Conversions between quaternions and yaw-pitch-roll ("zyx") Euler angles.

use crate::{EulerAngles, Quaternion};
use num_traits::{Float, FloatConst};

/// Converts a quaternion into yaw, pitch and roll angles.
///
/// The quaternion does not need to be exactly unit norm. Accumulated drift can push
/// the pitch sine outside of `[-1, 1]`; such values are reflected back into range
/// instead of producing NaN.
pub fn quaternion_to_euler<T>(q: &Quaternion<T>) -> EulerAngles<T>
where
    T: Float + FloatConst,
{
    let (q0, q1, q2, q3) = (q.w, q.x, q.y, q.z);
    let two = T::one() + T::one();

    let yaw = (two * (q1 * q2 + q0 * q3)).atan2(q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3);
    let roll = (two * (q2 * q3 + q0 * q1)).atan2(q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3);
    let pitch = pitch_from_sine(-two * (q1 * q3 - q0 * q2));

    EulerAngles::new(yaw, pitch, roll)
}

/// Converts yaw, pitch and roll angles into a quaternion using the half-angle products.
pub fn euler_to_quaternion<T>(angles: &EulerAngles<T>) -> Quaternion<T>
where
    T: Float,
{
    let two = T::one() + T::one();
    let (sin_psi, cos_psi) = (angles.yaw_psi / two).sin_cos();
    let (sin_theta, cos_theta) = (angles.pitch_theta / two).sin_cos();
    let (sin_phi, cos_phi) = (angles.roll_phi / two).sin_cos();

    Quaternion::new(
        cos_phi * cos_theta * cos_psi + sin_phi * sin_theta * sin_psi,
        sin_phi * cos_theta * cos_psi - cos_phi * sin_theta * sin_psi,
        cos_phi * sin_theta * cos_psi + sin_phi * cos_theta * sin_psi,
        cos_phi * cos_theta * sin_psi - sin_phi * sin_theta * cos_psi,
    )
}

/// Recovers the pitch angle from its sine, reflecting out-of-range values.
fn pitch_from_sine<T>(sin_theta: T) -> T
where
    T: Float + FloatConst,
{
    let one = T::one();
    let two = one + one;
    let three = two + one;

    if sin_theta.is_nan() {
        return sin_theta;
    }

    if sin_theta.abs() <= one {
        return sin_theta.asin();
    }

    // Beyond ±3 the reflected argument would leave the arcsine domain again.
    let sin_theta = sin_theta.max(-three).min(three);
    let theta = if sin_theta > one {
        T::FRAC_PI_2() - (two - sin_theta).asin()
    } else {
        -T::FRAC_PI_2() + (two + sin_theta).asin()
    };

    normalize_pitch(theta)
}

/// Maps an angle into `[-π/2, π/2)` via `((θ - π/2) mod π) - π/2`, using a floored modulo.
fn normalize_pitch<T>(theta: T) -> T
where
    T: Float + FloatConst,
{
    let shifted = theta - T::FRAC_PI_2();
    let wrapped = shifted - T::PI() * (shifted / T::PI()).floor();
    wrapped - T::FRAC_PI_2()
}

impl<T> Quaternion<T> {
    /// Converts the quaternion into yaw, pitch and roll angles.
    ///
    /// See [`quaternion_to_euler`].
    #[inline]
    pub fn to_euler_angles(&self) -> EulerAngles<T>
    where
        T: Float + FloatConst,
    {
        quaternion_to_euler(self)
    }
}

impl<T> EulerAngles<T> {
    /// Converts the angles into a quaternion.
    ///
    /// See [`euler_to_quaternion`].
    #[inline]
    pub fn to_quaternion(&self) -> Quaternion<T>
    where
        T: Float,
    {
        euler_to_quaternion(self)
    }
}

impl<T> From<&Quaternion<T>> for EulerAngles<T>
where
    T: Float + FloatConst,
{
    #[inline]
    fn from(value: &Quaternion<T>) -> Self {
        quaternion_to_euler(value)
    }
}

impl<T> From<&EulerAngles<T>> for Quaternion<T>
where
    T: Float,
{
    #[inline]
    fn from(value: &EulerAngles<T>) -> Self {
        euler_to_quaternion(value)
    }
}
