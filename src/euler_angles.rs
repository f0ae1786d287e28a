use crate::impl_standard_traits;
use crate::DetectGimbalLock;
use uniform_array_derive::UniformArray;

/// Tait-Bryan angles in yaw-pitch-roll ("zyx") order.
///
/// The pitch angle is restricted to `[-π/2, π/2]`; yaw and roll are only defined
/// modulo `2π` and need to be unwrapped externally when compared across a sequence.
#[derive(UniformArray)]
#[cfg_attr(test, ensure_uniform_type::ensure_uniform_type)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct EulerAngles<T> {
    /// The yaw angle ψ (psi), in radians. Rotation around the z-axis.
    pub yaw_psi: T,
    /// The pitch angle θ (theta), in radians. Rotation around the y-axis.
    pub pitch_theta: T,
    /// The roll angle φ (phi), in radians. Rotation around the x-axis.
    pub roll_phi: T,
}

impl<T> EulerAngles<T> {
    /// Initializes a new [`EulerAngles`] instance.
    #[inline(always)]
    pub const fn new(yaw_psi: T, pitch_theta: T, roll_phi: T) -> Self {
        Self {
            yaw_psi,
            pitch_theta,
            roll_phi,
        }
    }

    /// Determines whether the pitch angle is within `tolerance` radians of ±π/2,
    /// where yaw and roll are no longer separable.
    #[inline]
    pub fn is_close_to_gimbal_lock(&self, tolerance: T) -> bool
    where
        T: DetectGimbalLock<T>,
    {
        self.pitch_theta.close_to_zenith_or_nadir(tolerance)
    }
}

impl<T> PartialEq for EulerAngles<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.yaw_psi == other.yaw_psi
            && self.pitch_theta == other.pitch_theta
            && self.roll_phi == other.roll_phi
    }
}

impl_standard_traits!(EulerAngles, T, yaw_psi, pitch_theta, roll_phi);
