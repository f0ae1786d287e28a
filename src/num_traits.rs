use core::fmt::Debug;
use minikalman::matrix::MatrixDataType;
use nalgebra::RealField;
use num_traits::{Float, FloatConst};

/// The scalar type the attitude filter operates on, i.e. `f32` or `f64`.
///
/// Both [`Float`] and [`RealField`] provide methods such as `abs` and `sqrt`; code
/// bounded by this trait calls them as `Float::abs(x)` to stay unambiguous.
pub trait FilterScalar:
    MatrixDataType + Float + FloatConst + RealField + GimbalLockZenithNadir<Self> + Debug
{
}

impl<T> FilterScalar for T where
    T: MatrixDataType + Float + FloatConst + RealField + GimbalLockZenithNadir<T> + Debug
{
}

pub trait GimbalLockZenithNadir<T> {
    /// The value for the zenith, i.e. π/2;
    const ZENITH: T;

    /// The value for the nadir, i.e. -π/2;
    const NADIR: T;
}

pub trait DetectGimbalLock<T>: GimbalLockZenithNadir<T> {
    /// Determines whether a Gimbal Lock situation is about to occur
    /// because the angle (provided in radians) is close to π/2 or -π/2.
    ///
    /// ## Arguments
    /// * `tolerance` - The tolerance in radians, e.g. 0.01 rad.
    fn close_to_zenith_or_nadir(&self, tolerance: T) -> bool;
}

/// Wraps an angle into the half-open interval [-π, π).
pub trait NormalizeAngle<T> {
    type Output;

    fn normalize_angle(self) -> Self::Output;
}

/// The result of an inverse trigonometric function whose argument may have been
/// clipped into the function's domain.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Clamped<T> {
    /// The function value.
    pub value: T,
    /// Whether the argument was outside `[-1, 1]` and had to be clipped.
    pub clamped: bool,
}

/// A domain-safe arcsine.
pub trait ClampedArcSin<T> {
    /// Clips the value into `[-1, 1]` and calculates its arcsine.
    ///
    /// NaN arguments are passed through unchanged and are not reported as clamped.
    fn clamped_arcsin(self) -> Clamped<T>;
}

impl GimbalLockZenithNadir<f32> for f32 {
    const ZENITH: f32 = core::f32::consts::FRAC_PI_2;
    const NADIR: f32 = -core::f32::consts::FRAC_PI_2;
}

impl GimbalLockZenithNadir<f64> for f64 {
    const ZENITH: f64 = core::f64::consts::FRAC_PI_2;
    const NADIR: f64 = -core::f64::consts::FRAC_PI_2;
}

impl<T> DetectGimbalLock<T> for T
where
    T: Copy + Float + GimbalLockZenithNadir<T>,
{
    #[inline]
    fn close_to_zenith_or_nadir(&self, tolerance: T) -> bool {
        (*self - T::ZENITH).abs() <= tolerance || (*self - T::NADIR).abs() <= tolerance
    }
}

impl<T> NormalizeAngle<T> for T
where
    T: Float + FloatConst,
{
    type Output = T;

    #[inline]
    fn normalize_angle(self) -> Self::Output {
        let two_pi = T::TAU();
        let shifted = self + T::PI();
        shifted - two_pi * (shifted / two_pi).floor() - T::PI()
    }
}

impl<T> ClampedArcSin<T> for T
where
    T: Float,
{
    fn clamped_arcsin(self) -> Clamped<T> {
        let one = T::one();
        if self > one {
            Clamped {
                value: one.asin(),
                clamped: true,
            }
        } else if self < -one {
            Clamped {
                value: (-one).asin(),
                clamped: true,
            }
        } else {
            Clamped {
                value: self.asin(),
                clamped: false,
            }
        }
    }
}
