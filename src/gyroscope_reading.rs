use crate::impl_standard_traits;
use uniform_array_derive::UniformArray;

/// A body-frame angular rate sample.
#[derive(UniformArray)]
#[cfg_attr(test, ensure_uniform_type::ensure_uniform_type)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct GyroscopeReading<T> {
    /// The angular rate ω₁ around the x-axis, in radians per second.
    pub omega_x: T,
    /// The angular rate ω₂ around the y-axis, in radians per second.
    pub omega_y: T,
    /// The angular rate ω₃ around the z-axis, in radians per second.
    pub omega_z: T,
}

impl<T> GyroscopeReading<T> {
    /// Initializes a new [`GyroscopeReading`] instance.
    #[inline(always)]
    pub const fn new(omega_x: T, omega_y: T, omega_z: T) -> Self {
        Self {
            omega_x,
            omega_y,
            omega_z,
        }
    }

    /// Constructs a new [`GyroscopeReading`] instance from a reading in a given coordinate frame.
    #[cfg(feature = "coordinate-frame")]
    #[cfg_attr(docsrs, doc(cfg(feature = "coordinate-frame")))]
    pub fn north_east_down<C>(coordinate: C) -> Self
    where
        C: Into<coordinate_frame::NorthEastDown<T>>,
        T: Clone,
    {
        let coordinate = coordinate.into();
        Self {
            omega_x: coordinate.x(),
            omega_y: coordinate.y(),
            omega_z: coordinate.z(),
        }
    }
}

#[cfg(feature = "coordinate-frame")]
#[cfg_attr(docsrs, doc(cfg(feature = "coordinate-frame")))]
impl<T, C> From<C> for GyroscopeReading<T>
where
    C: coordinate_frame::CoordinateFrame<Type = T>,
    T: Copy + coordinate_frame::SaturatingNeg<Output = T>,
{
    fn from(value: C) -> Self {
        Self::north_east_down(value.to_ned())
    }
}

impl_standard_traits!(GyroscopeReading, T, omega_x, omega_y, omega_z);
