use crate::impl_standard_traits;
use uniform_array_derive::UniformArray;

/// A body-frame specific force sample.
///
/// A body at rest in level attitude reads `(0, 0, -g)`.
#[derive(UniformArray)]
#[cfg_attr(test, ensure_uniform_type::ensure_uniform_type)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct AccelerometerReading<T> {
    /// The specific force a₁ along the x-axis, in meters per second squared.
    pub x: T,
    /// The specific force a₂ along the y-axis, in meters per second squared.
    pub y: T,
    /// The specific force a₃ along the z-axis, in meters per second squared.
    pub z: T,
}

impl<T> AccelerometerReading<T> {
    /// Initializes a new [`AccelerometerReading`] instance.
    #[inline(always)]
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Constructs a new [`AccelerometerReading`] instance from a reading in a given coordinate frame.
    #[cfg(feature = "coordinate-frame")]
    #[cfg_attr(docsrs, doc(cfg(feature = "coordinate-frame")))]
    pub fn north_east_down<C>(coordinate: C) -> Self
    where
        C: Into<coordinate_frame::NorthEastDown<T>>,
        T: Clone,
    {
        let coordinate = coordinate.into();
        Self {
            x: coordinate.x(),
            y: coordinate.y(),
            z: coordinate.z(),
        }
    }
}

#[cfg(feature = "coordinate-frame")]
#[cfg_attr(docsrs, doc(cfg(feature = "coordinate-frame")))]
impl<T, C> From<C> for AccelerometerReading<T>
where
    C: coordinate_frame::CoordinateFrame<Type = T>,
    T: Copy + coordinate_frame::SaturatingNeg<Output = T>,
{
    fn from(value: C) -> Self {
        Self::north_east_down(value.to_ned())
    }
}

impl_standard_traits!(AccelerometerReading, T, x, y, z);
