use crate::{AccelerometerReading, GyroscopeReading, MagnetometerReading, SampleDefect};
use num_traits::Float;

/// One time-aligned set of sensor readings.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample<T> {
    /// The body angular rate, in radians per second.
    pub angular_rate: GyroscopeReading<T>,
    /// The specific force, in meters per second squared.
    pub specific_force: AccelerometerReading<T>,
    /// The magnetic field, if a magnetometer reading is available for this sample.
    pub magnetic_field: Option<MagnetometerReading<T>>,
    /// The time elapsed since the previous sample, in seconds. When absent, the
    /// configured fixed time step is used.
    pub delta_t: Option<T>,
}

impl<T> Sample<T> {
    /// Initializes a new [`Sample`] without magnetometer reading or explicit time step.
    pub const fn new(
        angular_rate: GyroscopeReading<T>,
        specific_force: AccelerometerReading<T>,
    ) -> Self {
        Self {
            angular_rate,
            specific_force,
            magnetic_field: None,
            delta_t: None,
        }
    }

    /// Attaches a magnetometer reading.
    pub fn with_magnetic_field(self, magnetic_field: MagnetometerReading<T>) -> Self {
        Self {
            magnetic_field: Some(magnetic_field),
            ..self
        }
    }

    /// Attaches an explicit time step.
    pub fn with_delta_t(self, delta_t: T) -> Self {
        Self {
            delta_t: Some(delta_t),
            ..self
        }
    }
}

impl<T> Sample<T>
where
    T: Float,
{
    /// Returns the sample's time step, falling back to `default`.
    #[inline]
    pub fn delta_t_or(&self, default: T) -> T {
        self.delta_t.unwrap_or(default)
    }

    /// Finds the most severe defect of the sample, if any.
    ///
    /// Defects that prevent propagation take precedence over those that only
    /// prevent the measurement update.
    pub fn defect(&self, default_delta_t: T) -> Option<SampleDefect> {
        let delta_t = self.delta_t_or(default_delta_t);
        if !self.angular_rate.is_finite() {
            return Some(SampleDefect::AngularRate);
        }
        if !(delta_t.is_finite() && delta_t > T::zero()) {
            return Some(SampleDefect::TimeStep);
        }
        if !self.specific_force.is_finite() {
            return Some(SampleDefect::SpecificForce);
        }
        match self.magnetic_field {
            Some(ref field) if !field.is_finite() => Some(SampleDefect::MagneticField),
            _ => None,
        }
    }
}

/// A finite, ordered stream of samples.
pub trait SampleSource<T> {
    /// Iterates the samples in order.
    fn samples(&self) -> impl Iterator<Item = Sample<T>> + '_;
}

impl<T> SampleSource<T> for [Sample<T>]
where
    T: Copy,
{
    fn samples(&self) -> impl Iterator<Item = Sample<T>> + '_ {
        self.iter().copied()
    }
}

#[cfg(feature = "std")]
impl<T> SampleSource<T> for Vec<Sample<T>>
where
    T: Copy,
{
    fn samples(&self) -> impl Iterator<Item = Sample<T>> + '_ {
        self.as_slice().samples()
    }
}
