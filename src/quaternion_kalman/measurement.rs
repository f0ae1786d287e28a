//! Derivation of attitude pseudo-measurements from the accelerometer and magnetometer.

use crate::{
    AccelerometerReading, ClampedArcSin, EulerAngles, FilterConfig, HeadingReference,
    MagnetometerReading, NormalizeAngle,
};
use num_traits::{Float, FloatConst};

/// A pseudo-measurement of the orientation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PseudoMeasurement<T> {
    /// The measured yaw, pitch and roll angles.
    pub angles: EulerAngles<T>,
    /// Whether an arcsine argument had to be clipped, or the accelerometer exceeded
    /// the configured cutoff.
    pub clamped: bool,
}

/// Converts specific force and magnetic field readings into Euler angles.
///
/// Pitch and roll follow from the direction of gravity; yaw follows from the
/// tilt-compensated magnetic field or, without magnetometer, is carried over from
/// the previous estimate.
#[derive(Debug, Clone)]
pub struct AttitudeMeasurementModel<T> {
    gravity: T,
    accelerometer_cutoff: Option<T>,
    heading: HeadingUnwrapper<T>,
}

impl<T> AttitudeMeasurementModel<T>
where
    T: Float + FloatConst,
{
    /// Initializes a new [`AttitudeMeasurementModel`] from the relevant configuration fields.
    pub fn new(config: &FilterConfig<T>) -> Self {
        Self {
            gravity: config.gravity,
            accelerometer_cutoff: config.accelerometer_cutoff,
            heading: HeadingUnwrapper::new(config.heading_reference),
        }
    }

    /// Derives the pseudo-measurement for one sample.
    ///
    /// ## Arguments
    /// * `specific_force` - The accelerometer reading; must be finite.
    /// * `magnetic_field` - The optional magnetometer reading; must be finite.
    /// * `prior` - The previous corrected estimate.
    pub fn measure(
        &mut self,
        specific_force: &AccelerometerReading<T>,
        magnetic_field: Option<&MagnetometerReading<T>>,
        prior: &EulerAngles<T>,
    ) -> PseudoMeasurement<T> {
        let pitch_ratio = specific_force.x / self.gravity;

        let (pitch, roll, clamped) = match self.accelerometer_cutoff {
            Some(cutoff) if pitch_ratio.abs() > cutoff => {
                (prior.pitch_theta, prior.roll_phi, true)
            }
            _ => self.tilt(specific_force, prior),
        };

        let yaw = match magnetic_field {
            Some(field) => self.heading.track(Self::tilt_compensated_heading(field, pitch, roll)),
            None => prior.yaw_psi,
        };

        PseudoMeasurement {
            angles: EulerAngles::new(yaw, pitch, roll),
            clamped,
        }
    }

    /// Calculates pitch and roll from the direction of the specific force.
    fn tilt(&self, specific_force: &AccelerometerReading<T>, prior: &EulerAngles<T>) -> (T, T, bool) {
        let pitch = (specific_force.x / self.gravity).clamped_arcsin();
        let theta = -pitch.value;

        let roll_ratio = -specific_force.y / (self.gravity * theta.cos());
        if roll_ratio.is_nan() {
            // 0/0 at exactly ±90° pitch, where roll is not observable.
            return (theta, prior.roll_phi, true);
        }

        let roll = roll_ratio.clamped_arcsin();
        (theta, roll.value, pitch.clamped || roll.clamped)
    }

    /// Projects the magnetic field onto the horizontal plane and returns its heading.
    fn tilt_compensated_heading(field: &MagnetometerReading<T>, pitch: T, roll: T) -> T {
        let (sin_theta, cos_theta) = pitch.sin_cos();
        let (sin_phi, cos_phi) = roll.sin_cos();

        let x_h = field.x * cos_theta + field.y * sin_phi * sin_theta + field.z * cos_phi * sin_theta;
        let y_h = field.y * cos_phi - field.z * sin_phi;
        y_h.atan2(x_h)
    }
}

/// Removes the ±π discontinuity from a sequence of headings.
#[derive(Debug, Clone)]
struct HeadingUnwrapper<T> {
    reference: HeadingReference,
    previous: Option<T>,
    offset: T,
}

impl<T> HeadingUnwrapper<T>
where
    T: Float + FloatConst,
{
    fn new(reference: HeadingReference) -> Self {
        Self {
            reference,
            previous: None,
            offset: T::zero(),
        }
    }

    fn track(&mut self, raw: T) -> T {
        let heading = match self.previous {
            Some(previous) => previous + (raw - previous).normalize_angle(),
            None => {
                if self.reference == HeadingReference::FirstSample {
                    self.offset = raw;
                }
                raw
            }
        };

        self.previous = Some(heading);
        heading - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::{FRAC_PI_2, PI};

    const G: f64 = 9.80665;

    fn model() -> AttitudeMeasurementModel<f64> {
        AttitudeMeasurementModel::new(&FilterConfig::default())
    }

    fn heading_field(heading: f64) -> MagnetometerReading<f64> {
        MagnetometerReading::new(heading.cos(), heading.sin(), 0.0)
    }

    #[test]
    fn test_level() {
        let measurement = model().measure(
            &AccelerometerReading::new(0.0, 0.0, -G),
            None,
            &EulerAngles::new(0.7, 0.1, 0.1),
        );
        assert!(!measurement.clamped);
        assert_relative_eq!(measurement.angles.pitch_theta, 0.0);
        assert_relative_eq!(measurement.angles.roll_phi, 0.0);
        assert_relative_eq!(measurement.angles.yaw_psi, 0.7);
    }

    #[test]
    fn test_pitch_and_roll() {
        let theta: f64 = 0.3;
        let phi: f64 = -0.4;
        let a = AccelerometerReading::new(
            -G * theta.sin(),
            -G * theta.cos() * phi.sin(),
            -G * theta.cos() * phi.cos(),
        );
        let measurement = model().measure(&a, None, &EulerAngles::default());
        assert!(!measurement.clamped);
        assert_relative_eq!(measurement.angles.pitch_theta, theta, epsilon = 1e-12);
        assert_relative_eq!(measurement.angles.roll_phi, phi, epsilon = 1e-12);
    }

    #[test]
    fn test_saturated_pitch_is_clamped() {
        let measurement = model().measure(
            &AccelerometerReading::new(1.5 * G, 0.0, 0.0),
            None,
            &EulerAngles::default(),
        );
        assert!(measurement.clamped);
        assert_relative_eq!(measurement.angles.pitch_theta, -FRAC_PI_2);
        assert!(measurement.angles.is_finite());
    }

    #[test]
    fn test_free_fall_is_finite() {
        let measurement = model().measure(
            &AccelerometerReading::new(0.0, 0.0, 0.0),
            Some(&heading_field(0.5)),
            &EulerAngles::default(),
        );
        assert!(measurement.angles.is_finite());
        assert_relative_eq!(measurement.angles.yaw_psi, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_cutoff_falls_back_to_prior() {
        let mut model = AttitudeMeasurementModel::new(&FilterConfig {
            accelerometer_cutoff: Some(0.99),
            ..FilterConfig::default()
        });
        let prior = EulerAngles::new(0.0, 0.2, -0.1);
        let measurement = model.measure(&AccelerometerReading::new(G, 0.0, 0.0), None, &prior);
        assert!(measurement.clamped);
        assert_eq!(measurement.angles, prior);

        let measurement = model.measure(&AccelerometerReading::new(0.0, 0.0, -G), None, &prior);
        assert!(!measurement.clamped);
        assert_relative_eq!(measurement.angles.pitch_theta, 0.0);
    }

    #[test]
    fn test_tilt_compensated_heading() {
        // Body pitched up by θ, field pointing north and down.
        let theta: f64 = 0.3;
        let (north, down) = (0.4, 0.3);
        let field = MagnetometerReading::new(
            north * theta.cos() - down * theta.sin(),
            0.0,
            north * theta.sin() + down * theta.cos(),
        );
        let a = AccelerometerReading::new(-G * theta.sin(), 0.0, -G * theta.cos());

        let measurement = model().measure(&a, Some(&field), &EulerAngles::default());
        assert_relative_eq!(measurement.angles.pitch_theta, theta, epsilon = 1e-12);
        assert_relative_eq!(measurement.angles.yaw_psi, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_is_unwrapped_across_pi() {
        let mut model = model();
        let level = AccelerometerReading::new(0.0, 0.0, -G);
        let prior = EulerAngles::default();

        let headings: Vec<f64> = [3.0, 3.1, -3.1, -3.0, 3.1]
            .iter()
            .map(|&h| {
                model
                    .measure(&level, Some(&heading_field(h)), &prior)
                    .angles
                    .yaw_psi
            })
            .collect();

        assert_relative_eq!(headings[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(headings[1], 3.1, epsilon = 1e-12);
        assert_relative_eq!(headings[2], 2.0 * PI - 3.1, epsilon = 1e-12);
        assert_relative_eq!(headings[3], 2.0 * PI - 3.0, epsilon = 1e-12);
        assert_relative_eq!(headings[4], 3.1, epsilon = 1e-12);
    }

    #[test]
    fn test_first_sample_heading_reference() {
        let mut model = AttitudeMeasurementModel::new(&FilterConfig {
            heading_reference: HeadingReference::FirstSample,
            ..FilterConfig::default()
        });
        let level = AccelerometerReading::new(0.0, 0.0, -G);
        let prior = EulerAngles::default();

        let first = model.measure(&level, Some(&heading_field(1.0)), &prior);
        assert_relative_eq!(first.angles.yaw_psi, 0.0);

        let second = model.measure(&level, Some(&heading_field(1.25)), &prior);
        assert_relative_eq!(second.angles.yaw_psi, 0.25, epsilon = 1e-12);

        // Samples without magnetometer keep the prior yaw.
        let third = model.measure(&level, None, &EulerAngles::new(0.1, 0.0, 0.0));
        assert_relative_eq!(third.angles.yaw_psi, 0.1);
    }
}
