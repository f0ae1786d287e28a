//! Filter configuration.

use crate::{ConfigurationError, Covariance, Quaternion};
use nalgebra::RealField;
use num_traits::Float;

/// Selects whether measurements are fused.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterMode {
    /// Propagate with the gyroscope, then correct with the pseudo-measurement.
    #[default]
    PredictAndCorrect,
    /// Propagate with the gyroscope only.
    PredictOnly,
}

/// Selects the zero point of magnetometer-derived headings.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeadingReference {
    /// Headings are reported as measured, relative to magnetic north.
    #[default]
    Absolute,
    /// The first magnetometer heading of a run is subtracted from all later ones.
    FirstSample,
}

/// The configuration of an attitude filter run.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterConfig<T> {
    /// The process noise covariance Q. Must be symmetric positive semi-definite.
    pub process_noise: Covariance<T>,
    /// The measurement noise covariance R. Must be symmetric positive definite.
    pub measurement_noise: Covariance<T>,
    /// The initial estimate covariance P₀. Must be symmetric positive semi-definite.
    pub initial_covariance: Covariance<T>,
    /// The initial orientation x₀. Must be of unit norm.
    pub initial_state: Quaternion<T>,
    /// Whether measurements are fused.
    pub mode: FilterMode,
    /// The time step, in seconds, for samples that do not carry their own.
    pub delta_t: T,
    /// The local gravity constant g, in meters per second squared.
    pub gravity: T,
    /// When set, specific forces with `|a₁ / g|` above the cutoff are not used for pitch
    /// and roll; the previous estimate is used instead.
    pub accelerometer_cutoff: Option<T>,
    /// The zero point of magnetometer headings.
    pub heading_reference: HeadingReference,
    /// Whether to project the predicted quaternion back onto unit norm after each propagation.
    pub renormalize: bool,
    /// The accepted deviation of `‖x₀‖` from one.
    pub unit_norm_tolerance: T,
    /// Innovation covariances `S` with `|det S| / ∏ Sᵢᵢ` below this value are treated
    /// as singular.
    pub singularity_tolerance: T,
    /// Estimates with a pitch angle within this many radians of ±π/2 are reported
    /// as close to gimbal lock.
    pub gimbal_lock_tolerance: T,
}

macro_rules! impl_default_config {
    ($type:ty, $singularity_tolerance:expr) => {
        impl Default for FilterConfig<$type> {
            fn default() -> Self {
                // 10^-1.6
                let noise: $type = 0.025_118_864_315_095_794;
                Self {
                    process_noise: Covariance::from_scalar(noise),
                    measurement_noise: Covariance::from_scalar(noise),
                    initial_covariance: Covariance::from_scalar(0.1),
                    initial_state: Quaternion::identity(),
                    mode: FilterMode::PredictAndCorrect,
                    delta_t: 0.05,
                    gravity: 9.806_65,
                    accelerometer_cutoff: None,
                    heading_reference: HeadingReference::Absolute,
                    renormalize: false,
                    unit_norm_tolerance: 1e-6,
                    singularity_tolerance: $singularity_tolerance,
                    gimbal_lock_tolerance: 0.01,
                }
            }
        }
    };
}

impl_default_config!(f32, 1e-6);
impl_default_config!(f64, 1e-12);

impl<T> FilterConfig<T> {
    /// Returns a copy of the configuration with a different mode.
    pub fn with_mode(self, mode: FilterMode) -> Self {
        Self { mode, ..self }
    }
}

impl<T> FilterConfig<T>
where
    T: Float + RealField,
{
    /// Checks the configuration for consistency.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !Self::is_positive(self.unit_norm_tolerance) {
            return Err(ConfigurationError::NonPositiveTolerance("unit norm tolerance"));
        }
        if !Self::is_positive(self.singularity_tolerance) {
            return Err(ConfigurationError::NonPositiveTolerance("singularity tolerance"));
        }
        if !Self::is_positive(self.gimbal_lock_tolerance) {
            return Err(ConfigurationError::NonPositiveTolerance("gimbal lock tolerance"));
        }
        if !Self::is_positive(self.delta_t) {
            return Err(ConfigurationError::NonPositiveTimeStep);
        }
        if !Self::is_positive(self.gravity) {
            return Err(ConfigurationError::NonPositiveGravity);
        }

        if let Some(cutoff) = self.accelerometer_cutoff {
            if !(cutoff > T::zero() && cutoff <= T::one()) {
                return Err(ConfigurationError::InvalidAccelerometerCutoff);
            }
        }

        let symmetry_tolerance = Float::sqrt(<T as Float>::epsilon());

        let r = &self.measurement_noise;
        Self::ensure_finite_symmetric(r, "measurement noise", symmetry_tolerance)?;
        if !r.is_positive_definite() {
            return Err(ConfigurationError::NotPositiveDefinite("measurement noise"));
        }

        for (matrix, name) in [
            (&self.process_noise, "process noise"),
            (&self.initial_covariance, "initial covariance"),
        ] {
            Self::ensure_finite_symmetric(matrix, name, symmetry_tolerance)?;
            if !matrix.is_positive_semi_definite(symmetry_tolerance) {
                return Err(ConfigurationError::NotPositiveSemiDefinite(name));
            }
        }

        if !self.initial_state.is_finite() {
            return Err(ConfigurationError::NonFinite("initial state"));
        }

        if Float::abs(self.initial_state.norm() - T::one()) > self.unit_norm_tolerance {
            return Err(ConfigurationError::NonUnitInitialState);
        }

        Ok(())
    }

    fn is_positive(value: T) -> bool {
        Float::is_finite(value) && value > T::zero()
    }

    fn ensure_finite_symmetric(
        matrix: &Covariance<T>,
        name: &'static str,
        tolerance: T,
    ) -> Result<(), ConfigurationError> {
        if !matrix.is_finite() {
            return Err(ConfigurationError::NonFinite(name));
        }
        if !matrix.is_symmetric(tolerance) {
            return Err(ConfigurationError::NotSymmetric(name));
        }
        Ok(())
    }
}
