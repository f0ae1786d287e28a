/// Errors detected when validating a [`FilterConfig`](crate::FilterConfig).
///
/// These are reported before any sample is processed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{0} contains NaN or infinite values")]
    NonFinite(&'static str),

    #[error("{0} is not symmetric")]
    NotSymmetric(&'static str),

    #[error("{0} is not positive definite")]
    NotPositiveDefinite(&'static str),

    #[error("{0} is not positive semi-definite")]
    NotPositiveSemiDefinite(&'static str),

    #[error("the initial state is not a unit quaternion")]
    NonUnitInitialState,

    #[error("the time step must be positive")]
    NonPositiveTimeStep,

    #[error("the gravity constant must be positive")]
    NonPositiveGravity,

    #[error("the accelerometer cutoff must lie in (0, 1]")]
    InvalidAccelerometerCutoff,

    #[error("{0} must be positive")]
    NonPositiveTolerance(&'static str),
}

/// The part of a [`Sample`](crate::Sample) that could not be used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleDefect {
    /// The specific force contains NaN or infinite values. The step is propagate-only.
    #[error("non-finite specific force")]
    SpecificForce,

    /// The magnetic field contains NaN or infinite values. The step is propagate-only.
    #[error("non-finite magnetic field")]
    MagneticField,

    /// The angular rate contains NaN or infinite values. The prior state is held.
    #[error("non-finite angular rate")]
    AngularRate,

    /// The time step is NaN, infinite, zero or negative. The prior state is held.
    #[error("invalid time step")]
    TimeStep,
}

impl SampleDefect {
    /// Whether the defect prevents propagation, i.e. the prior state has to be held.
    pub const fn prevents_propagation(&self) -> bool {
        matches!(self, SampleDefect::AngularRate | SampleDefect::TimeStep)
    }
}

/// A recoverable problem encountered while processing a single sample.
///
/// The step still produces a finite estimate and processing continues.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepFault {
    /// The innovation covariance `S = HPHᵀ + R` could not be inverted; the step
    /// falls back to the prediction.
    #[error("the innovation covariance is singular")]
    SingularInnovationCovariance,

    /// The sample contained unusable values.
    #[error("malformed sample: {0}")]
    MalformedSample(SampleDefect),
}
