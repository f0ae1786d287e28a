//! Sequential processing of sample streams.

use crate::quaternion_kalman::filter::{FilterState, OwnedAttitudeEstimator};
use crate::quaternion_kalman::measurement::AttitudeMeasurementModel;
use crate::{
    ConfigurationError, EulerAngles, FilterConfig, FilterScalar, Quaternion, Sample, SampleDefect,
    StepFault,
};
use log::{debug, trace, warn};

#[cfg(feature = "std")]
use crate::{FilterMode, SampleSource};
#[cfg(feature = "std")]
use log::info;

/// The result of processing a single sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepOutput<T> {
    /// The corrected estimate as yaw, pitch and roll angles.
    pub angles: EulerAngles<T>,
    /// The corrected estimate.
    pub quaternion: Quaternion<T>,
    /// The pseudo-measurement derived from the sample, if the sample allowed one.
    pub measurement: Option<EulerAngles<T>>,
    /// Whether the pseudo-measurement had to be clamped into the valid domain.
    pub clamped: bool,
    /// Whether the estimated pitch is close to ±π/2, where yaw and roll are no
    /// longer separable.
    pub near_gimbal_lock: bool,
    /// A recoverable problem encountered during the step.
    pub fault: Option<StepFault>,
}

/// Runs the attitude filter over a stream of samples, one step at a time.
///
/// Each step propagates the previous estimate with the sample's angular rate, derives
/// a pseudo-measurement from its specific force and magnetic field, and corrects
/// the prediction with it.
pub struct FilterDriver<T> {
    estimator: OwnedAttitudeEstimator<T>,
    model: AttitudeMeasurementModel<T>,
    angles: EulerAngles<T>,
    delta_t: T,
    gimbal_lock_tolerance: T,
    steps: usize,
}

impl<T> FilterDriver<T>
where
    T: FilterScalar,
{
    /// Validates the configuration and initializes the filter with `x₀` and `P₀`.
    pub fn new(config: FilterConfig<T>) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let estimator = OwnedAttitudeEstimator::new(&config);
        let angles = estimator.estimated_angles();
        Ok(Self {
            estimator,
            model: AttitudeMeasurementModel::new(&config),
            angles,
            delta_t: config.delta_t,
            gimbal_lock_tolerance: config.gimbal_lock_tolerance,
            steps: 0,
        })
    }

    /// Processes the next sample.
    pub fn step(&mut self, sample: &Sample<T>) -> StepOutput<T> {
        let index = self.steps;
        self.steps += 1;

        let defect = sample.defect(self.delta_t);
        if let Some(defect) = defect.filter(SampleDefect::prevents_propagation) {
            warn!("Sample {index}: {defect}, holding the previous estimate");
            return self.output(None, false, Some(StepFault::MalformedSample(defect)));
        }

        self.estimator
            .predict(sample.delta_t_or(self.delta_t), &sample.angular_rate);

        if let Some(defect) = defect {
            warn!("Sample {index}: {defect}, skipping the measurement update");
            self.angles = self.estimator.estimated_angles();
            return self.output(None, false, Some(StepFault::MalformedSample(defect)));
        }

        let measurement = self.model.measure(
            &sample.specific_force,
            sample.magnetic_field.as_ref(),
            &self.angles,
        );
        if measurement.clamped {
            debug!(
                "Sample {index}: pseudo-measurement clamped to {:?}",
                measurement.angles
            );
        }

        let fault = match self.estimator.correct(&measurement.angles.to_quaternion()) {
            Ok(()) => None,
            Err(fault) => {
                warn!("Sample {index}: {fault}, keeping the prediction");
                Some(fault)
            }
        };

        self.angles = self.estimator.estimated_angles();
        trace!("Sample {index}: estimate {:?}", self.angles);
        if self.is_near_gimbal_lock() {
            debug!(
                "Sample {index}: pitch {:?} is close to gimbal lock",
                self.angles.pitch_theta
            );
        }

        self.output(Some(measurement.angles), measurement.clamped, fault)
    }

    /// Gets the current filter state.
    pub fn state(&self) -> FilterState<T> {
        self.estimator.state()
    }

    /// Gets the current estimate as yaw, pitch and roll angles.
    pub fn angles(&self) -> EulerAngles<T> {
        self.angles
    }

    /// The number of samples processed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn is_near_gimbal_lock(&self) -> bool {
        self.angles.is_close_to_gimbal_lock(self.gimbal_lock_tolerance)
    }

    fn output(
        &self,
        measurement: Option<EulerAngles<T>>,
        clamped: bool,
        fault: Option<StepFault>,
    ) -> StepOutput<T> {
        StepOutput {
            angles: self.angles,
            quaternion: self.estimator.estimated_quaternion(),
            measurement,
            clamped,
            near_gimbal_lock: self.is_near_gimbal_lock(),
            fault,
        }
    }
}

/// The collected result of a filter run.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[derive(Debug, Clone)]
pub struct FilterOutput<T> {
    /// The fused estimate for every sample.
    pub estimates: Vec<EulerAngles<T>>,
    /// The pseudo-measurement for every sample, if one could be derived.
    pub measurements: Vec<Option<EulerAngles<T>>>,
    /// The predict-only trajectory; empty unless requested.
    pub gyro_only: Vec<EulerAngles<T>>,
    /// The recoverable problems, by sample index.
    pub faults: Vec<(usize, StepFault)>,
    /// The number of samples whose pseudo-measurement was clamped.
    pub clamped_steps: usize,
    /// The filter state after the last sample.
    pub final_state: FilterState<T>,
}

/// Runs the filter over all samples.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub fn run<T>(
    config: &FilterConfig<T>,
    samples: &[Sample<T>],
) -> Result<FilterOutput<T>, ConfigurationError>
where
    T: FilterScalar,
{
    run_source(config, samples)
}

/// Runs the filter over all samples and additionally computes the predict-only
/// trajectory with an independent filter instance.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub fn run_with_reference<T>(
    config: &FilterConfig<T>,
    samples: &[Sample<T>],
) -> Result<FilterOutput<T>, ConfigurationError>
where
    T: FilterScalar,
{
    process(config, samples, true)
}

/// Runs the filter over all samples of a [`SampleSource`].
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub fn run_source<T, S>(
    config: &FilterConfig<T>,
    source: &S,
) -> Result<FilterOutput<T>, ConfigurationError>
where
    T: FilterScalar,
    S: SampleSource<T> + ?Sized,
{
    process(config, source, false)
}

#[cfg(feature = "std")]
fn process<T, S>(
    config: &FilterConfig<T>,
    source: &S,
    with_reference: bool,
) -> Result<FilterOutput<T>, ConfigurationError>
where
    T: FilterScalar,
    S: SampleSource<T> + ?Sized,
{
    let mut driver = FilterDriver::new(*config)?;
    let mut reference = if with_reference {
        Some(FilterDriver::new(config.with_mode(FilterMode::PredictOnly))?)
    } else {
        None
    };

    info!("Starting attitude filter run in {:?} mode", config.mode);

    let mut estimates = Vec::new();
    let mut measurements = Vec::new();
    let mut gyro_only = Vec::new();
    let mut faults = Vec::new();
    let mut clamped_steps = 0;

    for (index, sample) in source.samples().enumerate() {
        let output = driver.step(&sample);
        estimates.push(output.angles);
        measurements.push(output.measurement);
        if output.clamped {
            clamped_steps += 1;
        }
        if let Some(fault) = output.fault {
            faults.push((index, fault));
        }

        if let Some(reference) = reference.as_mut() {
            gyro_only.push(reference.step(&sample).angles);
        }
    }

    info!(
        "Processed {} samples with {} faults and {} clamped measurements",
        estimates.len(),
        faults.len(),
        clamped_steps
    );

    Ok(FilterOutput {
        estimates,
        measurements,
        gyro_only,
        faults,
        clamped_steps,
        final_state: driver.state(),
    })
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::{AccelerometerReading, Covariance, GyroscopeReading, MagnetometerReading};
    use approx::assert_relative_eq;
    use core::f64::consts::FRAC_PI_2;

    const G: f64 = 9.80665;

    fn stationary(count: usize) -> Vec<Sample<f64>> {
        vec![
            Sample::new(
                GyroscopeReading::new(0.0, 0.0, 0.0),
                AccelerometerReading::new(0.0, 0.0, -G),
            );
            count
        ]
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = FilterConfig::<f64> {
            measurement_noise: Covariance::zeros(),
            ..Default::default()
        };
        assert!(matches!(
            FilterDriver::new(config),
            Err(ConfigurationError::NotPositiveDefinite(_))
        ));
        assert!(run(&config, &stationary(3)).is_err());
    }

    #[test]
    fn test_empty_stream() {
        let output = run(&FilterConfig::<f64>::default(), &[]).unwrap();
        assert!(output.estimates.is_empty());
        assert_eq!(output.final_state.quaternion, Quaternion::identity());
    }

    #[test]
    fn test_gyro_integration_predict_only() {
        let config = FilterConfig::<f64>::default().with_mode(FilterMode::PredictOnly);
        let samples = vec![
            Sample::new(
                GyroscopeReading::new(0.0, 0.0, 1.0),
                AccelerometerReading::new(0.0, 0.0, -G),
            )
            .with_delta_t(0.01);
            100
        ];

        let output = run(&config, &samples).unwrap();
        assert_eq!(output.estimates.len(), 100);
        assert!(output.faults.is_empty());

        let yaw = output.estimates[99].yaw_psi;
        assert!((yaw - 1.0).abs() < 0.05, "yaw was {yaw}");
    }

    #[test]
    fn test_level_convergence_from_tilted_start() {
        let config = FilterConfig::<f64> {
            initial_state: EulerAngles::new(0.0, 0.2, 0.3).to_quaternion(),
            initial_covariance: Covariance::from_scalar(0.5),
            ..Default::default()
        };

        let output = run(&config, &stationary(50)).unwrap();
        let last = output.estimates[49];
        assert!(last.pitch_theta.abs() < 0.01, "pitch was {}", last.pitch_theta);
        assert!(last.roll_phi.abs() < 0.01, "roll was {}", last.roll_phi);
        assert_eq!(output.clamped_steps, 0);
    }

    #[test]
    fn test_saturated_accelerometer_is_clamped() {
        let mut driver = FilterDriver::new(FilterConfig::<f64>::default()).unwrap();
        let sample = Sample::new(
            GyroscopeReading::new(0.0, 0.0, 0.0),
            AccelerometerReading::new(1.5 * G, 0.0, 0.0),
        );

        for _ in 0..20 {
            let output = driver.step(&sample);
            assert!(output.clamped);
            assert_eq!(output.fault, None);
            assert!(output.angles.is_finite());

            let measurement = output.measurement.unwrap();
            assert_relative_eq!(measurement.pitch_theta.abs(), FRAC_PI_2);
        }

        assert!(driver.angles().pitch_theta < -1.0);
        assert!(driver.state().quaternion.is_finite());
        assert!(driver.step(&sample).near_gimbal_lock);
    }

    #[test]
    fn test_non_finite_specific_force_is_propagate_only() {
        let config = FilterConfig::<f64>::default();
        let rates = GyroscopeReading::new(0.1, 0.0, 0.2);

        let mut driver = FilterDriver::new(config).unwrap();
        let output = driver.step(&Sample::new(
            rates,
            AccelerometerReading::new(f64::NAN, 0.0, -G),
        ));

        assert_eq!(
            output.fault,
            Some(StepFault::MalformedSample(SampleDefect::SpecificForce))
        );
        assert_eq!(output.measurement, None);

        let mut reference = OwnedAttitudeEstimator::new(&config);
        reference.predict(config.delta_t, &rates);
        assert_eq!(driver.state(), reference.state());
    }

    #[test]
    fn test_non_finite_magnetic_field_is_propagate_only() {
        let mut driver = FilterDriver::new(FilterConfig::<f64>::default()).unwrap();
        let output = driver.step(
            &stationary(1)[0].with_magnetic_field(MagnetometerReading::new(0.2, f64::INFINITY, 0.4)),
        );
        assert_eq!(
            output.fault,
            Some(StepFault::MalformedSample(SampleDefect::MagneticField))
        );
        assert!(output.quaternion.is_finite());
    }

    #[test]
    fn test_non_finite_angular_rate_holds_state() {
        let mut driver = FilterDriver::new(FilterConfig::<f64>::default()).unwrap();
        driver.step(&stationary(1)[0]);
        let before = driver.state();

        let output = driver.step(&Sample::new(
            GyroscopeReading::new(f64::NAN, 0.0, 0.0),
            AccelerometerReading::new(0.0, 0.0, -G),
        ));
        assert_eq!(
            output.fault,
            Some(StepFault::MalformedSample(SampleDefect::AngularRate))
        );
        assert_eq!(driver.state(), before);

        let output = driver.step(&stationary(1)[0].with_delta_t(-0.1));
        assert_eq!(
            output.fault,
            Some(StepFault::MalformedSample(SampleDefect::TimeStep))
        );
        assert_eq!(driver.state(), before);

        let output = driver.step(&stationary(1)[0]);
        assert_eq!(output.fault, None);
        assert!(output.quaternion.is_finite());
        assert!(!output.near_gimbal_lock);
        assert_eq!(driver.steps(), 4);
    }

    #[test]
    fn test_faults_are_collected_by_index() {
        let mut samples = stationary(5);
        samples[2].specific_force.z = f64::NAN;

        let output = run(&FilterConfig::default(), &samples).unwrap();
        assert_eq!(
            output.faults,
            vec![(2, StepFault::MalformedSample(SampleDefect::SpecificForce))]
        );
        assert_eq!(output.measurements[2], None);
        assert!(output.estimates.iter().all(|angles| angles.is_finite()));
    }

    #[test]
    fn test_singular_innovation_covariance_falls_back_to_prediction() {
        let c = 1.0 - 1e-15;
        let config = FilterConfig::<f64> {
            process_noise: Covariance::zeros(),
            initial_covariance: Covariance::zeros(),
            measurement_noise: Covariance::from_rows([
                [1.0, c, 0.0, 0.0],
                [c, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));
        let samples = vec![
            Sample::new(
                GyroscopeReading::new(0.0, 0.0, 0.5),
                AccelerometerReading::new(0.0, 0.0, -G),
            );
            10
        ];

        let output = run_with_reference(&config, &samples).unwrap();
        assert_eq!(output.faults.len(), 10);
        assert!(output
            .faults
            .iter()
            .all(|(_, fault)| *fault == StepFault::SingularInnovationCovariance));
        assert_eq!(output.estimates, output.gyro_only);
    }

    #[test]
    fn test_small_noise_converges_from_tilted_start() {
        let config = FilterConfig::<f64> {
            process_noise: Covariance::from_scalar(1e-4),
            measurement_noise: Covariance::from_scalar(1e-4),
            initial_covariance: Covariance::from_scalar(1e-4),
            initial_state: EulerAngles::new(0.0, 0.3, 0.0).to_quaternion(),
            ..Default::default()
        };

        let output = run(&config, &stationary(50)).unwrap();
        assert!(output.faults.is_empty());
        assert!(output.estimates[49].pitch_theta.abs() < 0.01);
        assert!(output.estimates[49].roll_phi.abs() < 0.01);
    }

    #[test]
    fn test_small_noise_converges_f32() {
        let config = FilterConfig::<f32> {
            process_noise: Covariance::from_scalar(1e-3),
            measurement_noise: Covariance::from_scalar(1e-3),
            initial_covariance: Covariance::from_scalar(1e-3),
            initial_state: EulerAngles::new(0.0, 0.3, 0.0).to_quaternion(),
            ..Default::default()
        };
        let level = Sample::new(
            GyroscopeReading::new(0.0, 0.0, 0.0),
            AccelerometerReading::new(0.0, 0.0, -9.80665_f32),
        );

        let mut driver = FilterDriver::new(config).unwrap();
        for _ in 0..50 {
            assert_eq!(driver.step(&level).fault, None);
        }
        assert!(driver.angles().pitch_theta.abs() < 0.01);
    }

    #[test]
    fn test_reference_trajectory_is_independent() {
        let config = FilterConfig::<f64>::default();
        let samples = vec![
            Sample::new(
                GyroscopeReading::new(0.0, 0.3, 0.0),
                AccelerometerReading::new(0.0, 0.0, -G),
            );
            20
        ];

        let with_reference = run_with_reference(&config, &samples).unwrap();
        let predict_only = run(&config.with_mode(FilterMode::PredictOnly), &samples).unwrap();
        let corrected = run(&config, &samples).unwrap();

        assert_eq!(with_reference.gyro_only, predict_only.estimates);
        assert_eq!(with_reference.estimates, corrected.estimates);
        assert!(corrected.gyro_only.is_empty());

        // The accelerometer holds the pitch near zero; the gyroscope alone does not.
        assert!(with_reference.estimates[19].pitch_theta.abs() < 0.1);
        assert!(with_reference.gyro_only[19].pitch_theta > 0.25);
    }

    #[test]
    fn test_drift_bound() {
        let initial_state = EulerAngles::new(-0.5, 0.1, 0.2).to_quaternion();
        let config = FilterConfig::<f64> {
            process_noise: Covariance::zeros(),
            initial_state,
            mode: FilterMode::PredictOnly,
            ..Default::default()
        };

        let output = run(&config, &stationary(500)).unwrap();
        assert_eq!(output.final_state.quaternion, initial_state);
    }

    #[test]
    fn test_magnetometer_heading() {
        let config = FilterConfig::<f64> {
            measurement_noise: Covariance::from_scalar(1e-3),
            ..Default::default()
        };
        let heading: f64 = 0.8;
        let samples: Vec<_> = stationary(50)
            .into_iter()
            .map(|sample| {
                sample.with_magnetic_field(MagnetometerReading::new(heading.cos(), heading.sin(), 0.0))
            })
            .collect();

        let output = run_source(&config, &samples).unwrap();
        assert_relative_eq!(output.estimates[49].yaw_psi, heading, epsilon = 1e-3);
    }
}
