use crate::quaternion_kalman::types::*;
use crate::{
    Covariance, EulerAngles, FilterConfig, FilterMode, FilterScalar, GyroscopeReading, Quaternion,
    StepFault,
};
use minikalman::buffers::types::*;
use minikalman::prelude::*;
use minikalman::regular::{RegularKalmanBuilder, RegularObservationBuilder};

/// Copies a [`Covariance`] into a 4×4 filter buffer.
macro_rules! load_covariance {
    ($buffer:expr, $covariance:expr) => {{
        let covariance = $covariance;
        $buffer.apply(|mat| {
            for row in 0..STATES {
                for column in 0..STATES {
                    mat.set_at(row, column, covariance.get_at(row, column));
                }
            }
        });
    }};
}

/// The state of the attitude filter: the quaternion estimate and its covariance.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterState<T> {
    /// The orientation estimate. Not necessarily of exact unit norm.
    pub quaternion: Quaternion<T>,
    /// The estimate covariance P.
    pub covariance: Covariance<T>,
}

/// A quaternion Kalman filter propagating the orientation with gyroscope rates and
/// correcting it with a direct quaternion pseudo-measurement (`H = I`).
pub struct OwnedAttitudeEstimator<T> {
    filter: OwnedKalmanFilter<T>,
    measurement: OwnedObservation<T>,
    measurement_noise: Covariance<T>,
    mode: FilterMode,
    renormalize: bool,
    singularity_tolerance: T,
}

impl<T> OwnedAttitudeEstimator<T>
where
    T: FilterScalar,
{
    /// Initializes a new instance of the [`OwnedAttitudeEstimator`] struct.
    ///
    /// The configuration is expected to be validated; see [`FilterConfig::validate`].
    pub fn new(config: &FilterConfig<T>) -> Self {
        Self {
            filter: Self::build_filter(config),
            measurement: Self::build_measurement(&config.measurement_noise),
            measurement_noise: config.measurement_noise,
            mode: config.mode,
            renormalize: config.renormalize,
            singularity_tolerance: config.singularity_tolerance,
        }
    }

    /// Propagates the state with the kinematic quaternion model `x ← A·x`,
    /// `P ← A·P·Aᵀ + Q`, where `A = I + Δt·B(ω)`.
    ///
    /// ## Arguments
    /// * `delta_t` - The time step, in seconds.
    /// * `rates` - The body angular rates, in radians per second.
    pub fn predict(&mut self, delta_t: T, rates: &GyroscopeReading<T>) {
        let one = T::one();
        let half_dt = delta_t / (one + one);
        let wx = rates.omega_x * half_dt;
        let wy = rates.omega_y * half_dt;
        let wz = rates.omega_z * half_dt;

        self.filter.state_transition_mut().apply(|mat| {
            mat.set_at(0, 0, one);
            mat.set_at(0, 1, -wx);
            mat.set_at(0, 2, -wy);
            mat.set_at(0, 3, -wz);

            mat.set_at(1, 0, wx);
            mat.set_at(1, 1, one);
            mat.set_at(1, 2, wz);
            mat.set_at(1, 3, -wy);

            mat.set_at(2, 0, wy);
            mat.set_at(2, 1, -wz);
            mat.set_at(2, 2, one);
            mat.set_at(2, 3, wx);

            mat.set_at(3, 0, wz);
            mat.set_at(3, 1, wy);
            mat.set_at(3, 2, -wx);
            mat.set_at(3, 3, one);
        });

        self.filter.predict();

        if self.renormalize {
            let normalized = self.estimated_quaternion().normalized();
            self.set_quaternion(&normalized);
        }
    }

    /// Corrects the predicted state with a quaternion pseudo-measurement.
    ///
    /// `measurement` and `-measurement` produce identical results: the measurement
    /// is first moved into the hemisphere of the prediction.
    ///
    /// Does nothing in [`FilterMode::PredictOnly`]. If the innovation covariance is
    /// not positive definite, or its normalized determinant `|det S| / ∏ Sᵢᵢ` is
    /// below the singularity tolerance, the prediction is kept and
    /// [`StepFault::SingularInnovationCovariance`] is returned.
    pub fn correct(&mut self, measurement: &Quaternion<T>) -> Result<(), StepFault> {
        if self.mode == FilterMode::PredictOnly {
            return Ok(());
        }

        let innovation_covariance = self.estimate_covariance() + self.measurement_noise;
        if !innovation_covariance.is_well_conditioned(self.singularity_tolerance) {
            return Err(StepFault::SingularInnovationCovariance);
        }

        let z = measurement.aligned_with(&self.estimated_quaternion());
        self.measurement.measurement_vector_mut().apply(|vec| {
            vec.set_row(0, z.w);
            vec.set_row(1, z.x);
            vec.set_row(2, z.y);
            vec.set_row(3, z.z);
        });

        self.filter.correct(&mut self.measurement);
        Ok(())
    }

    /// Gets the current quaternion estimate.
    pub fn estimated_quaternion(&self) -> Quaternion<T> {
        let state = self.filter.state_vector();
        Quaternion::new(
            state.get_row(0),
            state.get_row(1),
            state.get_row(2),
            state.get_row(3),
        )
    }

    /// Gets the current estimate as yaw, pitch and roll angles.
    pub fn estimated_angles(&self) -> EulerAngles<T> {
        self.estimated_quaternion().to_euler_angles()
    }

    /// Gets the current estimate covariance.
    pub fn estimate_covariance(&self) -> Covariance<T> {
        let p = self.filter.estimate_covariance();
        let mut covariance = Covariance::zeros();
        for row in 0..STATES {
            for column in 0..STATES {
                covariance.set_at(row, column, p.get_at(row, column));
            }
        }
        covariance
    }

    /// Gets the current filter state.
    pub fn state(&self) -> FilterState<T> {
        FilterState {
            quaternion: self.estimated_quaternion(),
            covariance: self.estimate_covariance(),
        }
    }

    fn set_quaternion(&mut self, quaternion: &Quaternion<T>) {
        self.filter.state_vector_mut().apply(|vec| {
            vec.set_row(0, quaternion.w);
            vec.set_row(1, quaternion.x);
            vec.set_row(2, quaternion.y);
            vec.set_row(3, quaternion.z);
        });
    }
}

impl<T> OwnedAttitudeEstimator<T>
where
    T: FilterScalar,
{
    /// Builds the Kalman filter used for prediction.
    fn build_filter(config: &FilterConfig<T>) -> OwnedKalmanFilter<T> {
        let zero = T::zero();
        let x0 = &config.initial_state;

        // State vector.
        let mut state_vec =
            StateVectorBuffer::<STATES, T, _>::new(MatrixData::new_array::<STATES, 1, STATES, T>(
                [zero; STATES],
            ));
        state_vec.apply(|vec| {
            vec.set_row(0, x0.w);
            vec.set_row(1, x0.x);
            vec.set_row(2, x0.y);
            vec.set_row(3, x0.z);
        });

        // State transition matrix; updated before every prediction.
        let mut state_transition =
            StateTransitionMatrixMutBuffer::<STATES, T, _>::new(MatrixData::new_array::<
                STATES,
                STATES,
                { STATES * STATES },
                T,
            >(
                [zero; { STATES * STATES }]
            ));
        state_transition.make_identity();

        // Estimate covariance matrix.
        let mut estimate_covariance =
            EstimateCovarianceMatrixBuffer::<STATES, T, _>::new(MatrixData::new_array::<
                STATES,
                STATES,
                { STATES * STATES },
                T,
            >(
                [zero; { STATES * STATES }]
            ));
        load_covariance!(estimate_covariance, &config.initial_covariance);

        // Process noise matrix.
        let mut process_noise = DirectProcessNoiseCovarianceMatrixMutBuffer::<STATES, T, _>::new(
            MatrixData::new_array::<STATES, STATES, { STATES * STATES }, T>(
                [zero; { STATES * STATES }],
            ),
        );
        load_covariance!(process_noise, &config.process_noise);

        // Predicted state vector.
        let predicted_state =
            PredictedStateEstimateVectorBuffer::<STATES, T, _>::new(MatrixData::new_array::<
                STATES,
                1,
                STATES,
                T,
            >([zero; STATES]));

        // Temporary estimate covariance matrix.
        let temp_state_matrix =
            TemporaryStateMatrixBuffer::<STATES, T, _>::new(MatrixData::new_array::<
                STATES,
                STATES,
                { STATES * STATES },
                T,
            >(
                [zero; { STATES * STATES }]
            ));

        RegularKalmanBuilder::new::<STATES, T>(
            state_transition,
            state_vec,
            estimate_covariance,
            process_noise,
            predicted_state,
            temp_state_matrix,
        )
    }

    /// Builds the direct quaternion observation.
    fn build_measurement(noise: &Covariance<T>) -> OwnedObservation<T> {
        let zero = T::zero();

        // Measurement vector
        let measurement =
            MeasurementVectorBuffer::<OBSERVATIONS, T, _>::new(MatrixData::new_array::<
                OBSERVATIONS,
                1,
                OBSERVATIONS,
                T,
            >([zero; OBSERVATIONS]));

        // Observation matrix; the quaternion is observed directly.
        let mut observation_matrix =
            ObservationMatrixMutBuffer::<OBSERVATIONS, STATES, T, _>::new(MatrixData::new_array::<
                OBSERVATIONS,
                STATES,
                { OBSERVATIONS * STATES },
                T,
            >(
                [zero; { OBSERVATIONS * STATES }],
            ));
        observation_matrix.apply(|mat| {
            for i in 0..OBSERVATIONS {
                mat.set_at(i, i, T::one());
            }
        });

        // Measurement noise covariance
        let mut noise_covariance =
            MeasurementNoiseCovarianceMatrixBuffer::<OBSERVATIONS, T, _>::new(
                MatrixData::new_array::<
                    OBSERVATIONS,
                    OBSERVATIONS,
                    { OBSERVATIONS * OBSERVATIONS },
                    T,
                >([zero; { OBSERVATIONS * OBSERVATIONS }]),
            );
        load_covariance!(noise_covariance, noise);

        // Innovation vector
        let innovation_vector =
            InnovationVectorBuffer::<OBSERVATIONS, T, _>::new(MatrixData::new_array::<
                OBSERVATIONS,
                1,
                OBSERVATIONS,
                T,
            >([zero; OBSERVATIONS]));

        // Innovation covariance matrix
        let innovation_covariance =
            InnovationCovarianceMatrixBuffer::<OBSERVATIONS, T, _>::new(MatrixData::new_array::<
                OBSERVATIONS,
                OBSERVATIONS,
                { OBSERVATIONS * OBSERVATIONS },
                T,
            >(
                [zero; { OBSERVATIONS * OBSERVATIONS }],
            ));

        // Kalman Gain matrix
        let kalman_gain =
            KalmanGainMatrixBuffer::<STATES, OBSERVATIONS, T, _>::new(MatrixData::new_array::<
                STATES,
                OBSERVATIONS,
                { STATES * OBSERVATIONS },
                T,
            >(
                [zero; { STATES * OBSERVATIONS }],
            ));

        // Temporary residual covariance inverted matrix
        let temp_sinv = TemporaryResidualCovarianceInvertedMatrixBuffer::<OBSERVATIONS, T, _>::new(
            MatrixData::new_array::<OBSERVATIONS, OBSERVATIONS, { OBSERVATIONS * OBSERVATIONS }, T>(
                [zero; { OBSERVATIONS * OBSERVATIONS }],
            ),
        );

        // Temporary H×P matrix
        let temp_hp =
            TemporaryHPMatrixBuffer::<OBSERVATIONS, STATES, T, _>::new(MatrixData::new_array::<
                OBSERVATIONS,
                STATES,
                { OBSERVATIONS * STATES },
                T,
            >(
                [zero; { OBSERVATIONS * STATES }],
            ));

        // Temporary P×Hᵀ matrix
        let temp_pht =
            TemporaryPHTMatrixBuffer::<STATES, OBSERVATIONS, T, _>::new(MatrixData::new_array::<
                STATES,
                OBSERVATIONS,
                { STATES * OBSERVATIONS },
                T,
            >(
                [zero; { STATES * OBSERVATIONS }],
            ));

        // Temporary K×(H×P) matrix
        let temp_khp = TemporaryKHPMatrixBuffer::<STATES, T, _>::new(MatrixData::new_array::<
            STATES,
            STATES,
            { STATES * STATES },
            T,
        >(
            [zero; { STATES * STATES }]
        ));

        RegularObservationBuilder::new::<STATES, OBSERVATIONS, T>(
            observation_matrix,
            measurement,
            noise_covariance,
            innovation_vector,
            innovation_covariance,
            kalman_gain,
            temp_sinv,
            temp_hp,
            temp_pht,
            temp_khp,
        )
    }
}
