use minikalman::buffers::types::*;
use minikalman::prelude::*;
use minikalman::regular::{RegularKalman, RegularObservation};

/// The quaternion components q₀ … q₃.
pub const STATES: usize = 4;

/// The quaternion components of the pseudo-measurement.
pub const OBSERVATIONS: usize = 4;

pub type StateVectorArray<T> = MatrixDataArray<STATES, 1, STATES, T>;
pub type StateMatrixArray<T> = MatrixDataArray<STATES, STATES, { STATES * STATES }, T>;
pub type ObservationVectorArray<T> = MatrixDataArray<OBSERVATIONS, 1, OBSERVATIONS, T>;
pub type ObservationMatrixArray<T> =
    MatrixDataArray<OBSERVATIONS, OBSERVATIONS, { OBSERVATIONS * OBSERVATIONS }, T>;
pub type ObservationStateArray<T> =
    MatrixDataArray<OBSERVATIONS, STATES, { OBSERVATIONS * STATES }, T>;
pub type StateObservationArray<T> =
    MatrixDataArray<STATES, OBSERVATIONS, { STATES * OBSERVATIONS }, T>;

/// A Kalman filter over the four quaternion components, using owned buffers.
pub type OwnedKalmanFilter<T> = RegularKalman<
    STATES,
    T,
    StateTransitionMatrixMutBuffer<STATES, T, StateMatrixArray<T>>,
    StateVectorBuffer<STATES, T, StateVectorArray<T>>,
    EstimateCovarianceMatrixBuffer<STATES, T, StateMatrixArray<T>>,
    DirectProcessNoiseCovarianceMatrixMutBuffer<STATES, T, StateMatrixArray<T>>,
    PredictedStateEstimateVectorBuffer<STATES, T, StateVectorArray<T>>,
    TemporaryStateMatrixBuffer<STATES, T, StateMatrixArray<T>>,
>;

/// A direct observation of the quaternion (`H = I`), using owned buffers.
pub type OwnedObservation<T> = RegularObservation<
    STATES,
    OBSERVATIONS,
    T,
    ObservationMatrixMutBuffer<OBSERVATIONS, STATES, T, ObservationStateArray<T>>,
    MeasurementVectorBuffer<OBSERVATIONS, T, ObservationVectorArray<T>>,
    MeasurementNoiseCovarianceMatrixBuffer<OBSERVATIONS, T, ObservationMatrixArray<T>>,
    InnovationVectorBuffer<OBSERVATIONS, T, ObservationVectorArray<T>>,
    InnovationCovarianceMatrixBuffer<OBSERVATIONS, T, ObservationMatrixArray<T>>,
    KalmanGainMatrixBuffer<STATES, OBSERVATIONS, T, StateObservationArray<T>>,
    TemporaryResidualCovarianceInvertedMatrixBuffer<OBSERVATIONS, T, ObservationMatrixArray<T>>,
    TemporaryHPMatrixBuffer<OBSERVATIONS, STATES, T, ObservationStateArray<T>>,
    TemporaryPHTMatrixBuffer<STATES, OBSERVATIONS, T, StateObservationArray<T>>,
    TemporaryKHPMatrixBuffer<STATES, T, StateMatrixArray<T>>,
>;
