// Enable no_std mode.
#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![forbid(unsafe_code)]
// Only enables the `doc_cfg` feature when the `docsrs` configuration attribute is defined.
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Either the `std` or the `libm` feature is required for floating-point math");

mod accelerometer_reading;
mod config;
mod covariance;
mod error;
mod euler_angles;
mod euler_quaternion;
mod gyroscope_reading;
mod macros;
mod magnetometer_reading;
mod num_traits;
mod quaternion;
pub mod quaternion_kalman;
mod sample;

pub use crate::accelerometer_reading::AccelerometerReading;
pub use crate::config::{FilterConfig, FilterMode, HeadingReference};
pub use crate::covariance::{Covariance, QUATERNION_DIM};
pub use crate::error::{ConfigurationError, SampleDefect, StepFault};
pub use crate::euler_angles::EulerAngles;
pub use crate::euler_quaternion::{euler_to_quaternion, quaternion_to_euler};
pub use crate::gyroscope_reading::GyroscopeReading;
pub use crate::magnetometer_reading::MagnetometerReading;
pub use crate::quaternion::Quaternion;
pub use crate::quaternion_kalman::{FilterDriver, FilterState, StepOutput};
pub use crate::sample::{Sample, SampleSource};

#[cfg(feature = "std")]
pub use crate::quaternion_kalman::{run, run_source, run_with_reference, FilterOutput};

pub use crate::num_traits::*;
