//! A quaternion Kalman filter fusing gyroscope rates with an accelerometer and
//! magnetometer derived attitude pseudo-measurement.

mod driver;
mod filter;
mod measurement;
mod types;

pub use driver::*;
pub use filter::*;
pub use measurement::*;
