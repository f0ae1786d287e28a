//! Replays a recorded sensor log through the attitude filter and prints the
//! fused, predict-only and measured angles as CSV.
//!
//! ```text
//! cargo run --example replay -- demos/data/yawing.csv
//! ```
//!
//! The log is expected to have the columns `time,gx,gy,gz,ax,ay,az,mx,my,mz`, with
//! rates in rad/s, specific forces in m/s² and empty magnetometer cells for samples
//! without magnetometer reading.

use csv::ReaderBuilder;
use quaternion_attitude::{
    run_with_reference, AccelerometerReading, FilterConfig, GyroscopeReading, MagnetometerReading,
    Sample,
};
use serde::Deserialize;
use std::error::Error;

/// One row of the sensor log.
#[derive(Debug, Deserialize)]
struct LogRecord {
    /// The sample time, in seconds.
    time: f64,
    gx: f64,
    gy: f64,
    gz: f64,
    ax: f64,
    ay: f64,
    az: f64,
    mx: Option<f64>,
    my: Option<f64>,
    mz: Option<f64>,
}

impl LogRecord {
    fn into_sample(self, previous_time: Option<f64>) -> Sample<f64> {
        let mut sample = Sample::new(
            GyroscopeReading::new(self.gx, self.gy, self.gz),
            AccelerometerReading::new(self.ax, self.ay, self.az),
        );

        if let (Some(x), Some(y), Some(z)) = (self.mx, self.my, self.mz) {
            sample = sample.with_magnetic_field(MagnetometerReading::new(x, y, z));
        }

        match previous_time {
            Some(previous) => sample.with_delta_t(self.time - previous),
            None => sample,
        }
    }
}

fn read_samples(file_path: &str) -> Result<Vec<Sample<f64>>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().from_path(file_path)?;
    let mut samples = Vec::new();
    let mut previous_time = None;

    for result in rdr.deserialize() {
        let record: LogRecord = result?;
        let time = record.time;
        samples.push(record.into_sample(previous_time));
        previous_time = Some(time);
    }

    Ok(samples)
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/data/yawing.csv".to_string());

    let samples = read_samples(&path)?;
    let output = run_with_reference(&FilterConfig::default(), &samples)?;

    println!("index,yaw,pitch,roll,gyro_yaw,gyro_pitch,gyro_roll,meas_yaw,meas_pitch,meas_roll");
    for (index, (estimate, gyro)) in output.estimates.iter().zip(&output.gyro_only).enumerate() {
        let measured = output.measurements[index]
            .map(|m| format!("{:.5},{:.5},{:.5}", m.yaw_psi, m.pitch_theta, m.roll_phi))
            .unwrap_or_else(|| ",,".to_string());

        println!(
            "{index},{:.5},{:.5},{:.5},{:.5},{:.5},{:.5},{measured}",
            estimate.yaw_psi,
            estimate.pitch_theta,
            estimate.roll_phi,
            gyro.yaw_psi,
            gyro.pitch_theta,
            gyro.roll_phi
        );
    }

    for (index, fault) in &output.faults {
        eprintln!("sample {index}: {fault}");
    }
    eprintln!(
        "{} samples, {} clamped measurements",
        output.estimates.len(),
        output.clamped_steps
    );

    Ok(())
}
