//! Scan orchestration for a rotating range-sensing rig.
//!
//! A motor stage steps through a full turn while an 8x8 time-of-flight
//! sensor head reports range grids. [`ScanOrchestrator`] drives both serial
//! links through the scan handshake and accumulates every grid into a
//! [`PointCloud`](rigscan_data::PointCloud).

mod constants;
mod deferred;
mod driver_threads;
mod error;
mod numeric;
mod time;
mod tokens;

pub mod config;
pub mod decoder;
pub mod link;
pub mod orchestrator;
pub mod projector;

pub use crate::config::{
    CapturePolicy, PortConfig, ProtocolConfig, RigConfig, ScanConfig, TimingConfig,
};
pub use crate::driver_threads::{join, spawn_rig, RigThread};
pub use crate::error::{DecodeError, RigError, ScanError};
pub use crate::link::{Link, MockLink, SerialLink};
pub use crate::orchestrator::{SampleCount, ScanOrchestrator};
pub use crate::projector::PointProjector;
use crossbeam_channel::Receiver;
use rigscan_data::ScanEvent;

/// Function to launch the rig.
/// # Arguments
///
/// * `config` - Serial ports of the motor and sensor links, and the scan handshake.
pub fn run_rig(config: &RigConfig) -> Result<(RigThread, Receiver<ScanEvent>), RigError> {
    config.validate()?;
    let motor = SerialLink::open(&config.motor.port, config.motor.baud_rate)?;
    let sensor = SerialLink::open(&config.sensor.port, config.sensor.baud_rate)?;
    spawn_rig(motor, sensor, config.scan.clone())
}
