//! Rig configuration, loaded from TOML.
//!
//! Every field has a default, so a file only needs the values that differ
//! from the three-device rig (motor controller, sensor head, reset phase).

use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_MOTOR_PORT, DEFAULT_SENSOR_PORT};
use crate::error::RigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RigConfig {
    pub motor: PortConfig,
    pub sensor: PortConfig,
    pub scan: ScanConfig,
}

/// Serial port of one link.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PortConfig {
    /// Device path such as `/dev/ttyAMA2`
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Where the sensor captures grids during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePolicy {
    /// The motor sweeps the full turn, then the sensor captures at the
    /// final orientation.
    PostSweep,
    /// The sensor captures one grid after every step.
    PerStep,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub capture: CapturePolicy,
    /// Send the reset command and wait for the motor before finishing.
    pub finishing: bool,
    pub timing: TimingConfig,
    pub protocol: ProtocolConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Period of the polling loop
    pub tick_ms: u64,
    /// Wait between a step ack and the next step command
    pub settle_ms: u64,
    /// Per-step capture: wait between a step ack and the measurement start
    pub measure_delay_ms: u64,
    /// Per-step capture: wait between a captured grid and the next step command
    pub step_interval_ms: u64,
}

/// Line tokens of the motor and sensor firmware.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub step_ack: String,
    pub abort: String,
    pub reset_done: String,
    pub reset_command: String,
    pub measure_start: String,
    pub measure_done: String,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl PortConfig {
    pub fn new(port: &str) -> PortConfig {
        PortConfig {
            port: port.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        RigConfig {
            motor: PortConfig::new(DEFAULT_MOTOR_PORT),
            sensor: PortConfig::new(DEFAULT_SENSOR_PORT),
            scan: ScanConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            capture: CapturePolicy::PostSweep,
            finishing: true,
            timing: TimingConfig::default(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Two-link rig capturing one grid after every step.
    pub fn per_step() -> ScanConfig {
        ScanConfig {
            capture: CapturePolicy::PerStep,
            finishing: true,
            timing: TimingConfig::default(),
            protocol: ProtocolConfig::per_step(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_ms: 20,
            settle_ms: 3000,
            measure_delay_ms: 2000,
            step_interval_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn measure_delay(&self) -> Duration {
        Duration::from_millis(self.measure_delay_ms)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            step_ack: "MF".to_string(),
            abort: "RF".to_string(),
            reset_done: "reset done".to_string(),
            reset_command: "reset angle".to_string(),
            measure_start: "start measure".to_string(),
            measure_done: "measure done".to_string(),
        }
    }
}

impl ProtocolConfig {
    /// Tokens of the per-step firmware. The motor acknowledges the reset
    /// with the same `RF` token it uses to abort.
    pub fn per_step() -> ProtocolConfig {
        ProtocolConfig {
            step_ack: "MF".to_string(),
            abort: "RF".to_string(),
            reset_done: "RF".to_string(),
            reset_command: "RM".to_string(),
            measure_start: "MeS".to_string(),
            measure_done: "MeF".to_string(),
        }
    }
}

impl RigConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RigError> {
        let contents = fs::read_to_string(path)?;
        RigConfig::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RigError> {
        let config: RigConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, RigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), RigError> {
        if self.scan.timing.tick_ms == 0 {
            return Err(RigError::InvalidConfig("tick_ms must be positive".into()));
        }
        let protocol = &self.scan.protocol;
        let tokens = [
            ("step_ack", &protocol.step_ack),
            ("abort", &protocol.abort),
            ("reset_done", &protocol.reset_done),
            ("measure_done", &protocol.measure_done),
        ];
        for (name, token) in tokens {
            if token.trim().is_empty() || token.contains(',') {
                return Err(RigError::InvalidConfig(format!(
                    "{} token {:?} must be non-empty and contain no comma",
                    name, token
                )));
            }
        }
        Ok(())
    }
}
