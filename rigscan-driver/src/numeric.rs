use crate::constants::{FULL_TURN_DEGREE, STEP_COMMAND_PRECISION};

pub(crate) fn degree_to_radian(degree: f64) -> f64 {
    degree * std::f64::consts::PI / 180.
}

/// Angle increment of one step when a full turn is split into `n_steps`.
pub(crate) fn step_angle(n_steps: u32) -> f64 {
    FULL_TURN_DEGREE / (n_steps as f64)
}

/// Motor command for one relative step, e.g. `12.857`.
pub(crate) fn step_command(step_angle: f64) -> String {
    format!("{:.*}", STEP_COMMAND_PRECISION, step_angle)
}
