use rigscan_data::{GRID_CELLS, GRID_SIZE};

/// Horizontal field of view of the sensor head in degrees.
pub(crate) const FOV_DEGREE: f64 = 60.;
/// Elevation of each grid row in degrees, from the most upward-looking row.
pub(crate) const ROW_ELEVATIONS_DEGREE: [f64; GRID_SIZE] =
    [30., 15., 0., -15., -30., -45., -60., -75.];
/// Wire unit of a grid cell, in cells per centimeter.
pub(crate) const WIRE_UNITS_PER_CM: f64 = 10.;
/// Fractional digits of the step command.
pub(crate) const STEP_COMMAND_PRECISION: usize = 3;
pub(crate) const FULL_TURN_DEGREE: f64 = 360.;

pub(crate) const DEFAULT_MOTOR_PORT: &str = "/dev/ttyAMA2";
pub(crate) const DEFAULT_SENSOR_PORT: &str = "/dev/ttyAMA3";
pub(crate) const DEFAULT_BAUD_RATE: u32 = 115200;
pub(crate) const SERIAL_TIMEOUT_MS: u64 = 10;
/// Longest partial line kept while waiting for its terminator.
pub(crate) const MAX_LINE_BYTES: usize = 4 * GRID_CELLS * 8;
