use crate::config::ProtocolConfig;

/// Line received from the motor controller.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MotorToken {
    StepAck,
    Abort,
    ResetDone,
    Other(String),
}

/// Line received from the sensor head.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SensorToken {
    MeasureDone,
    /// Comma-separated fields, presumably a grid
    Data(String),
    Other(String),
}

/// While the motor is resetting, the reset-complete token wins over the abort
/// token, so firmware that uses one line for both still finishes the scan.
pub(crate) fn to_motor_token(
    line: &str,
    protocol: &ProtocolConfig,
    awaiting_reset: bool,
) -> MotorToken {
    let line = line.trim();
    if awaiting_reset && line == protocol.reset_done {
        return MotorToken::ResetDone;
    }
    if line == protocol.abort {
        MotorToken::Abort
    } else if line == protocol.step_ack {
        MotorToken::StepAck
    } else if line == protocol.reset_done {
        MotorToken::ResetDone
    } else {
        MotorToken::Other(line.to_string())
    }
}

pub(crate) fn to_sensor_token(line: &str, protocol: &ProtocolConfig) -> SensorToken {
    let line = line.trim();
    if line == protocol.measure_done {
        SensorToken::MeasureDone
    } else if line.contains(',') {
        SensorToken::Data(line.to_string())
    } else {
        SensorToken::Other(line.to_string())
    }
}
