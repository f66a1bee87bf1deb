#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the scan handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScanState {
    /// No scan is running
    Idle,
    /// The motor stage is stepping through the sweep
    Rotating,
    /// The sensor head is capturing grids
    Measuring,
    /// The motor stage is returning to the zero angle
    Finishing,
    /// The scan completed and the point cloud is final
    Done,
    /// The scan stopped on a link failure or a mid-step abort
    Error,
}

impl ScanState {
    /// Whether the state belongs to a running scan.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ScanState::Rotating | ScanState::Measuring | ScanState::Finishing
        )
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScanState::Idle => "IDLE",
            ScanState::Rotating => "ROTATING",
            ScanState::Measuring => "MEASURING",
            ScanState::Finishing => "FINISHING",
            ScanState::Done => "DONE",
            ScanState::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Snapshot of the scan progress.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanStatus {
    pub state: ScanState,
    /// Number of motor steps acknowledged so far.
    pub completed_steps: u32,
    /// Number of steps in the sweep, 0 before the first scan.
    pub total_steps: u32,
}

impl ScanStatus {
    /// Fraction of the sweep completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.;
        }
        (self.completed_steps as f64 / self.total_steps as f64).min(1.)
    }
}
