use crate::grid::SampleGrid;
use crate::point::PointCloud;
use crate::state::ScanStatus;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two serial links a line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinkRole {
    Motor,
    Sensor,
}

impl fmt::Display for LinkRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkRole::Motor => f.write_str("motor"),
            LinkRole::Sensor => f.write_str("sensor"),
        }
    }
}

/// Anomaly observed while a scan is running. None of these stop the process.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScanFault {
    /// A data line did not carry 64 cells and was discarded
    MalformedGridLine { cells: usize },
    /// A line that means nothing in the current state
    UnexpectedToken { link: LinkRole, token: String },
    /// The motor controller aborted the sweep
    AbortedByPeer,
    /// Writing or reading a link failed
    LinkFailure(String),
}

impl fmt::Display for ScanFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanFault::MalformedGridLine { cells } => {
                write!(f, "Grid line must have 64 cells. Actually {} cells.", cells)
            }
            ScanFault::UnexpectedToken { link, token } => {
                write!(f, "Unexpected token {:?} on the {} link.", token, link)
            }
            ScanFault::AbortedByPeer => write!(f, "The motor controller aborted the scan."),
            ScanFault::LinkFailure(reason) => write!(f, "Link failure: {}", reason),
        }
    }
}

/// Update pushed from the orchestrator to the presentation layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScanEvent {
    /// A grid was decoded
    GridUpdate(SampleGrid),
    /// The accumulated cloud grew
    PointCloudUpdate(PointCloud),
    /// State or step count changed
    Status(ScanStatus),
    /// The scan finished; carries the final cloud
    Complete(PointCloud),
    Error(ScanFault),
}
