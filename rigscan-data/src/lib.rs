pub mod event;
pub mod grid;
pub mod point;
pub mod state;

pub use event::{LinkRole, ScanEvent, ScanFault};
pub use grid::{SampleGrid, GRID_CELLS, GRID_SIZE};
pub use point::{Point3D, PointCloud};
pub use state::{ScanState, ScanStatus};
