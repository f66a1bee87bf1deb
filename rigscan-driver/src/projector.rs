use crate::constants::{FOV_DEGREE, ROW_ELEVATIONS_DEGREE};
use crate::numeric::degree_to_radian;
use rigscan_data::{Point3D, PointCloud, SampleGrid, GRID_SIZE};

/// Azimuth of column `col` in degrees, spreading the field of view evenly
/// across the columns around `azimuth_center`.
pub(crate) fn column_azimuth(azimuth_center: f64, col: usize) -> f64 {
    let spacing = FOV_DEGREE / ((GRID_SIZE - 1) as f64);
    azimuth_center - FOV_DEGREE / 2. + (col as f64) * spacing
}

pub(crate) fn to_point(distance: f64, azimuth_degree: f64, elevation_degree: f64) -> Point3D {
    let az = degree_to_radian(azimuth_degree);
    let el = degree_to_radian(elevation_degree);
    Point3D {
        x: distance * az.sin() * el.cos(),
        y: distance * az.cos() * el.cos(),
        z: distance * el.sin(),
    }
}

/// Projects grids into 3D and keeps the cloud of a scan.
#[derive(Debug, Default)]
pub struct PointProjector {
    cloud: PointCloud,
}

impl PointProjector {
    pub fn new() -> PointProjector {
        PointProjector {
            cloud: PointCloud::new(),
        }
    }

    /// Converts every cell with a return into a point. Cells without a
    /// return produce nothing.
    pub fn project(grid: &SampleGrid, azimuth_center: f64) -> Vec<Point3D> {
        grid.returns()
            .map(|(row, col, d)| {
                to_point(
                    d,
                    column_azimuth(azimuth_center, col),
                    ROW_ELEVATIONS_DEGREE[row],
                )
            })
            .collect()
    }

    /// Appends `points` to the cloud and returns how many were added.
    pub fn accumulate(&mut self, points: Vec<Point3D>) -> usize {
        let n = points.len();
        self.cloud.extend(points);
        n
    }

    /// `project` followed by `accumulate`.
    pub fn project_and_accumulate(&mut self, grid: &SampleGrid, azimuth_center: f64) -> usize {
        self.accumulate(PointProjector::project(grid, azimuth_center))
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }
}
