#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of rows and columns of the sensor head.
pub const GRID_SIZE: usize = 8;
/// Number of cells in one grid.
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// One 8x8 set of range readings, row-major.
///
/// A cell is `None` when the sensor reported no valid return.
/// Distances are in centimeters and always positive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Option<f64>>", into = "Vec<Option<f64>>")
)]
pub struct SampleGrid {
    cells: Vec<Option<f64>>,
}

impl SampleGrid {
    /// Builds a grid from exactly [`GRID_CELLS`] cells.
    ///
    /// Non-positive or non-finite values are stored as `None`.
    pub fn from_cells(cells: [Option<f64>; GRID_CELLS]) -> SampleGrid {
        SampleGrid {
            cells: cells.into_iter().map(normalize).collect(),
        }
    }

    /// A grid in which no cell has a return.
    pub fn empty() -> SampleGrid {
        SampleGrid {
            cells: vec![None; GRID_CELLS],
        }
    }

    /// Distance at `(row, col)`, `None` for no return or out of range indices.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        self.cells[row * GRID_SIZE + col]
    }

    pub fn cells(&self) -> &[Option<f64>] {
        &self.cells
    }

    /// Iterates `(row, col, distance)` over cells that have a return.
    pub fn returns(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (i / GRID_SIZE, i % GRID_SIZE, d)))
    }

    pub fn n_returns(&self) -> usize {
        self.cells.iter().filter(|d| d.is_some()).count()
    }
}

impl TryFrom<Vec<Option<f64>>> for SampleGrid {
    type Error = String;

    fn try_from(cells: Vec<Option<f64>>) -> Result<Self, Self::Error> {
        if cells.len() != GRID_CELLS {
            return Err(format!(
                "a grid must have {} cells, got {}",
                GRID_CELLS,
                cells.len()
            ));
        }
        Ok(SampleGrid {
            cells: cells.into_iter().map(normalize).collect(),
        })
    }
}

impl From<SampleGrid> for Vec<Option<f64>> {
    fn from(grid: SampleGrid) -> Self {
        grid.cells
    }
}

fn normalize(cell: Option<f64>) -> Option<f64> {
    cell.filter(|d| d.is_finite() && *d > 0.)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells_normalizes_non_positive() {
        let mut cells = [Some(1.5); GRID_CELLS];
        cells[3] = Some(0.);
        cells[10] = Some(-2.);
        cells[20] = Some(f64::NAN);
        cells[63] = None;
        let grid = SampleGrid::from_cells(cells);

        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.get(1, 2), None);
        assert_eq!(grid.get(2, 4), None);
        assert_eq!(grid.get(7, 7), None);
        assert_eq!(grid.get(0, 0), Some(1.5));
        assert_eq!(grid.n_returns(), GRID_CELLS - 4);
    }

    #[test]
    fn test_get_out_of_range() {
        let grid = SampleGrid::from_cells([Some(1.); GRID_CELLS]);
        assert_eq!(grid.get(8, 0), None);
        assert_eq!(grid.get(0, 8), None);
    }

    #[test]
    fn test_returns_are_row_major() {
        let mut cells = [None; GRID_CELLS];
        cells[9] = Some(4.);
        cells[62] = Some(7.);
        let grid = SampleGrid::from_cells(cells);
        let returns: Vec<_> = grid.returns().collect();
        assert_eq!(returns, vec![(1, 1, 4.), (7, 6, 7.)]);
    }

    #[test]
    fn test_try_from_wrong_length() {
        assert!(SampleGrid::try_from(vec![Some(1.); 63]).is_err());
        assert!(SampleGrid::try_from(vec![Some(1.); 65]).is_err());
        assert!(SampleGrid::try_from(vec![None; GRID_CELLS]).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_rejects_wrong_length() {
        let grid = SampleGrid::from_cells([Some(2.5); GRID_CELLS]);
        let json = serde_json::to_string(&grid).unwrap();
        let back: SampleGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);

        assert!(serde_json::from_str::<SampleGrid>("[1.0, 2.0]").is_err());
    }
}
