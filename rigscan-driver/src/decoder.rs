use crate::constants::WIRE_UNITS_PER_CM;
use crate::error::DecodeError;
use rigscan_data::{SampleGrid, GRID_CELLS};

const CELL_SEPARATOR: char = ',';

fn validate_cell_count(n_cells: usize) -> Result<(), DecodeError> {
    match n_cells == GRID_CELLS {
        true => Ok(()),
        false => Err(DecodeError::WrongCellCount(n_cells)),
    }
}

/// Distance in centimeters from one wire field.
/// Unparsable and non-positive fields have no return.
fn to_distance(field: &str) -> Option<f64> {
    let raw: f64 = field.trim().parse().ok()?;
    let d = raw / WIRE_UNITS_PER_CM;
    if !d.is_finite() || d <= 0. {
        return None;
    }
    Some(d)
}

/// Parses a comma-separated sensor line into a grid.
///
/// The line must have exactly 64 fields. A field that is not a number only
/// blanks its own cell.
pub fn decode(line: &str) -> Result<SampleGrid, DecodeError> {
    let fields: Vec<&str> = line.trim().split(CELL_SEPARATOR).collect();
    validate_cell_count(fields.len())?;

    let mut cells = [None; GRID_CELLS];
    for (cell, field) in cells.iter_mut().zip(fields) {
        *cell = to_distance(field);
    }
    Ok(SampleGrid::from_cells(cells))
}

/// Writes a grid in the sensor's wire format. Cells without a return are sent as `0`.
pub fn encode(grid: &SampleGrid) -> String {
    grid.cells()
        .iter()
        .map(|cell| match cell {
            Some(d) => format!("{}", (d * WIRE_UNITS_PER_CM).round()),
            None => "0".to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
