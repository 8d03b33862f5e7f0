//! Placement sizing
//!
//! Converts an image's pixel size into terminal cells using the pixel size of
//! a cell, then fits the requested extent while keeping the aspect ratio
//! unless both columns and rows were given explicitly.

use crate::PlacementError;
use icat_graphics::MAX_CELLS;
use icat_tty::TerminalSize;
use tracing::debug;

/// Rows used when neither columns nor rows are requested
pub const DEFAULT_ROWS: u16 = 5;

/// Height of a cell relative to its width when the terminal does not
/// report pixel sizes
const NOMINAL_CELL_ASPECT: f64 = 2.0;

/// Size of a placement in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellExtent {
    pub columns: u16,
    pub rows: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct PlacementSizer {
    default_rows: u16,
}

impl Default for PlacementSizer {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS)
    }
}

impl PlacementSizer {
    pub fn new(default_rows: u16) -> Self {
        Self {
            default_rows: default_rows.clamp(1, MAX_CELLS),
        }
    }

    pub fn default_rows(&self) -> u16 {
        self.default_rows
    }

    /// Compute the cell extent of an image of `width` x `height` pixels
    pub fn size(
        &self,
        width: u32,
        height: u32,
        terminal: &TerminalSize,
        columns: Option<u16>,
        rows: Option<u16>,
    ) -> Result<CellExtent, PlacementError> {
        if width == 0 || height == 0 {
            return Err(PlacementError::EmptyImage { width, height });
        }

        if let (Some(columns), Some(rows)) = (columns, rows) {
            return Ok(CellExtent {
                columns: to_cells(f64::from(columns)),
                rows: to_cells(f64::from(rows)),
            });
        }

        let (image_columns, image_rows) = if terminal.has_pixel_geometry() {
            (
                f64::from(width) / f64::from(terminal.pixel_width) * f64::from(terminal.columns),
                f64::from(height) / f64::from(terminal.pixel_height) * f64::from(terminal.rows),
            )
        } else if columns.is_some() || rows.is_some() {
            debug!("Terminal reports no pixel size, assuming 1:2 cells");
            (f64::from(width), f64::from(height) / NOMINAL_CELL_ASPECT)
        } else {
            return Err(PlacementError::InvalidGeometry(
                "terminal does not report its pixel size; give columns or rows".to_string(),
            ));
        };

        let (columns, rows) = match columns {
            None => {
                let rows = f64::from(rows.unwrap_or(self.default_rows));
                (rows / image_rows * image_columns, rows)
            }
            Some(columns) => {
                let columns = f64::from(columns);
                let rows = rows
                    .map(f64::from)
                    .unwrap_or(columns / image_columns * image_rows);
                (columns, rows)
            }
        };

        let extent = CellExtent {
            columns: to_cells(columns),
            rows: to_cells(rows),
        };
        debug!(
            "Sized {}x{} px image to {}x{} cells",
            width, height, extent.columns, extent.rows
        );
        Ok(extent)
    }
}

fn to_cells(value: f64) -> u16 {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 1.0 {
        return 1;
    }
    if rounded > f64::from(MAX_CELLS) {
        debug!("Clamping {} cells to {}", rounded, MAX_CELLS);
        return MAX_CELLS;
    }
    rounded as u16
}

/// Parse a user-supplied column or row count
pub fn parse_cell_count(value: &str) -> Result<u16, PlacementError> {
    let invalid = || {
        PlacementError::InvalidGeometry(format!(
            "{value:?} must be a positive integer no larger than {MAX_CELLS}"
        ))
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match value.parse::<u32>() {
        Ok(n) if (1..=u32::from(MAX_CELLS)).contains(&n) => Ok(n as u16),
        _ => Err(invalid()),
    }
}
