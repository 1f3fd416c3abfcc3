#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Divides a geographic rectangle into a grid of nearly square cells.
//!
//! The requested cell size is rarely an exact divisor of the rectangle, so the
//! leftover length is redistributed evenly: a 70 m span with 20 m cells yields
//! four cells of 17.5 m rather than three full cells and a 10 m sliver. The two
//! axes are redistributed independently. Cell `(0, 0)` sits in the southwest
//! corner, `x` grows toward the east and `y` toward the north.

use claimfield_core::{Bounds, CellCoord, Position};
use thiserror::Error;

/// Quotients this close to a whole number of cells snap to it before rounding up.
pub const CELL_COUNT_TOLERANCE: f64 = 1e-6;

/// Largest number of cells a grid may hold.
pub const MAX_CELLS: u64 = 1 << 24;

/// Reasons a grid description may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// The northern edge does not lie strictly north of the southern edge.
    #[error("north edge {north} must lie north of south edge {south}")]
    InvertedLatitude {
        /// Requested northern edge.
        north: f64,
        /// Requested southern edge.
        south: f64,
    },
    /// The eastern edge does not lie strictly east of the western edge.
    #[error("east edge {east} must lie east of west edge {west}")]
    InvertedLongitude {
        /// Requested eastern edge.
        east: f64,
        /// Requested western edge.
        west: f64,
    },
    /// The cell size is not a positive, finite number of meters.
    #[error("cell size {0} must be a positive number of meters")]
    InvalidCellSize(f64),
    /// The cell size is so small that the grid would exceed [`MAX_CELLS`].
    #[error("{columns} x {rows} cells exceeds the limit of {max}", max = MAX_CELLS)]
    TooManyCells {
        /// Columns the cell size would produce.
        columns: f64,
        /// Rows the cell size would produce.
        rows: f64,
    },
}

/// Immutable partition of a rectangle into uniform cells.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSpec {
    bounds: Bounds,
    cell_size: f64,
    width_meters: f64,
    height_meters: f64,
    x_cells: u32,
    y_cells: u32,
}

impl GridSpec {
    /// Partitions `bounds` into cells of roughly `cell_size` meters.
    pub fn new(bounds: Bounds, cell_size: f64) -> Result<Self, GridError> {
        if !(bounds.north > bounds.south) {
            return Err(GridError::InvertedLatitude {
                north: bounds.north,
                south: bounds.south,
            });
        }
        if !(bounds.east > bounds.west) {
            return Err(GridError::InvertedLongitude {
                east: bounds.east,
                west: bounds.west,
            });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(cell_size));
        }

        let south_west = bounds.south_west();
        let width_meters = south_west.distance_to(Position::new(bounds.south, bounds.east));
        let height_meters = south_west.distance_to(Position::new(bounds.north, bounds.west));

        let columns = cell_count(width_meters, cell_size);
        let rows = cell_count(height_meters, cell_size);
        let (Some(x_cells), Some(y_cells)) = (whole_cells(columns, rows), whole_cells(rows, columns))
        else {
            return Err(GridError::TooManyCells { columns, rows });
        };

        Ok(Self {
            bounds,
            cell_size,
            width_meters,
            height_meters,
            x_cells,
            y_cells,
        })
    }

    /// Rectangle covered by the grid.
    #[must_use]
    pub const fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Requested cell size in meters.
    #[must_use]
    pub const fn nominal_cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of columns.
    #[must_use]
    pub const fn x_cells(&self) -> u32 {
        self.x_cells
    }

    /// Number of rows.
    #[must_use]
    pub const fn y_cells(&self) -> u32 {
        self.y_cells
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let total = u64::from(self.x_cells) * u64::from(self.y_cells);
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    /// East-west extent measured along the southern edge, in meters.
    #[must_use]
    pub const fn width_meters(&self) -> f64 {
        self.width_meters
    }

    /// North-south extent measured along the western edge, in meters.
    #[must_use]
    pub const fn height_meters(&self) -> f64 {
        self.height_meters
    }

    /// Actual width of one cell in degrees of longitude.
    #[must_use]
    pub fn cell_width_degrees(&self) -> f64 {
        (self.bounds.east - self.bounds.west) / f64::from(self.x_cells)
    }

    /// Actual height of one cell in degrees of latitude.
    #[must_use]
    pub fn cell_height_degrees(&self) -> f64 {
        (self.bounds.north - self.bounds.south) / f64::from(self.y_cells)
    }

    /// Actual width of one cell in meters.
    #[must_use]
    pub fn cell_width_meters(&self) -> f64 {
        self.width_meters / f64::from(self.x_cells)
    }

    /// Actual height of one cell in meters.
    #[must_use]
    pub fn cell_height_meters(&self) -> f64 {
        self.height_meters / f64::from(self.y_cells)
    }

    /// Maps a position to the cell containing it.
    ///
    /// Positions west or south of the grid yield `None`. Positions beyond the
    /// northern or eastern edge are not rejected: their coordinate is simply
    /// at least the cell count on that axis. Use [`GridSpec::locate`] to
    /// reject both directions.
    #[must_use]
    pub fn cell_of(&self, point: Position) -> Option<CellCoord> {
        let x = axis_index(point.longitude - self.bounds.west, self.cell_width_degrees())?;
        let y = axis_index(point.latitude - self.bounds.south, self.cell_height_degrees())?;
        Some(CellCoord::new(x, y))
    }

    /// Maps a position to a cell, returning `None` anywhere outside the grid.
    #[must_use]
    pub fn locate(&self, point: Position) -> Option<CellCoord> {
        self.cell_of(point).filter(|cell| self.contains(*cell))
    }

    /// Reports whether the coordinate names a cell of this grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.x_cells && cell.y() < self.y_cells
    }

    /// Row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(self.x_cells).ok()?;
        Some(row * width + column)
    }

    /// Iterates every cell of the grid in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.x_cells;
        (0..self.y_cells).flat_map(move |y| (0..columns).map(move |x| CellCoord::new(x, y)))
    }

    /// Boundary of the cell at `cell`.
    #[must_use]
    pub fn bounds_of(&self, cell: CellCoord) -> Bounds {
        self.bounds_at(i64::from(cell.x()), i64::from(cell.y()))
    }

    /// Boundary of the cell at any integer column and row.
    ///
    /// Pure interpolation: indices outside the grid describe cells of the same
    /// size continuing past its edges.
    #[must_use]
    pub fn bounds_at(&self, x: i64, y: i64) -> Bounds {
        let width = self.cell_width_degrees();
        let height = self.cell_height_degrees();
        let (x, y) = (x as f64, y as f64);
        Bounds::new(
            self.bounds.south + height * (y + 1.0),
            self.bounds.south + height * y,
            self.bounds.west + width * (x + 1.0),
            self.bounds.west + width * x,
        )
    }

    /// Segments outlining every cell: meridians west to east, then parallels
    /// south to north.
    #[must_use]
    pub fn grid_lines(&self) -> Vec<(Position, Position)> {
        let Bounds {
            north,
            south,
            east,
            west,
        } = self.bounds;
        let width = self.cell_width_degrees();
        let height = self.cell_height_degrees();

        let meridians = (0..=self.x_cells).map(|column| {
            let longitude = west + width * f64::from(column);
            (
                Position::new(north, longitude),
                Position::new(south, longitude),
            )
        });
        let parallels = (0..=self.y_cells).map(|row| {
            let latitude = south + height * f64::from(row);
            (Position::new(latitude, west), Position::new(latitude, east))
        });
        meridians.chain(parallels).collect()
    }
}

fn cell_count(distance: f64, cell_size: f64) -> f64 {
    let quotient = distance / cell_size;
    let nearest = quotient.round();
    let cells = if (quotient - nearest).abs() < CELL_COUNT_TOLERANCE {
        nearest
    } else {
        quotient.ceil()
    };
    cells.max(1.0)
}

// Converts an axis count once the whole grid is known to fit under MAX_CELLS.
fn whole_cells(count: f64, other_axis: f64) -> Option<u32> {
    // Negated so that NaN counts are rejected too.
    if !(count * other_axis <= MAX_CELLS as f64) {
        return None;
    }
    Some(count as u32)
}

fn axis_index(offset: f64, cell_size: f64) -> Option<u32> {
    let index = offset / cell_size;
    if !index.is_finite() || index < 0.0 {
        return None;
    }
    Some(index as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_count_snaps_floating_noise() {
        assert_eq!(cell_count(40.000_000_000_01, 20.0), 2.0);
        assert_eq!(cell_count(39.999_999_999_99, 20.0), 2.0);
        assert_eq!(cell_count(70.0, 20.0), 4.0);
    }

    #[test]
    fn cell_count_never_drops_below_one() {
        assert_eq!(cell_count(0.5, 20.0), 1.0);
        assert_eq!(cell_count(0.0, 20.0), 1.0);
    }

    #[test]
    fn whole_cells_rejects_oversized_and_undefined_grids() {
        assert_eq!(whole_cells(4.0, 2.0), Some(4));
        assert_eq!(whole_cells(4_096.0, 4_096.0), Some(4_096));
        assert_eq!(whole_cells(4_097.0, 4_096.0), None);
        assert_eq!(whole_cells(f64::NAN, 1.0), None);
        assert_eq!(whole_cells(f64::INFINITY, 1.0), None);
    }

    #[test]
    fn axis_index_rejects_negative_offsets() {
        assert_eq!(axis_index(-0.1, 1.0), None);
        assert_eq!(axis_index(f64::NAN, 1.0), None);
        assert_eq!(axis_index(2.9, 1.0), Some(2));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let inverted = Bounds::new(40.0, 41.0, -88.0, -89.0);
        assert!(matches!(
            GridSpec::new(inverted, 10.0),
            Err(GridError::InvertedLatitude { .. })
        ));

        let mirrored = Bounds::new(41.0, 40.0, -89.0, -88.0);
        assert!(matches!(
            GridSpec::new(mirrored, 10.0),
            Err(GridError::InvertedLongitude { .. })
        ));
    }

    #[test]
    fn non_positive_cell_size_is_rejected() {
        let bounds = Bounds::new(41.0, 40.0, -88.0, -89.0);
        assert_eq!(
            GridSpec::new(bounds, 0.0),
            Err(GridError::InvalidCellSize(0.0))
        );
        assert!(GridSpec::new(bounds, f64::NAN).is_err());
    }
}
