//! Grid geometry shared by the simulation and the renderer.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in simulation coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Create bounds from explicit edges.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Bounding box of a circle.
    pub fn around(x: f64, y: f64, radius: f64) -> Self {
        Self::new(x - radius, x + radius, y - radius, y + radius)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Get the center of the bounds.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Check if a point is within bounds.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Inclusive block of grid cells, used to place zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub first_column: usize,
    pub last_column: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl CellRect {
    pub fn new(first_column: usize, last_column: usize, first_row: usize, last_row: usize) -> Self {
        Self {
            first_column,
            last_column,
            first_row,
            last_row,
        }
    }

    /// Box covered by these cells for the given grid step.
    pub fn bounds(&self, grid_step: f64) -> Bounds {
        Bounds::new(
            self.first_column as f64 * grid_step,
            (self.last_column + 1) as f64 * grid_step,
            self.first_row as f64 * grid_step,
            (self.last_row + 1) as f64 * grid_step,
        )
    }
}

/// Static scene dimensions, read once by the renderer at setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Width in simulation units; a multiple of `grid_step`.
    pub width: f64,
    /// Height in simulation units; a multiple of `grid_step`.
    pub height: f64,
    /// Side length of one square.
    pub grid_step: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 300.0,
            grid_step: 20.0,
        }
    }
}

impl GridSettings {
    pub fn new(width: f64, height: f64, grid_step: f64) -> Self {
        Self {
            width,
            height,
            grid_step,
        }
    }

    /// Number of square columns.
    pub fn columns(&self) -> usize {
        (self.width / self.grid_step).round() as usize
    }

    /// Number of square rows.
    pub fn rows(&self) -> usize {
        (self.height / self.grid_step).round() as usize
    }

    /// Check the dimensions describe a whole number of positive cells.
    pub fn is_valid(&self) -> bool {
        let whole = |len: f64| {
            let cells = len / self.grid_step;
            cells >= 1.0 && (cells - cells.round()).abs() < 1e-9
        };
        self.grid_step > 0.0 && self.grid_step.is_finite() && whole(self.width) && whole(self.height)
    }
}
