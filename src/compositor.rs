//! Splitting one logical cell grid across tiled panels
//!
//! Up to four 12×4-cell panel halves sit at the corners of a 24×8 super
//! grid. A panel mounted upside-down occupies a top corner and shows its
//! block rotated by 180° so it reads upright to the user.

use std::fmt;

use cadence_transport::Handedness;

use crate::canvas::DeviceExtent;
use crate::raster::{cells_to_image, image_to_cells, DotMatrix, CELL_HEIGHT, CELL_WIDTH};

/// Cell columns of one panel half
pub const SIDE_COLUMNS: u32 = 12;
/// Cell rows of one panel half
pub const SIDE_ROWS: u32 = 4;

const SIDE_DOTS_WIDE: usize = SIDE_COLUMNS as usize * CELL_WIDTH;
const SIDE_DOTS_TALL: usize = SIDE_ROWS as usize * CELL_HEIGHT;

/// Which half of the hardware a set of keys and dots belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl From<Handedness> for Side {
    fn from(h: Handedness) -> Self {
        match h {
            Handedness::Left => Side::Left,
            Handedness::Right => Side::Right,
        }
    }
}

/// Placement of a panel half in the super grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Corner {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

impl Corner {
    /// Corner a side lands on.
    ///
    /// Turning a panel upside-down moves it diagonally: a left half ends up
    /// top-right, a right half top-left.
    pub fn for_side(side: Side, flipped: bool) -> Self {
        match (side, flipped) {
            (Side::Left, false) => Corner::BottomLeft,
            (Side::Left, true) => Corner::TopRight,
            (Side::Right, false) => Corner::BottomRight,
            (Side::Right, true) => Corner::TopLeft,
        }
    }

    pub fn is_top(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    pub fn is_bottom(self) -> bool {
        !self.is_top()
    }

    pub fn is_right(self) -> bool {
        matches!(self, Corner::BottomRight | Corner::TopRight)
    }

    pub fn is_left(self) -> bool {
        !self.is_right()
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Corner::BottomLeft => "BL",
            Corner::BottomRight => "BR",
            Corner::TopLeft => "TL",
            Corner::TopRight => "TR",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Size of the logical grid and where it sits in the super grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub num_cols: u32,
    pub num_rows: u32,
    /// Columns of the super grid left of the logical grid
    pub offset_cols: u32,
    /// Rows of the super grid above the logical grid
    pub offset_rows: u32,
}

impl GridGeometry {
    /// Derive the grid from the occupied corners.
    ///
    /// Width doubles only when some left and some right corner are both
    /// occupied, height only when a top and a bottom corner are.
    pub fn from_corners(corners: &[Corner]) -> Self {
        let any_left = corners.iter().any(|c| c.is_left());
        let any_right = corners.iter().any(|c| c.is_right());
        let any_top = corners.iter().any(|c| c.is_top());
        let any_bottom = corners.iter().any(|c| c.is_bottom());

        let (num_cols, offset_cols) = if any_left && any_right {
            (SIDE_COLUMNS * 2, 0)
        } else if any_right {
            (SIDE_COLUMNS, SIDE_COLUMNS)
        } else {
            (SIDE_COLUMNS, 0)
        };

        let (num_rows, offset_rows) = if any_top && any_bottom {
            (SIDE_ROWS * 2, 0)
        } else if any_bottom {
            (SIDE_ROWS, SIDE_ROWS)
        } else {
            (SIDE_ROWS, 0)
        };

        Self {
            num_cols,
            num_rows,
            offset_cols,
            offset_rows,
        }
    }

    pub fn cell_count(&self) -> usize {
        (self.num_cols * self.num_rows) as usize
    }

    pub fn extent(&self) -> DeviceExtent {
        DeviceExtent::from_cells(self.num_cols, self.num_rows)
    }
}

/// Truncate or zero-pad `cells` to exactly `len`
pub fn fit_cells(cells: &[u8], len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = cells.iter().copied().take(len).collect();
    out.resize(len, 0);
    out
}

/// The 24×16-dot block shown by the panel half at `corner`
pub fn extract_panel_image(full: &DotMatrix, corner: Corner, geometry: &GridGeometry) -> DotMatrix {
    let x_base = if corner.is_right() { SIDE_DOTS_WIDE as i64 } else { 0 };
    let y_base = if corner.is_bottom() { SIDE_DOTS_TALL as i64 } else { 0 };
    let x_offset = x_base - i64::from(geometry.offset_cols) * CELL_WIDTH as i64;
    let y_offset = y_base - i64::from(geometry.offset_rows) * CELL_HEIGHT as i64;

    let block = full.crop(x_offset, y_offset, SIDE_DOTS_WIDE, SIDE_DOTS_TALL);
    if corner.is_top() {
        block.rotate_180()
    } else {
        block
    }
}

/// Split logical `cells` into one cell buffer per panel.
///
/// `panels` lists the corners each panel occupies in side order; a bridged
/// panel's halves are joined left to right before packing.
pub fn compose(cells: &[u8], geometry: &GridGeometry, panels: &[Vec<Corner>]) -> Vec<Vec<u8>> {
    let cells = fit_cells(cells, geometry.cell_count());
    let full = cells_to_image(&cells, geometry.num_rows as usize);

    panels
        .iter()
        .map(|corners| {
            let image = corners
                .iter()
                .map(|c| extract_panel_image(&full, *c, geometry))
                .reduce(|left, right| left.join_horizontal(&right))
                .unwrap_or_else(|| DotMatrix::new(0, 0));
            image_to_cells(&image)
        })
        .collect()
}
