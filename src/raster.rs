//! Bitmap to braille conversion
//!
//! A captured RGB frame is thresholded into a [`DotMatrix`], which is packed
//! into 8-dot braille cells (2 dots wide, 4 tall). Cell bit `i` is the dot at
//! `BRAILLE_OFFSETS[i]`, the same order Unicode braille patterns use.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;

/// `(x, y)` of the dot carried by each bit of a cell
pub const BRAILLE_OFFSETS: [(usize, usize); 8] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 0),
    (1, 1),
    (1, 2),
    (0, 3),
    (1, 3),
];

/// Dots per cell horizontally
pub const CELL_WIDTH: usize = 2;
/// Dots per cell vertically
pub const CELL_HEIGHT: usize = 4;

/// Threshold scale used by the threshold slider
pub const THRESHOLD_OUT_OF: f64 = 100.0;

/// Row-major boolean dot grid
#[derive(Clone, PartialEq, Eq)]
pub struct DotMatrix {
    width: usize,
    height: usize,
    dots: Vec<bool>,
}

impl DotMatrix {
    /// All-clear matrix
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![false; width * height],
        }
    }

    /// Build from rows; rows shorter than the first are padded with clear dots.
    pub fn from_rows(rows: &[Vec<bool>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let mut m = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, &dot) in row.iter().take(width).enumerate() {
                m.set(x, y, dot);
            }
        }
        m
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dot at `(x, y)`; outside the matrix reads as clear
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.dots[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.dots[y * self.width + x] = value;
        }
    }

    pub fn count_set(&self) -> usize {
        self.dots.iter().filter(|d| **d).count()
    }

    /// Copy a `width × height` block starting at `(x0, y0)`.
    ///
    /// Offsets may be negative; anything outside the source reads as clear.
    pub fn crop(&self, x0: i64, y0: i64, width: usize, height: usize) -> Self {
        let mut out = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let sx = x0 + x as i64;
                let sy = y0 + y as i64;
                if sx >= 0 && sy >= 0 {
                    out.set(x, y, self.get(sx as usize, sy as usize));
                }
            }
        }
        out
    }

    /// Reverse both axes
    pub fn rotate_180(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set(x, y, self.get(self.width - 1 - x, self.height - 1 - y));
            }
        }
        out
    }

    /// Place `right` after `self`, row by row. Height is the shorter of the two.
    pub fn join_horizontal(&self, right: &DotMatrix) -> Self {
        let height = self.height.min(right.height);
        let mut out = Self::new(self.width + right.width, height);
        for y in 0..height {
            for x in 0..self.width {
                out.set(x, y, self.get(x, y));
            }
            for x in 0..right.width {
                out.set(self.width + x, y, right.get(x, y));
            }
        }
        out
    }
}

impl fmt::Debug for DotMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DotMatrix {}x{}", self.width, self.height)?;
        for y in 0..self.height {
            let row: String = (0..self.width)
                .map(|x| if self.get(x, y) { '#' } else { '.' })
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Which colour value is compared against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChannel {
    #[default]
    Luminance,
    Red,
    Green,
    Blue,
}

impl ColorChannel {
    /// Next channel in the cycle Luminance → Red → Green → Blue → Luminance
    pub fn next(self) -> Self {
        match self {
            ColorChannel::Luminance => ColorChannel::Red,
            ColorChannel::Red => ColorChannel::Green,
            ColorChannel::Green => ColorChannel::Blue,
            ColorChannel::Blue => ColorChannel::Luminance,
        }
    }

    /// Channel value in `0..=255`
    pub fn value(self, [r, g, b]: [u8; 3]) -> f64 {
        let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
        match self {
            ColorChannel::Luminance => 0.299 * r + 0.587 * g + 0.114 * b,
            ColorChannel::Red => r,
            ColorChannel::Green => g,
            ColorChannel::Blue => b,
        }
    }
}

impl fmt::Display for ColorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorChannel::Luminance => "luminance",
            ColorChannel::Red => "red",
            ColorChannel::Green => "green",
            ColorChannel::Blue => "blue",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "luminance" | "luma" | "l" => Ok(ColorChannel::Luminance),
            "red" | "r" => Ok(ColorChannel::Red),
            "green" | "g" => Ok(ColorChannel::Green),
            "blue" | "b" => Ok(ColorChannel::Blue),
            other => Err(format!("unknown color channel: {other}")),
        }
    }
}

/// Threshold settings for one conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSettings {
    /// Threshold on a 0..=100 scale
    pub threshold: f64,
    /// Raise dots for values below the threshold instead of above
    pub reversed: bool,
    pub channel: ColorChannel,
}

impl RasterSettings {
    /// Whether a pixel raises its dot
    pub fn dot(&self, rgb: [u8; 3]) -> bool {
        let level = self.threshold / THRESHOLD_OUT_OF * 255.0;
        let value = self.channel.value(rgb);
        if self.reversed {
            value < level
        } else {
            value > level
        }
    }
}

/// Threshold every pixel of `frame` into a dot matrix of the same size
pub fn bitmap_to_dots(frame: &RgbImage, settings: &RasterSettings) -> DotMatrix {
    let (w, h) = frame.dimensions();
    let mut out = DotMatrix::new(w as usize, h as usize);
    for (x, y, px) in frame.enumerate_pixels() {
        out.set(x as usize, y as usize, settings.dot(px.0));
    }
    out
}

/// Pack a dot matrix into cells, row-major over cells.
///
/// Trailing dots that do not fill a whole cell are dropped.
pub fn image_to_cells(image: &DotMatrix) -> Vec<u8> {
    let cols = image.width() / CELL_WIDTH;
    let rows = image.height() / CELL_HEIGHT;
    let mut out = Vec::with_capacity(cols * rows);
    for cell_y in 0..rows {
        for cell_x in 0..cols {
            let cell = BRAILLE_OFFSETS
                .iter()
                .enumerate()
                .filter(|(_, (dx, dy))| {
                    image.get(cell_x * CELL_WIDTH + dx, cell_y * CELL_HEIGHT + dy)
                })
                .fold(0u8, |acc, (bit, _)| acc | (1 << bit));
            out.push(cell);
        }
    }
    out
}

/// Unpack `rows` rows of cells into a dot matrix
pub fn cells_to_image(cells: &[u8], rows: usize) -> DotMatrix {
    if rows == 0 {
        return DotMatrix::new(0, 0);
    }
    let cols = cells.len() / rows;
    let mut image = DotMatrix::new(cols * CELL_WIDTH, rows * CELL_HEIGHT);
    for (i, &cell) in cells.iter().take(cols * rows).enumerate() {
        let cell_x = i % cols;
        let cell_y = i / cols;
        for (bit, (dx, dy)) in BRAILLE_OFFSETS.iter().enumerate() {
            image.set(
                cell_x * CELL_WIDTH + dx,
                cell_y * CELL_HEIGHT + dy,
                (cell >> bit) & 1 == 1,
            );
        }
    }
    image
}

/// Unicode braille pattern for a cell
pub fn cell_to_char(cell: u8) -> char {
    char::from_u32(0x2800 + u32::from(cell)).unwrap_or(' ')
}

/// Render `cells` as lines of Unicode braille, `cols` cells per line
pub fn cells_to_text(cells: &[u8], cols: usize) -> String {
    if cols == 0 {
        return String::new();
    }
    cells
        .chunks(cols)
        .map(|row| row.iter().map(|c| cell_to_char(*c)).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn settings(reversed: bool, channel: ColorChannel) -> RasterSettings {
        RasterSettings {
            threshold: 50.0,
            reversed,
            channel,
        }
    }

    #[test]
    fn test_luminance_threshold() {
        let s = settings(false, ColorChannel::Luminance);
        assert!(s.dot([200, 200, 200]));
        assert!(!s.dot([10, 10, 10]));

        let r = settings(true, ColorChannel::Luminance);
        assert!(!r.dot([200, 200, 200]));
        assert!(r.dot([10, 10, 10]));
    }

    #[test]
    fn test_channels_select_correct_component() {
        let s = |c| settings(false, c);
        let green = [0, 255, 0];
        assert!(s(ColorChannel::Green).dot(green));
        assert!(!s(ColorChannel::Blue).dot(green));
        assert!(!s(ColorChannel::Red).dot(green));
        // 0.587 × 255 ≈ 149.7 > 127.5
        assert!(s(ColorChannel::Luminance).dot(green));
        // 0.114 × 255 ≈ 29 < 127.5
        assert!(!s(ColorChannel::Luminance).dot([0, 0, 255]));
    }

    #[test]
    fn test_channel_cycle() {
        let mut c = ColorChannel::Luminance;
        let mut seen = vec![c];
        for _ in 0..3 {
            c = c.next();
            seen.push(c);
        }
        assert_eq!(c.next(), ColorChannel::Luminance);
        assert_eq!(seen.len(), 4);
        assert_eq!("Green".parse::<ColorChannel>(), Ok(ColorChannel::Green));
    }

    #[test]
    fn test_bitmap_to_dots() {
        let mut frame = RgbImage::new(2, 4);
        frame.put_pixel(1, 3, Rgb([200, 200, 200]));
        let dots = bitmap_to_dots(&frame, &settings(false, ColorChannel::Luminance));
        assert_eq!(dots.count_set(), 1);
        assert!(dots.get(1, 3));
        assert_eq!(image_to_cells(&dots), vec![0x80]);
    }

    #[test]
    fn test_bit_weights_follow_offsets() {
        for (bit, (x, y)) in BRAILLE_OFFSETS.iter().enumerate() {
            let mut m = DotMatrix::new(2, 4);
            m.set(*x, *y, true);
            assert_eq!(image_to_cells(&m), vec![1u8 << bit]);
        }
    }

    #[test]
    fn test_full_cell_is_255() {
        let m = DotMatrix::from_rows(&vec![vec![true; 2]; 4]);
        assert_eq!(image_to_cells(&m), vec![255]);
    }

    #[test]
    fn test_cells_round_trip() {
        // Deterministic pseudo-random matrices of several sizes
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        for (cols, rows) in [(1, 1), (12, 4), (24, 8), (3, 2)] {
            let mut m = DotMatrix::new(cols * 2, rows * 4);
            for y in 0..rows * 4 {
                for x in 0..cols * 2 {
                    seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                    m.set(x, y, seed >> 63 == 1);
                }
            }
            let cells = image_to_cells(&m);
            assert_eq!(cells.len(), cols * rows);
            assert_eq!(cells_to_image(&cells, rows), m);
        }
    }

    #[test]
    fn test_cells_row_major() {
        let cells = [1u8, 0, 0, 0, 0, 8];
        let m = cells_to_image(&cells, 2);
        assert_eq!((m.width(), m.height()), (6, 8));
        assert!(m.get(0, 0));
        // Cell 5 is column 2 of row 1, bit 3 is dot (1, 0)
        assert!(m.get(5, 4));
        assert_eq!(m.count_set(), 2);
    }

    #[test]
    fn test_rotate_180() {
        let mut m = DotMatrix::new(4, 4);
        m.set(0, 1, true);
        let r = m.rotate_180();
        assert!(r.get(3, 2));
        assert_eq!(r.count_set(), 1);
        assert_eq!(r.rotate_180(), m);
    }

    #[test]
    fn test_crop_and_join() {
        let mut m = DotMatrix::new(4, 4);
        m.set(3, 0, true);
        let left = m.crop(0, 0, 2, 4);
        let right = m.crop(2, 0, 2, 4);
        assert_eq!(left.count_set(), 0);
        assert!(right.get(1, 0));
        assert_eq!(left.join_horizontal(&right), m);
        // Outside reads as clear
        assert_eq!(m.crop(-2, 0, 2, 4).count_set(), 0);
    }

    #[test]
    fn test_cell_to_char() {
        assert_eq!(cell_to_char(0), '\u{2800}');
        assert_eq!(cell_to_char(255), '\u{28FF}');
        assert_eq!(cells_to_text(&[0, 255, 1, 2], 2), "\u{2800}\u{28FF}\n\u{2801}\u{2802}");
    }
}
