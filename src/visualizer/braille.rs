use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

use super::geometry::Viewport;
use super::sweep::LineSegment;

/// Braille dot positions within a 2x4 cell:
/// (0,0)=0x01 (1,0)=0x08
/// (0,1)=0x02 (1,1)=0x10
/// (0,2)=0x04 (1,2)=0x20
/// (0,3)=0x40 (1,3)=0x80
pub const DOT_MAP: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40],
    [0x08, 0x10, 0x20, 0x80],
];

/// A canvas for sub-character braille rendering.
/// Each terminal character cell maps to a 2x4 grid of braille dots and
/// carries the colour of the last dot drawn into it.
pub struct BrailleCanvas {
    pub grid: Vec<bool>,
    pub grid_w: usize,
    pub grid_h: usize,
    cell_colors: Vec<Option<(u8, u8, u8)>>,
    char_w: usize,
    char_h: usize,
}

impl BrailleCanvas {
    /// Create a new braille canvas for the given character dimensions.
    pub fn new(char_w: usize, char_h: usize) -> Self {
        let grid_w = char_w * 2;
        let grid_h = char_h * 4;
        Self {
            grid: vec![false; grid_w * grid_h],
            grid_w,
            grid_h,
            cell_colors: vec![None; char_w * char_h],
            char_w,
            char_h,
        }
    }

    /// Set a single dot on the braille grid (bounds-checked).
    #[inline]
    pub fn set(&mut self, gx: isize, gy: isize, color: (u8, u8, u8)) {
        if gx < 0 || gy < 0 {
            return;
        }
        let (gx, gy) = (gx as usize, gy as usize);
        if gx < self.grid_w && gy < self.grid_h {
            self.grid[gy * self.grid_w + gx] = true;
            self.cell_colors[(gy / 4) * self.char_w + gx / 2] = Some(color);
        }
    }

    pub fn is_set(&self, gx: usize, gy: usize) -> bool {
        gx < self.grid_w && gy < self.grid_h && self.grid[gy * self.grid_w + gx]
    }

    /// Draw a line using Bresenham's algorithm. Endpoints may lie off-grid.
    pub fn line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: (u8, u8, u8)) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx: isize = if x0 < x1 { 1 } else { -1 };
        let sy: isize = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Plot a circle outline by sampling roughly one dot per unit of arc.
    pub fn circle(&mut self, cx: f64, cy: f64, radius: f64, color: (u8, u8, u8)) {
        let samples = ((radius * std::f64::consts::TAU).ceil() as usize).max(8);
        for i in 0..samples {
            let angle = i as f64 / samples as f64 * std::f64::consts::TAU;
            let x = cx + angle.cos() * radius;
            let y = cy + angle.sin() * radius;
            self.set(x.round() as isize, y.round() as isize, color);
        }
    }

    /// Rasterise chords through `viewport` into grid space.
    pub fn segments(&mut self, segments: &[LineSegment], viewport: &Viewport) {
        for segment in segments {
            let (x0, y0) = viewport.project(segment.start.0, segment.start.1);
            let (x1, y1) = viewport.project(segment.end.0, segment.end.1);
            self.line(
                x0.round() as isize,
                y0.round() as isize,
                x1.round() as isize,
                y1.round() as isize,
                segment.color.to_rgb8(),
            );
        }
    }

    /// Encode braille grid to characters and write them into `buf` at `area`.
    pub fn render(&self, buf: &mut Buffer, area: Rect) {
        for cy in 0..self.char_h.min(area.height as usize) {
            for cx in 0..self.char_w.min(area.width as usize) {
                let mut braille: u8 = 0;

                for (dx, col) in DOT_MAP.iter().enumerate() {
                    for (dy, &bit) in col.iter().enumerate() {
                        if self.is_set(cx * 2 + dx, cy * 4 + dy) {
                            braille |= bit;
                        }
                    }
                }

                if braille == 0 {
                    continue;
                }
                let Some((r, g, b)) = self.cell_colors[cy * self.char_w + cx] else {
                    continue;
                };
                let ch = char::from_u32(0x2800 + braille as u32).unwrap_or(' ');
                if let Some(cell) = buf.cell_mut((area.x + cx as u16, area.y + cy as u16)) {
                    cell.set_char(ch);
                    cell.set_fg(Color::Rgb(r, g, b));
                }
            }
        }
    }
}
