/// Character-cell drawing surface for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point2;
use std::io::Write;
use wireproj_core::{DrawSurface, SurfaceSize};

/// Vertical pixels per character cell; cells are about twice as tall as wide
pub const PIXELS_PER_ROW: usize = 2;

const EDGE_GLYPH: char = '·';
const POINT_GLYPH: char = '●';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Edge,
    Point,
}

/// A grid of terminal cells addressed in pixel coordinates.
///
/// Each cell covers one pixel horizontally and `PIXELS_PER_ROW` vertically.
/// Points win over edges when both land in the same cell.
pub struct CellCanvas {
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl CellCanvas {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![Cell::Empty; columns * rows],
        }
    }

    pub fn resize(&mut self, columns: usize, rows: usize) {
        *self = Self::new(columns, rows);
    }

    /// Pixel dimensions exposed to the viewport
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.columns as u32, (self.rows * PIXELS_PER_ROW) as u32)
    }

    fn pixel_width(&self) -> f64 {
        self.columns as f64
    }

    fn pixel_height(&self) -> f64 {
        (self.rows * PIXELS_PER_ROW) as f64
    }

    fn plot(&mut self, x: i64, y: i64, cell: Cell) {
        if x < 0 || y < 0 {
            return;
        }
        let (column, row) = (x as usize, y as usize / PIXELS_PER_ROW);
        if column >= self.columns || row >= self.rows {
            return;
        }
        let slot = &mut self.cells[row * self.columns + column];
        if *slot != Cell::Point {
            *slot = cell;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in 0..self.rows {
            writer.queue(cursor::MoveTo(0, row as u16))?;
            for column in 0..self.columns {
                let (glyph, color) = match self.cells[row * self.columns + column] {
                    Cell::Empty => (' ', Color::Reset),
                    Cell::Edge => (EDGE_GLYPH, Color::Red),
                    Cell::Point => (POINT_GLYPH, Color::Blue),
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(glyph))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn cell(&self, column: usize, row: usize) -> Cell {
        self.cells[row * self.columns + column]
    }
}

impl DrawSurface for CellCanvas {
    fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>) {
        let Some((from, to)) = clip_segment(from, to, self.pixel_width(), self.pixel_height()) else {
            return;
        };

        // Bresenham between the clipped endpoints
        let (mut x0, mut y0) = (from.x.floor() as i64, from.y.floor() as i64);
        let (x1, y1) = (to.x.floor() as i64, to.y.floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x0, y0, Cell::Edge);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn circle(&mut self, center: Point2<f64>, radius: f64) {
        if !(center.x.is_finite() && center.y.is_finite()) {
            return;
        }
        let radius = radius.max(0.5);
        let min_x = (center.x - radius).floor().max(0.0) as i64;
        let max_x = (center.x + radius).ceil().min(self.pixel_width()) as i64;
        let min_y = (center.y - radius).floor().max(0.0) as i64;
        let max_y = (center.y + radius).ceil().min(self.pixel_height()) as i64;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= radius * radius {
                    self.plot(x, y, Cell::Point);
                }
            }
        }
    }
}

/// Liang–Barsky clip of a segment against `[0, width) x [0, height)`.
fn clip_segment(a: Point2<f64>, b: Point2<f64>, width: f64, height: f64) -> Option<(Point2<f64>, Point2<f64>)> {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return None;
    }

    let d = b - a;
    let (max_x, max_y) = (width - f64::EPSILON * width.max(1.0), height - f64::EPSILON * height.max(1.0));
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [(-d.x, a.x), (d.x, max_x - a.x), (-d.y, a.y), (d.y, max_y - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }

    if t0 > t1 {
        return None;
    }
    Some((a + d * t0, a + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_doubles_rows() {
        let canvas = CellCanvas::new(80, 24);
        assert_eq!(canvas.size(), SurfaceSize::new(80, 48));
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = CellCanvas::new(10, 5);
        canvas.line(Point2::new(1.0, 4.0), Point2::new(8.0, 4.0));
        for column in 1..=8 {
            assert_eq!(canvas.cell(column, 2), Cell::Edge);
        }
        assert_eq!(canvas.cell(0, 2), Cell::Empty);
        assert_eq!(canvas.cell(9, 2), Cell::Empty);
    }

    #[test]
    fn test_line_far_outside_is_clipped() {
        let mut canvas = CellCanvas::new(10, 5);
        canvas.line(Point2::new(-1e12, 3.0), Point2::new(1e12, 3.0));
        assert!((0..10).all(|column| canvas.cell(column, 1) == Cell::Edge));

        canvas.clear();
        canvas.line(Point2::new(-5.0, -5.0), Point2::new(-1.0, -9.0));
        assert!(canvas.cells.iter().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn test_non_finite_shapes_are_ignored() {
        let mut canvas = CellCanvas::new(10, 5);
        canvas.line(Point2::new(f64::NAN, 0.0), Point2::new(3.0, 3.0));
        canvas.circle(Point2::new(f64::INFINITY, 1.0), 3.0);
        assert!(canvas.cells.iter().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn test_points_cover_edges() {
        let mut canvas = CellCanvas::new(10, 5);
        canvas.circle(Point2::new(4.5, 4.5), 0.5);
        canvas.line(Point2::new(0.0, 4.0), Point2::new(9.0, 4.0));
        assert_eq!(canvas.cell(4, 2), Cell::Point);
        assert_eq!(canvas.cell(3, 2), Cell::Edge);
    }

    #[test]
    fn test_clear_resets_cells() {
        let mut canvas = CellCanvas::new(4, 4);
        canvas.circle(Point2::new(2.0, 2.0), 2.0);
        canvas.clear();
        assert!(canvas.cells.iter().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn test_draw_emits_output() {
        let mut canvas = CellCanvas::new(4, 2);
        canvas.circle(Point2::new(1.5, 1.5), 0.5);
        let mut out = Vec::new();
        canvas.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(POINT_GLYPH));
    }
}
