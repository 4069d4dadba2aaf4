use std::f64::consts::PI;

/// A circle in logical drawing space. Y grows downwards, like a screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    center_x: f64,
    center_y: f64,
    radius: f64,
}

impl Circle {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius,
        }
    }
}

impl Default for Circle {
    fn default() -> Self {
        Self::new(600.0, 400.0, 200.0)
    }
}

/// Angle in radians of `point` out of `num_points` evenly spaced points.
///
/// Point 0 sits at π (the leftmost point) and increasing indices walk
/// clockwise once the Y axis is flipped by [`coordinates_of`].
#[inline]
pub fn angle_of(point: f64, num_points: usize) -> f64 {
    -point / num_points as f64 * (2.0 * PI) + PI
}

/// Convert an angle on `circle` to Y-down cartesian coordinates.
#[inline]
pub fn coordinates_of(angle: f64, circle: &Circle) -> (f64, f64) {
    (
        angle.cos() * circle.radius + circle.center_x,
        -angle.sin() * circle.radius + circle.center_y,
    )
}

/// Compute a circle that fits within the given area, accounting for aspect ratio.
/// `aspect_ratio`: width/height of a single unit (1.0 for square braille dots).
/// Returns (center_x, center_y, max_radius) in the grid's coordinate system.
pub fn fit_circle(area_w: usize, area_h: usize, aspect_ratio: f64) -> (f64, f64, f64) {
    let cx = area_w as f64 / 2.0;
    let cy = area_h as f64 / 2.0;
    let effective_w = area_w as f64 / aspect_ratio;
    let max_radius = (effective_w.min(area_h as f64) / 2.0) * 0.95;
    (cx, cy, max_radius)
}

/// Maps logical circle space onto a render grid so the circle fills the grid.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    source: Circle,
    grid_cx: f64,
    grid_cy: f64,
    scale: f64,
}

impl Viewport {
    pub fn new(source: &Circle, grid_w: usize, grid_h: usize) -> Self {
        let (grid_cx, grid_cy, grid_r) = fit_circle(grid_w, grid_h, 1.0);
        let scale = if source.radius > 0.0 {
            grid_r / source.radius
        } else {
            0.0
        };
        Self {
            source: *source,
            grid_cx,
            grid_cy,
            scale,
        }
    }

    /// Project a logical point into grid coordinates.
    #[inline]
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.grid_cx + (x - self.source.center_x) * self.scale,
            self.grid_cy + (y - self.source.center_y) * self.scale,
        )
    }

    pub fn grid_radius(&self) -> f64 {
        self.source.radius * self.scale
    }

    pub fn grid_center(&self) -> (f64, f64) {
        (self.grid_cx, self.grid_cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn point_zero_is_pi() {
        for n in [1, 4, 10, 360, 500] {
            assert!(close(angle_of(0.0, n), PI));
        }
    }

    #[test]
    fn angles_stay_in_half_open_range() {
        let n = 37;
        for p in 0..n {
            let a = angle_of(p as f64, n);
            assert!(a > -PI && a <= PI, "angle {a} for point {p}");
        }
    }

    #[test]
    fn angles_decrease_with_point_index() {
        let n = 12;
        let quarter = angle_of(3.0, n);
        assert!(close(quarter, PI / 2.0));
        assert!(angle_of(4.0, n) < quarter);
    }

    #[test]
    fn point_zero_is_leftmost() {
        let circle = Circle::new(600.0, 400.0, 200.0);
        for n in [3, 10, 1000] {
            let (x, y) = coordinates_of(angle_of(0.0, n), &circle);
            assert!(close(x, 400.0));
            assert!(close(y, 400.0));
        }
    }

    #[test]
    fn quarter_turn_is_top_on_y_down_screen() {
        // Clockwise from the left point means the next quarter is the top.
        let circle = Circle::new(0.0, 0.0, 10.0);
        let (x, y) = coordinates_of(angle_of(1.0, 4), &circle);
        assert!(close(x, 0.0));
        assert!(close(y, -10.0));
    }

    #[test]
    fn fit_circle_uses_smaller_dimension() {
        let (cx, cy, r) = fit_circle(200, 100, 1.0);
        assert!(close(cx, 100.0));
        assert!(close(cy, 50.0));
        assert!(close(r, 47.5));
    }

    #[test]
    fn viewport_maps_circle_onto_grid() {
        let circle = Circle::new(600.0, 400.0, 200.0);
        let viewport = Viewport::new(&circle, 100, 100);
        let (gx, gy) = viewport.project(600.0, 400.0);
        assert!(close(gx, 50.0));
        assert!(close(gy, 50.0));

        let (lx, ly) = viewport.project(400.0, 400.0);
        assert!(close(lx, 50.0 - viewport.grid_radius()));
        assert!(close(ly, 50.0));
        assert!(close(viewport.grid_radius(), 47.5));
    }
}
