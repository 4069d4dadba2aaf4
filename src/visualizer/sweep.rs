use thiserror::Error;
use tracing::{debug, warn};

use super::geometry::{angle_of, coordinates_of, Circle};
use crate::color::{ColorCycler, Rgba};

/// A chord between two points on the circle, in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub color: Rgba,
}

/// Anything that can accumulate chords emitted by the sweep.
pub trait Surface {
    fn add_segment(&mut self, segment: LineSegment);
    fn clear_all(&mut self);
}

/// In-memory surface; the renderer replays it every frame.
#[derive(Debug, Default, Clone)]
pub struct SegmentBuffer {
    segments: Vec<LineSegment>,
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Surface for SegmentBuffer {
    fn add_segment(&mut self, segment: LineSegment) {
        self.segments.push(segment);
    }

    fn clear_all(&mut self) {
        self.segments.clear();
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SweepError {
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

impl SweepError {
    fn invalid(name: &'static str, value: impl ToString) -> Self {
        SweepError::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Paused,
    Running,
}

/// Mutable parameters of the visualization.
///
/// Invariant: `num_points >= 1` and `current_point < num_points`.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationState {
    pub num_points: usize,
    pub multiplier: f64,
    pub multiplier_increment: f64,
    pub current_point: usize,
    pub draw_color: Rgba,
    pub paused: bool,
    pub interval_millis: u64,
}

impl Default for VisualizationState {
    fn default() -> Self {
        Self {
            num_points: 10,
            multiplier: 2.0,
            multiplier_increment: 0.1,
            current_point: 0,
            draw_color: Rgba::WHITE,
            paused: true,
            interval_millis: 1,
        }
    }
}

impl VisualizationState {
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.num_points < 1 {
            return Err(SweepError::invalid("num_points", self.num_points));
        }
        if self.current_point >= self.num_points {
            return Err(SweepError::invalid("current_point", self.current_point));
        }
        if !self.multiplier.is_finite() {
            return Err(SweepError::invalid("multiplier", self.multiplier));
        }
        if !self.multiplier_increment.is_finite() {
            return Err(SweepError::invalid(
                "multiplier_increment",
                self.multiplier_increment,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Target index of the chord that was emitted (may be fractional).
    pub next_point: f64,
    pub revolution_complete: bool,
}

/// `(multiplier * point) mod num_points`, always in `[0, num_points)`.
///
/// The multiplier is reduced first so large values cannot overflow the
/// product; `point` is whole, so the result is unchanged.
pub fn chord_target(multiplier: f64, point: usize, num_points: usize) -> f64 {
    let n = num_points as f64;
    let target = (multiplier.rem_euclid(n) * point as f64).rem_euclid(n);
    // rem_euclid can round up to exactly n for tiny negative products
    if !target.is_finite() || target >= n {
        0.0
    } else {
        target
    }
}

/// Owns the visualization state and advances the sweep.
pub struct SweepController {
    circle: Circle,
    state: VisualizationState,
    colors: ColorCycler,
}

impl SweepController {
    pub fn new(
        circle: Circle,
        state: VisualizationState,
        colors: ColorCycler,
    ) -> Result<Self, SweepError> {
        state.validate()?;
        Ok(Self {
            circle,
            state,
            colors,
        })
    }

    pub fn circle(&self) -> &Circle {
        &self.circle
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn colors(&self) -> &ColorCycler {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut ColorCycler {
        &mut self.colors
    }

    pub fn phase(&self) -> SweepPhase {
        if self.state.paused {
            SweepPhase::Paused
        } else {
            SweepPhase::Running
        }
    }

    /// Emit one chord and advance the cursor.
    ///
    /// Does not look at the pause flag; the frame clock decides when to call.
    pub fn step<S: Surface + ?Sized>(&mut self, surface: &mut S) -> StepOutcome {
        let n = self.state.num_points;
        let current = self.state.current_point;
        let next_point = chord_target(self.state.multiplier, current, n);

        let start = coordinates_of(angle_of(current as f64, n), &self.circle);
        let end = coordinates_of(angle_of(next_point, n), &self.circle);
        surface.add_segment(LineSegment {
            start,
            end,
            color: self.state.draw_color,
        });

        self.state.current_point = (current + 1) % n;
        let revolution_complete = self.state.current_point == 0;
        if revolution_complete {
            let multiplier = self.state.multiplier + self.state.multiplier_increment;
            if multiplier.is_finite() {
                self.state.multiplier = multiplier;
            } else {
                warn!(
                    "Multiplier {} cannot grow further, holding it",
                    self.state.multiplier
                );
            }
            self.state.draw_color = self.colors.next_color(self.state.draw_color);
            debug!(
                "Revolution complete, multiplier now {:.3}",
                self.state.multiplier
            );
        }

        StepOutcome {
            next_point,
            revolution_complete,
        }
    }

    /// Step until the cursor wraps. Runs at most `num_points` steps and
    /// returns how many were taken. Pausing only applies between sweeps.
    pub fn draw_full_sweep<S: Surface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let bound = self.state.num_points;
        let mut steps = 0;
        while steps < bound {
            steps += 1;
            if self.step(surface).revolution_complete {
                break;
            }
        }
        steps
    }

    /// Move the cursor back to point 0 so the next sweep is a whole table.
    pub fn rewind(&mut self) {
        self.state.current_point = 0;
    }

    /// Drop every emitted chord. State is untouched.
    pub fn clear<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear_all();
    }

    pub fn set_multiplier(&mut self, multiplier: f64) -> Result<(), SweepError> {
        if !multiplier.is_finite() {
            return Err(SweepError::invalid("multiplier", multiplier));
        }
        self.state.multiplier = multiplier;
        Ok(())
    }

    pub fn set_mult_increment(&mut self, increment: f64) -> Result<(), SweepError> {
        if !increment.is_finite() {
            return Err(SweepError::invalid("multiplier_increment", increment));
        }
        self.state.multiplier_increment = increment;
        Ok(())
    }

    /// Rejects counts below 1. The cursor wraps into the new range.
    pub fn set_num_points(&mut self, num_points: i64) -> Result<(), SweepError> {
        if num_points < 1 {
            return Err(SweepError::invalid("num_points", num_points));
        }
        let n = usize::try_from(num_points)
            .map_err(|_| SweepError::invalid("num_points", num_points))?;
        self.state.num_points = n;
        self.state.current_point %= n;
        Ok(())
    }

    pub fn set_point(&mut self, point: usize) -> Result<(), SweepError> {
        if point >= self.state.num_points {
            return Err(SweepError::invalid("current_point", point));
        }
        self.state.current_point = point;
        Ok(())
    }

    pub fn set_interval_time(&mut self, millis: u64) {
        self.state.interval_millis = millis;
    }

    pub fn set_pause(&mut self, paused: bool) {
        self.state.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.state.paused = !self.state.paused;
        self.state.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;

    const EPS: f64 = 1e-9;

    fn controller(num_points: usize, multiplier: f64) -> SweepController {
        let state = VisualizationState {
            num_points,
            multiplier,
            ..VisualizationState::default()
        };
        SweepController::new(
            Circle::new(600.0, 400.0, 200.0),
            state,
            ColorCycler::new(ColorMode::Fixed, Some(0)),
        )
        .unwrap()
    }

    #[test]
    fn starts_paused_with_defaults() {
        let c = controller(10, 2.0);
        assert_eq!(c.phase(), SweepPhase::Paused);
        assert_eq!(c.state().current_point, 0);
        assert_eq!(c.state().multiplier, 2.0);
    }

    #[test]
    fn pause_transitions() {
        let mut c = controller(10, 2.0);
        c.set_pause(false);
        assert_eq!(c.phase(), SweepPhase::Running);
        c.set_pause(true);
        assert_eq!(c.phase(), SweepPhase::Paused);
        assert!(!c.toggle_pause());
        assert_eq!(c.phase(), SweepPhase::Running);
    }

    #[test]
    fn first_step_is_degenerate_chord() {
        let mut c = controller(10, 2.0);
        let mut surface = SegmentBuffer::new();
        let outcome = c.step(&mut surface);

        assert_eq!(outcome.next_point, 0.0);
        assert!(!outcome.revolution_complete);
        assert_eq!(surface.len(), 1);
        let seg = surface.segments()[0];
        assert!((seg.start.0 - seg.end.0).abs() < EPS);
        assert!((seg.start.1 - seg.end.1).abs() < EPS);
        assert!((seg.start.0 - 400.0).abs() < EPS);
        assert_eq!(c.state().current_point, 1);
    }

    #[test]
    fn three_times_table_on_four_points() {
        let mut c = controller(4, 3.0);
        let mut surface = SegmentBuffer::new();
        let targets: Vec<f64> = (0..4).map(|_| c.step(&mut surface).next_point).collect();
        assert_eq!(targets, vec![0.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn fractional_multiplier_uses_float_modulo() {
        let target = chord_target(2.3, 7, 10);
        assert!((target - 6.1).abs() < 1e-9);
        assert!((0.0..10.0).contains(&target));
    }

    #[test]
    fn chord_target_always_in_range() {
        for &m in &[0.0, 1.5, 2.0, 99.99, 1e9, 1e308, f64::MAX, -1e308, -3.7, -1e-300] {
            for n in [1, 7, 10, 360] {
                for p in 0..n {
                    let t = chord_target(m, p, n);
                    assert!(t >= 0.0 && t < n as f64, "m={m} p={p} n={n} t={t}");
                }
            }
        }
    }

    #[test]
    fn huge_multiplier_matches_reduced_multiplier() {
        // 1e308 is a multiple of 10, so every chord is degenerate
        assert_eq!(chord_target(1e308, 2, 10), 0.0);
        assert_eq!(chord_target(1e308, 7, 10), chord_target(0.0, 7, 10));
        assert!((chord_target(12.5, 3, 10) - chord_target(2.5, 3, 10)).abs() < 1e-9);
    }

    #[test]
    fn multiplier_never_overflows_on_wrap() {
        let mut c = controller(2, f64::MAX);
        c.set_mult_increment(f64::MAX).unwrap();
        let mut surface = SegmentBuffer::new();
        c.draw_full_sweep(&mut surface);
        let outcome = c.step(&mut surface);

        assert_eq!(c.state().multiplier, f64::MAX);
        assert!(c.state().validate().is_ok());
        assert!(outcome.next_point >= 0.0 && outcome.next_point < 2.0);
        assert!(surface
            .segments()
            .iter()
            .all(|s| s.end.0.is_finite() && s.end.1.is_finite()));
    }

    #[test]
    fn rewind_restarts_the_lap_without_touching_the_multiplier() {
        let mut c = controller(10, 2.0);
        let mut surface = SegmentBuffer::new();
        c.step(&mut surface);
        c.step(&mut surface);
        c.rewind();
        assert_eq!(c.state().current_point, 0);
        assert_eq!(c.state().multiplier, 2.0);
        assert_eq!(c.draw_full_sweep(&mut surface), 10);
    }

    #[test]
    fn full_revolution_restores_point_and_adds_one_increment() {
        let mut c = controller(10, 2.0);
        c.set_mult_increment(0.25).unwrap();
        c.set_point(3).unwrap();
        let mut surface = SegmentBuffer::new();

        for _ in 0..10 {
            c.step(&mut surface);
            assert!(c.state().current_point < 10);
        }
        assert_eq!(c.state().current_point, 3);
        assert!((c.state().multiplier - 2.25).abs() < EPS);
    }

    #[test]
    fn full_sweep_is_bounded_by_point_count() {
        let mut c = controller(360, 2.0);
        let mut surface = SegmentBuffer::new();
        let steps = c.draw_full_sweep(&mut surface);
        assert_eq!(steps, 360);
        assert_eq!(surface.len(), 360);
        assert_eq!(c.state().current_point, 0);
        assert!((c.state().multiplier - 2.1).abs() < EPS);
    }

    #[test]
    fn full_sweep_from_mid_point_stops_at_wrap() {
        let mut c = controller(10, 2.0);
        c.set_point(7).unwrap();
        let mut surface = SegmentBuffer::new();
        assert_eq!(c.draw_full_sweep(&mut surface), 3);
        assert_eq!(c.state().current_point, 0);
    }

    #[test]
    fn single_point_wraps_every_step() {
        let mut c = controller(1, 2.0);
        let mut surface = SegmentBuffer::new();
        assert!(c.step(&mut surface).revolution_complete);
        assert_eq!(c.draw_full_sweep(&mut surface), 1);
    }

    #[test]
    fn rejects_non_positive_point_counts() {
        let mut c = controller(10, 2.0);
        let before = c.state().clone();
        assert!(matches!(
            c.set_num_points(0),
            Err(SweepError::InvalidParameter { name: "num_points", .. })
        ));
        assert!(c.set_num_points(-5).is_err());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn shrinking_point_count_keeps_cursor_in_range() {
        let mut c = controller(10, 2.0);
        c.set_point(8).unwrap();
        c.set_num_points(5).unwrap();
        assert_eq!(c.state().num_points, 5);
        assert_eq!(c.state().current_point, 3);
    }

    #[test]
    fn rejects_out_of_range_point_and_non_finite_multiplier() {
        let mut c = controller(10, 2.0);
        assert!(c.set_point(10).is_err());
        assert!(c.set_multiplier(f64::NAN).is_err());
        assert!(c.set_mult_increment(f64::INFINITY).is_err());
        assert_eq!(c.state().multiplier, 2.0);
        assert_eq!(c.state().current_point, 0);
    }

    #[test]
    fn clear_leaves_state_alone() {
        let mut c = controller(10, 2.0);
        let mut surface = SegmentBuffer::new();
        for _ in 0..4 {
            c.step(&mut surface);
        }
        let before = c.state().clone();
        c.clear(&mut surface);
        assert!(surface.is_empty());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn random_colour_changes_only_on_wrap() {
        let state = VisualizationState {
            num_points: 3,
            ..VisualizationState::default()
        };
        let mut c = SweepController::new(
            Circle::default(),
            state,
            ColorCycler::new(ColorMode::Random, Some(9)),
        )
        .unwrap();
        let mut surface = SegmentBuffer::new();
        c.step(&mut surface);
        c.step(&mut surface);
        assert_eq!(c.state().draw_color, Rgba::WHITE);
        c.step(&mut surface);
        assert_ne!(c.state().draw_color, Rgba::WHITE);
        assert_eq!(c.state().draw_color.a, 1.0);
        assert!(surface.segments().iter().all(|s| s.color == Rgba::WHITE));
    }

    #[test]
    fn rejects_inconsistent_initial_state() {
        let state = VisualizationState {
            num_points: 0,
            ..VisualizationState::default()
        };
        let result = SweepController::new(
            Circle::default(),
            state,
            ColorCycler::new(ColorMode::Fixed, None),
        );
        assert!(result.is_err());
    }
}
