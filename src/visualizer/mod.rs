mod braille;
mod geometry;
mod sweep;

pub use braille::BrailleCanvas;
pub use geometry::{Circle, Viewport};
pub use sweep::{SegmentBuffer, SweepController, SweepPhase, VisualizationState};
