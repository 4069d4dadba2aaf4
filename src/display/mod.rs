pub mod clock;
pub mod terminal;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How much of the sweep each clock tick draws.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Clear and redraw a complete revolution every tick
    #[default]
    Revolution,
    /// Add one chord per tick, clearing when a new revolution starts
    Chord,
}
