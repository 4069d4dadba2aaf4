use clap::ValueEnum;
use palette::{Hsl, IntoColor, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stroke colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::opaque(1.0, 1.0, 1.0);

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::opaque(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Quantise to 8-bit channels, pre-multiplied by alpha.
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let q = |c: f32| ((c * self.a).clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How the draw colour evolves when a revolution completes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Keep the starting colour forever
    Fixed,
    /// New uniformly random RGB each revolution
    #[default]
    Random,
    /// Walk the hue wheel by a golden angle each revolution
    Cycle,
}

impl ColorMode {
    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Fixed => "fixed",
            ColorMode::Random => "random",
            ColorMode::Cycle => "cycle",
        }
    }

    pub fn all() -> &'static [ColorMode] {
        &[ColorMode::Fixed, ColorMode::Random, ColorMode::Cycle]
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let current = all.iter().position(|c| c == self).unwrap_or(0);
        all[(current + 1) % all.len()]
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "none" => Ok(Self::Fixed),
            "random" => Ok(Self::Random),
            "cycle" | "hue" => Ok(Self::Cycle),
            _ => Err(format!("Unknown color mode: {}", s)),
        }
    }
}

const GOLDEN_ANGLE_DEG: f32 = 137.507_76;

/// Produces the next draw colour according to a [`ColorMode`].
pub struct ColorCycler {
    mode: ColorMode,
    rng: StdRng,
    hue: f32,
}

impl ColorCycler {
    /// `seed` makes random colours reproducible.
    pub fn new(mode: ColorMode, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { mode, rng, hue: 0.0 }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
    }

    pub fn next_color(&mut self, current: Rgba) -> Rgba {
        match self.mode {
            ColorMode::Fixed => current,
            ColorMode::Random => Rgba::opaque(
                self.rng.random::<f32>(),
                self.rng.random::<f32>(),
                self.rng.random::<f32>(),
            ),
            ColorMode::Cycle => {
                self.hue = (self.hue + GOLDEN_ANGLE_DEG) % 360.0;
                let rgb: Srgb = Hsl::new(self.hue, 0.85, 0.6).into_color();
                Rgba::opaque(rgb.red, rgb.green, rgb.blue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_mode_keeps_colour() {
        let mut cycler = ColorCycler::new(ColorMode::Fixed, Some(1));
        let start = Rgba::opaque(0.2, 0.4, 0.6);
        assert_eq!(cycler.next_color(start), start);
    }

    #[test]
    fn random_mode_stays_in_unit_range_with_opaque_alpha() {
        let mut cycler = ColorCycler::new(ColorMode::Random, Some(42));
        let mut color = Rgba::WHITE;
        for _ in 0..100 {
            color = cycler.next_color(color);
            for c in [color.r, color.g, color.b] {
                assert!((0.0..=1.0).contains(&c));
            }
            assert_eq!(color.a, 1.0);
        }
    }

    #[test]
    fn seeded_random_mode_is_reproducible() {
        let mut a = ColorCycler::new(ColorMode::Random, Some(7));
        let mut b = ColorCycler::new(ColorMode::Random, Some(7));
        for _ in 0..5 {
            assert_eq!(a.next_color(Rgba::WHITE), b.next_color(Rgba::WHITE));
        }
    }

    #[test]
    fn cycle_mode_changes_hue_each_call() {
        let mut cycler = ColorCycler::new(ColorMode::Cycle, None);
        let first = cycler.next_color(Rgba::WHITE);
        let second = cycler.next_color(first);
        assert_ne!(first, second);
        assert_eq!(second.a, 1.0);
    }

    #[test]
    fn parse_and_rotate_modes() {
        assert_eq!("Random".parse::<ColorMode>(), Ok(ColorMode::Random));
        assert_eq!("hue".parse::<ColorMode>(), Ok(ColorMode::Cycle));
        assert!("plaid".parse::<ColorMode>().is_err());
        assert_eq!(ColorMode::Cycle.next(), ColorMode::Fixed);
    }

    #[test]
    fn rgb8_round_trips_primary_channels() {
        assert_eq!(Rgba::from_rgb8(233, 150, 122).to_rgb8(), (233, 150, 122));
        assert_eq!(Rgba::WHITE.to_rgb8(), (255, 255, 255));
    }
}
