//! Chart colors.
//!
//! Colors serialize as CSS `rgba(...)` strings so chart specs can be handed
//! straight to a browser charting library; the terminal renderer uses the
//! RGB channels directly.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in percent (0–100).
    pub alpha_pct: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, alpha_pct: u8) -> Self {
        Self { r, g, b, alpha_pct }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alpha = f64::from(self.alpha_pct) / 100.0;
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub const RED: Color = Color::rgba(239, 68, 68, 80);
pub const ORANGE: Color = Color::rgba(245, 158, 11, 80);
pub const YELLOW: Color = Color::rgba(250, 204, 21, 80);
pub const BLUE: Color = Color::rgba(59, 130, 246, 80);
pub const PURPLE: Color = Color::rgba(139, 92, 246, 80);
pub const INDIGO: Color = Color::rgba(99, 102, 241, 100);

/// Fallback for categories missing from a semantic color mapping.
pub const NEUTRAL: Color = Color::rgba(100, 100, 100, 80);

/// Low → high ramp used for position-colored charts.
pub const RAMP: [Color; 5] = [RED, ORANGE, YELLOW, BLUE, PURPLE];

/// Effectiveness chart: More, Equally, Less.
pub const EFFECTIVENESS: [Color; 3] = [PURPLE, YELLOW, RED];

/// Color for the `index`-th bar of a position-colored chart.
///
/// Wraps around when a chart has more bars than the palette has colors.
pub fn indexed(palette: &[Color], index: usize) -> Color {
    if palette.is_empty() {
        return NEUTRAL;
    }
    palette[index % palette.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_css_rgba() {
        assert_eq!(RED.to_string(), "rgba(239, 68, 68, 0.8)");
        assert_eq!(INDIGO.to_string(), "rgba(99, 102, 241, 1)");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&NEUTRAL).unwrap();
        assert_eq!(json, "\"rgba(100, 100, 100, 0.8)\"");
    }

    #[test]
    fn indexed_wraps_around() {
        assert_eq!(indexed(&RAMP, 0), RED);
        assert_eq!(indexed(&RAMP, 4), PURPLE);
        assert_eq!(indexed(&RAMP, 5), RED);
        assert_eq!(indexed(&[], 3), NEUTRAL);
    }
}
