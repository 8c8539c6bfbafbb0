//! Expected pixel colours and aggregate colour counting.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use crate::error::VerifyError;
use crate::timing::{FrameGeometry, RasterPosition};

/// One sampled RGB triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red bit.
    pub red: bool,
    /// Green bit.
    pub green: bool,
    /// Blue bit.
    pub blue: bool,
}

impl Color {
    /// All channels off.
    pub const BLACK: Color = Color::rgb(false, false, false);
    /// Red and green.
    pub const YELLOW: Color = Color::rgb(true, true, false);
    /// Green only.
    pub const GREEN: Color = Color::rgb(false, true, false);

    /// Builds a colour from its channels.
    pub const fn rgb(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }

    /// Number of channels in which the two colours differ.
    pub fn distance(self, other: Color) -> u32 {
        u32::from(self.red != other.red)
            + u32::from(self.green != other.green)
            + u32::from(self.blue != other.blue)
    }
}

impl From<(bool, bool, bool)> for Color {
    fn from((red, green, blue): (bool, bool, bool)) -> Self {
        Self::rgb(red, green, blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgb({}, {}, {})",
            u8::from(self.red),
            u8::from(self.green),
            u8::from(self.blue)
        )
    }
}

/// Declared content of the visible area.
pub trait RegionPattern {
    /// The colour at a visible position, or `None` if this pattern says
    /// nothing about it.
    fn color_at(&self, pos: RasterPosition) -> Option<Color>;
}

/// One colour everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solid(pub Color);

impl RegionPattern for Solid {
    fn color_at(&self, _pos: RasterPosition) -> Option<Color> {
        Some(self.0)
    }
}

/// Vertical brick/mortar stripes: every `pitch` columns a brick, with
/// `edge_mortar` columns of mortar on each side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bricks {
    /// Columns per brick, mortar included.
    pub pitch: u32,
    /// Mortar columns at each edge of a brick.
    pub edge_mortar: u32,
    /// Brick colour.
    pub brick: Color,
    /// Mortar colour.
    pub mortar: Color,
}

impl RegionPattern for Bricks {
    fn color_at(&self, pos: RasterPosition) -> Option<Color> {
        if self.pitch == 0 {
            return None;
        }
        let x = pos.h % self.pitch;
        if x < self.edge_mortar || x >= self.pitch.saturating_sub(self.edge_mortar) {
            Some(self.mortar)
        } else {
            Some(self.brick)
        }
    }
}

/// Line ranges, each with its own pattern. Lines outside every band are
/// unconstrained.
#[derive(Default)]
pub struct Bands {
    bands: Vec<(Range<u32>, Box<dyn RegionPattern>)>,
}

impl Bands {
    /// No bands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a band; earlier bands win where ranges overlap.
    pub fn with(mut self, lines: Range<u32>, pattern: impl RegionPattern + 'static) -> Self {
        self.bands.push((lines, Box::new(pattern)));
        self
    }

    /// Number of bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Whether there are no bands.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl RegionPattern for Bands {
    fn color_at(&self, pos: RasterPosition) -> Option<Color> {
        self.bands
            .iter()
            .find(|(lines, _)| lines.contains(&pos.v))
            .and_then(|(_, pattern)| pattern.color_at(pos))
    }
}

/// Expected colour of any raster position: the pattern inside the visible
/// area, black during blanking.
#[derive(Clone)]
pub struct PixelChecker {
    geometry: FrameGeometry,
    pattern: Rc<dyn RegionPattern>,
}

impl PixelChecker {
    /// Creates a checker for `pattern` on `geometry`.
    pub fn new(geometry: FrameGeometry, pattern: Rc<dyn RegionPattern>) -> Self {
        Self { geometry, pattern }
    }

    /// The expected colour at `pos`, `None` if it is unconstrained.
    pub fn expected_color(&self, pos: RasterPosition) -> Option<Color> {
        if self.geometry.is_visible(pos) {
            self.pattern.color_at(pos)
        } else {
            Some(Color::BLACK)
        }
    }

    /// Whether `observed` is acceptable at `pos`.
    pub fn check(&self, pos: RasterPosition, observed: Color) -> bool {
        self.expected_color(pos).is_none_or(|c| c == observed)
    }
}

/// Tallies observed pixels into named colour classes.
#[derive(Clone, Debug, Default)]
pub struct ColorCounter {
    classes: Vec<(String, Color)>,
    counts: BTreeMap<String, u64>,
}

impl ColorCounter {
    /// A counter with every class at zero.
    pub fn new(classes: Vec<(String, Color)>) -> Self {
        let counts = classes.iter().map(|(name, _)| (name.clone(), 0)).collect();
        Self { classes, counts }
    }

    /// Counts one pixel. Returns `false`, counting nothing, when the colour
    /// belongs to no class.
    pub fn classify(&mut self, observed: Color) -> bool {
        match self.classes.iter().find(|(_, c)| *c == observed) {
            Some((name, _)) => {
                *self.counts.entry(name.clone()).or_default() += 1;
                true
            }
            None => false,
        }
    }

    /// The class colour closest to `observed`; ties go to the first class.
    pub fn nearest(&self, observed: Color) -> Option<Color> {
        self.classes
            .iter()
            .map(|(_, c)| *c)
            .min_by_key(|c| c.distance(observed))
    }

    /// Current tallies.
    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Compares every declared count, failing on the first difference.
    pub fn verify(&self, expected: &BTreeMap<String, u64>, cycle: u64) -> Result<(), VerifyError> {
        for (class, &want) in expected {
            let counted = self.counts.get(class).copied().unwrap_or(0);
            if counted != want {
                return Err(VerifyError::CountMismatch {
                    cycle,
                    class: class.clone(),
                    expected: want,
                    counted,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, v: u32) -> RasterPosition {
        RasterPosition { h, v }
    }

    fn wall() -> Bricks {
        Bricks {
            pitch: 32,
            edge_mortar: 2,
            brick: Color::GREEN,
            mortar: Color::YELLOW,
        }
    }

    #[test]
    fn brick_columns() {
        let b = wall();
        assert_eq!(b.color_at(at(0, 0)), Some(Color::YELLOW));
        assert_eq!(b.color_at(at(1, 0)), Some(Color::YELLOW));
        assert_eq!(b.color_at(at(2, 0)), Some(Color::GREEN));
        assert_eq!(b.color_at(at(29, 0)), Some(Color::GREEN));
        assert_eq!(b.color_at(at(30, 0)), Some(Color::YELLOW));
        assert_eq!(b.color_at(at(33, 0)), Some(Color::YELLOW));
        assert_eq!(b.color_at(at(34, 0)), Some(Color::GREEN));
    }

    #[test]
    fn bands_select_by_line() {
        let bands = Bands::new()
            .with(0..2, Solid(Color::YELLOW))
            .with(2..4, wall());
        assert_eq!(bands.len(), 2);
        assert_eq!(bands.color_at(at(5, 1)), Some(Color::YELLOW));
        assert_eq!(bands.color_at(at(5, 3)), Some(Color::GREEN));
        assert_eq!(bands.color_at(at(5, 4)), None);
    }

    #[test]
    fn blanking_is_black() {
        let checker = PixelChecker::new(
            FrameGeometry::VGA_640X480,
            Rc::new(Solid(Color::YELLOW)),
        );
        assert_eq!(checker.expected_color(at(639, 0)), Some(Color::YELLOW));
        assert_eq!(checker.expected_color(at(640, 0)), Some(Color::BLACK));
        assert_eq!(checker.expected_color(at(0, 480)), Some(Color::BLACK));
        assert!(checker.check(at(700, 0), Color::BLACK));
        assert!(!checker.check(at(10, 0), Color::BLACK));
    }

    #[test]
    fn unconstrained_lines_pass() {
        let checker = PixelChecker::new(
            FrameGeometry::VGA_640X480,
            Rc::new(Bands::new().with(0..1, Solid(Color::YELLOW))),
        );
        assert!(checker.check(at(10, 100), Color::GREEN));
    }

    #[test]
    fn brick_line_counts_with_first_column_exempt() {
        // Colour for column x shows up one cycle later, at column x + 1; the
        // column-0 exemption leaves x = 639 uncounted.
        let b = wall();
        let mut counter = ColorCounter::new(vec![
            ("yellow".into(), Color::YELLOW),
            ("green".into(), Color::GREEN),
        ]);
        for v in 0..2 {
            for h in 1..640 {
                if let Some(c) = b.color_at(at(h - 1, v)) {
                    counter.classify(c);
                }
            }
        }
        let mut expected = BTreeMap::new();
        expected.insert("yellow".to_string(), 158);
        expected.insert("green".to_string(), 1120);
        counter.verify(&expected, 0).unwrap();

        expected.insert("green".to_string(), 1121);
        let err = counter.verify(&expected, 7).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::CountMismatch { cycle: 7, counted: 1120, .. }
        ));
    }

    #[test]
    fn unclassified_colours_are_not_counted() {
        let mut counter = ColorCounter::new(vec![("green".into(), Color::GREEN)]);
        assert!(!counter.classify(Color::BLACK));
        assert!(counter.classify(Color::GREEN));
        assert_eq!(counter.counts().get("green"), Some(&1));
        assert_eq!(counter.counts().len(), 1);
    }

    #[test]
    fn nearest_class_by_differing_channels() {
        let counter = ColorCounter::new(vec![
            ("yellow".into(), Color::YELLOW),
            ("green".into(), Color::GREEN),
        ]);
        let cyan = Color::rgb(false, true, true);
        assert_eq!(counter.nearest(cyan), Some(Color::GREEN));
        let white = Color::rgb(true, true, true);
        assert_eq!(counter.nearest(white), Some(Color::YELLOW));
        assert_eq!(ColorCounter::new(vec![]).nearest(white), None);
        assert_eq!(white.distance(Color::BLACK), 3);
    }
}
