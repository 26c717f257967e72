/// Start of the default scan range.
pub const DEFAULT_START: f64 = 0.0;
/// End of the default scan range.
pub const DEFAULT_END: f64 = 100.0;
/// Each click-zoom shows this fraction of the previous range.
pub const ZOOM_FACTOR: f64 = 4.0;

/// Scan range along t.
///
/// `end > start` is expected but not enforced: direct edits are stored as
/// given and repeated zooms can narrow the range toward zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    start: f64,
    end: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
        }
    }
}

impl Viewport {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn range(&self) -> f64 {
        self.end - self.start
    }

    /// Quarter the range, centered on `center`.
    pub fn zoom_to(&mut self, center: f64) {
        let new_range = self.range() / ZOOM_FACTOR;
        self.start = center - new_range / 2.0;
        self.end = center + new_range / 2.0;
        log::debug!("zoom to {center}: [{}, {}]", self.start, self.end);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_start(&mut self, start: f64) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: f64) {
        self.end = end;
    }

    /// Shift the end bound by `delta`.
    pub fn nudge_end(&mut self, delta: f64) {
        self.end += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_quarters_and_centers() {
        let mut vp = Viewport::default();
        vp.zoom_to(50.0);
        assert_eq!(vp.start(), 37.5);
        assert_eq!(vp.end(), 62.5);
        assert_eq!(vp.range(), 25.0);
    }

    #[test]
    fn test_zoom_off_center() {
        let mut vp = Viewport::new(10.0, 30.0);
        vp.zoom_to(12.0);
        assert_eq!(vp.start(), 9.5);
        assert_eq!(vp.end(), 14.5);
    }

    #[test]
    fn test_repeated_zoom_narrows_without_bound() {
        let mut vp = Viewport::default();
        let mut previous = vp.range();
        for _ in 0..30 {
            vp.zoom_to(14.134725);
            assert!(vp.range() <= previous);
            previous = vp.range();
        }
        // below one ulp around t both bounds round onto the center
        assert!(vp.range() >= 0.0);
        assert!(vp.range() < 1e-14);
        assert_eq!(crate::request::scan_steps(vp.start(), vp.end()), 0);
    }

    #[test]
    fn test_reset_from_any_state() {
        for (s, e) in [(37.5, 62.5), (-10.0, -20.0), (1e9, 1e9 + 1.0)] {
            let mut vp = Viewport::new(s, e);
            vp.reset();
            assert_eq!(vp, Viewport::new(0.0, 100.0));
        }
    }

    #[test]
    fn test_edits_are_not_validated() {
        let mut vp = Viewport::default();
        vp.set_start(80.0);
        vp.set_end(20.0);
        assert_eq!(vp.range(), -60.0);
        vp.nudge_end(70.0);
        assert_eq!(vp.end(), 90.0);
    }
}
