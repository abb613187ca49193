//! Logical-space rectangles: point hit-tests and sprite overlap.

/// Axis-aligned rectangle in logical screen units. y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl HitRect {
    /// Rectangle of `width` x `height` centred on (cx, cy).
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self {
            left: cx - hw,
            top: cy - hh,
            right: cx + hw,
            bottom: cy + hh,
        }
    }

    /// Inclusive on all four edges: a click exactly on the border counts.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }

    /// True when the two rectangles share interior area. Touching edges do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_bounds() {
        let r = HitRect::centered(100.0, 50.0, 40.0, 20.0);
        assert_eq!(r.left, 80.0);
        assert_eq!(r.right, 120.0);
        assert_eq!(r.top, 40.0);
        assert_eq!(r.bottom, 60.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = HitRect::centered(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(-5.0, -5.0));
        assert!(r.contains(5.0, 5.0));
        assert!(r.contains(5.0, -5.0));
        assert!(r.contains(0.0, 0.0));
        assert!(!r.contains(5.01, 0.0));
        assert!(!r.contains(0.0, -5.01));
    }

    #[test]
    fn test_overlap_needs_shared_area() {
        let a = HitRect::centered(0.0, 0.0, 10.0, 10.0);
        let touching = HitRect::centered(10.0, 0.0, 10.0, 10.0);
        let crossing = HitRect::centered(9.0, 9.0, 10.0, 10.0);
        let apart = HitRect::centered(30.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&crossing));
        assert!(crossing.overlaps(&a));
        assert!(!a.overlaps(&apart));
    }
}
