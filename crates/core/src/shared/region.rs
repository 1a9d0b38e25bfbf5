use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("degenerate region ({x1}, {y1}, {x2}, {y2}): requires x1 < x2 and y1 < y2")]
    Degenerate { x1: i32, y1: i32, x2: i32, y2: i32 },
    #[error("region coordinate is not finite")]
    NotFinite,
}

/// An axis-aligned rectangle in frame pixel coordinates.
///
/// Corners are `(x1, y1)` inclusive and `(x2, y2)` exclusive. The
/// constructor enforces `x1 < x2` and `y1 < y2`, so every value of this
/// type has a positive area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CandidateRegion {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl CandidateRegion {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, RegionError> {
        if x1 >= x2 || y1 >= y2 {
            return Err(RegionError::Degenerate { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Builds a region from detector output, truncating toward zero.
    pub fn from_xyxy(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, RegionError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(RegionError::NotFinite);
        }
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Intersection with the `width` x `height` frame, or `None` if the
    /// region lies entirely outside it.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        Self::new(
            self.x1.clamp(0, w),
            self.y1.clamp(0, h),
            self.x2.clamp(0, w),
            self.y2.clamp(0, h),
        )
        .ok()
    }
}

impl fmt::Display for CandidateRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn region(x1: i32, y1: i32, x2: i32, y2: i32) -> CandidateRegion {
        CandidateRegion::new(x1, y1, x2, y2).unwrap()
    }

    #[rstest]
    #[case::zero_width(10, 0, 10, 5)]
    #[case::zero_height(0, 10, 5, 10)]
    #[case::inverted_x(10, 0, 5, 5)]
    #[case::inverted_y(0, 10, 5, 5)]
    fn test_new_rejects_degenerate(
        #[case] x1: i32,
        #[case] y1: i32,
        #[case] x2: i32,
        #[case] y2: i32,
    ) {
        assert_eq!(
            CandidateRegion::new(x1, y1, x2, y2),
            Err(RegionError::Degenerate { x1, y1, x2, y2 })
        );
    }

    #[test]
    fn test_accessors_and_size() {
        let r = region(10, 20, 110, 70);
        assert_eq!((r.x1(), r.y1(), r.x2(), r.y2()), (10, 20, 110, 70));
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 50);
        assert_eq!(r.area(), 5000);
    }

    #[test]
    fn test_from_xyxy_truncates() {
        let r = CandidateRegion::from_xyxy(10.9, 20.2, 50.7, 60.99).unwrap();
        assert_eq!(r, region(10, 20, 50, 60));
    }

    #[test]
    fn test_from_xyxy_rejects_nan() {
        assert_eq!(
            CandidateRegion::from_xyxy(f64::NAN, 0.0, 1.0, 1.0),
            Err(RegionError::NotFinite)
        );
    }

    #[test]
    fn test_from_xyxy_rejects_collapsed_after_truncation() {
        assert!(CandidateRegion::from_xyxy(10.1, 0.0, 10.9, 5.0).is_err());
    }

    #[test]
    fn test_clamp_inside_is_identity() {
        let r = region(10, 10, 50, 50);
        assert_eq!(r.clamp_to(100, 100), Some(r));
    }

    #[test]
    fn test_clamp_partial_overlap() {
        let r = region(-10, 80, 30, 150);
        assert_eq!(r.clamp_to(100, 100), Some(region(0, 80, 30, 100)));
    }

    #[test]
    fn test_clamp_outside_is_none() {
        assert_eq!(region(120, 0, 150, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(region(1, 2, 3, 4).to_string(), "(1, 2, 3, 4)");
    }
}
