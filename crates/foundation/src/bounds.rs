use crate::math::Vec2;

/// Axis-aligned rectangle in pixel space.
///
/// `min` is the top-left corner and `max` the bottom-right corner; pixel `y`
/// grows downward.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Build from `[xmin, ymin, xmax, ymax]`.
    pub fn from_extent(extent: [f64; 4]) -> Self {
        Aabb2::new([extent[0], extent[1]], [extent[2], extent[3]])
    }

    pub fn extent(&self) -> [f64; 4] {
        [self.min[0], self.min[1], self.max[0], self.max[1]]
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// True when all coordinates are finite and the rectangle has positive area.
    pub fn is_valid(&self) -> bool {
        self.extent().iter().all(|v| v.is_finite())
            && self.min[0] < self.max[0]
            && self.min[1] < self.max[1]
    }

    /// Inclusive containment test with an absolute tolerance.
    pub fn contains(&self, p: Vec2, eps: f64) -> bool {
        p.x >= self.min[0] - eps
            && p.x <= self.max[0] + eps
            && p.y >= self.min[1] - eps
            && p.y <= self.max[1] + eps
    }

    /// Corners in clockwise screen order starting at the top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.min[0], self.min[1]),
            Vec2::new(self.max[0], self.min[1]),
            Vec2::new(self.max[0], self.max[1]),
            Vec2::new(self.min[0], self.max[1]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn extent_round_trips() {
        let r = Aabb2::from_extent([1.0, 2.0, 11.0, 7.0]);
        assert_eq!(r.extent(), [1.0, 2.0, 11.0, 7.0]);
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 5.0);
    }

    #[test]
    fn rejects_inverted_and_non_finite() {
        assert!(Aabb2::from_extent([0.0, 0.0, 1.0, 1.0]).is_valid());
        assert!(!Aabb2::from_extent([0.0, 1.0, 1.0, 0.0]).is_valid());
        assert!(!Aabb2::from_extent([0.0, 0.0, f64::NAN, 1.0]).is_valid());
    }

    #[test]
    fn contains_is_inclusive() {
        let r = Aabb2::from_extent([0.0, 0.0, 10.0, 10.0]);
        assert!(r.contains(Vec2::new(10.0, 0.0), 0.0));
        assert!(!r.contains(Vec2::new(10.5, 0.0), 0.0));
        assert!(r.contains(Vec2::new(10.5, 0.0), 1.0));
    }
}
