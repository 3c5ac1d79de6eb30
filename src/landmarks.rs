//! Landmark data model: one rectangle plus 68 optional point slots.

use std::fmt;

/// Number of facial landmark slots.
pub const LANDMARK_COUNT: usize = 68;

// ── Geometry ────────────────────────────────────────────────────────────────

/// Integer pixel coordinate in image space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncates a continuous image-space position to a pixel coordinate.
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Face bounding box given by the two corners the user dragged between.
///
/// Corners are stored as clicked, so `a` is not necessarily the top-left one
/// and the rectangle may have zero area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub a: Point,
    pub b: Point,
}

impl Rect {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn min(&self) -> Point {
        Point::new(self.a.x.min(self.b.x), self.a.y.min(self.b.y))
    }

    pub fn max(&self) -> Point {
        Point::new(self.a.x.max(self.b.x), self.a.y.max(self.b.y))
    }

    pub fn is_degenerate(&self) -> bool {
        self.a.x == self.b.x || self.a.y == self.b.y
    }
}

// ── Indices ─────────────────────────────────────────────────────────────────

/// 1-based landmark index in `1..=68`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LandmarkIndex(u8);

impl LandmarkIndex {
    pub const FIRST: LandmarkIndex = LandmarkIndex(1);
    pub const LAST: LandmarkIndex = LandmarkIndex(LANDMARK_COUNT as u8);

    pub fn new(k: usize) -> Option<Self> {
        if (1..=LANDMARK_COUNT).contains(&k) {
            Some(Self(k as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// The following index, wrapping 68 back to 1.
    pub fn next(self) -> Self {
        if self == Self::LAST {
            Self::FIRST
        } else {
            Self(self.0 + 1)
        }
    }

    pub fn all() -> impl Iterator<Item = LandmarkIndex> {
        (1..=LANDMARK_COUNT as u8).map(LandmarkIndex)
    }

    fn slot(self) -> usize {
        self.get() - 1
    }
}

impl fmt::Display for LandmarkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One annotatable slot: the rectangle (slot 0) or a landmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Rect,
    Landmark(LandmarkIndex),
}

impl Slot {
    /// The rectangle first, then landmarks 1..=68.
    pub fn all() -> impl Iterator<Item = Slot> {
        std::iter::once(Slot::Rect).chain(LandmarkIndex::all().map(Slot::Landmark))
    }
}

// ── Landmark Set ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkSet {
    rect: Rect,
    points: [Option<Point>; LANDMARK_COUNT],
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self {
            rect: Rect::default(),
            points: [None; LANDMARK_COUNT],
        }
    }
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    pub fn reset_rect(&mut self) {
        self.rect = Rect::default();
    }

    pub fn point(&self, k: LandmarkIndex) -> Option<Point> {
        self.points[k.slot()]
    }

    pub fn set_point(&mut self, k: LandmarkIndex, p: Point) {
        self.points[k.slot()] = Some(p);
    }

    pub fn clear_point(&mut self, k: LandmarkIndex) {
        self.points[k.slot()] = None;
    }

    pub fn is_set(&self, k: LandmarkIndex) -> bool {
        self.point(k).is_some()
    }

    /// All landmark slots in index order.
    pub fn points(&self) -> impl Iterator<Item = (LandmarkIndex, Option<Point>)> + '_ {
        LandmarkIndex::all().map(move |k| (k, self.point(k)))
    }

    pub fn set_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_bounds() {
        assert!(LandmarkIndex::new(0).is_none());
        assert!(LandmarkIndex::new(69).is_none());
        assert_eq!(LandmarkIndex::new(1), Some(LandmarkIndex::FIRST));
        assert_eq!(LandmarkIndex::new(68), Some(LandmarkIndex::LAST));
    }

    #[test]
    fn index_wraps_after_last() {
        assert_eq!(LandmarkIndex::LAST.next(), LandmarkIndex::FIRST);
        assert_eq!(LandmarkIndex::FIRST.next().get(), 2);
    }

    #[test]
    fn slot_zero_is_rectangle() {
        let slots: Vec<Slot> = Slot::all().collect();
        assert_eq!(slots.len(), 69);
        assert_eq!(slots[0], Slot::Rect);
        assert_eq!(slots[5], Slot::Landmark(LandmarkIndex::new(5).unwrap()));
        assert_eq!(slots[68], Slot::Landmark(LandmarkIndex::LAST));
    }

    #[test]
    fn rect_defaults_to_degenerate_origin() {
        let set = LandmarkSet::new();
        assert_eq!(set.rect(), Rect::new(Point::ORIGIN, Point::ORIGIN));
        assert!(set.rect().is_degenerate());
    }

    #[test]
    fn rect_min_max_normalize_corners() {
        let r = Rect::new(Point::new(50, 10), Point::new(10, 60));
        assert_eq!(r.min(), Point::new(10, 10));
        assert_eq!(r.max(), Point::new(50, 60));
        assert!(!r.is_degenerate());
    }

    #[test]
    fn set_and_clear_point() {
        let mut set = LandmarkSet::new();
        let k = LandmarkIndex::new(17).unwrap();
        set.set_point(k, Point::new(3, 4));
        assert_eq!(set.point(k), Some(Point::new(3, 4)));
        assert_eq!(set.set_count(), 1);
        set.clear_point(k);
        assert!(!set.is_set(k));
        assert_eq!(set.set_count(), 0);
    }

    #[test]
    fn truncates_float_positions() {
        assert_eq!(Point::from_f32(20.9, 7.2), Point::new(20, 7));
    }

    #[test]
    fn point_display_is_tuple() {
        assert_eq!(Point::new(-1, -1).to_string(), "(-1,-1)");
    }
}
