use glam::DVec2;

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub loc: DVec2,
    pub size: DVec2,
}

impl Rect {
    pub fn new(loc: DVec2, size: DVec2) -> Self {
        Self { loc, size }
    }

    pub fn from_size(size: DVec2) -> Self {
        Self {
            loc: DVec2::ZERO,
            size,
        }
    }

    pub fn left(&self) -> f64 {
        self.loc.x
    }

    pub fn right(&self) -> f64 {
        self.loc.x + self.size.x
    }

    pub fn top(&self) -> f64 {
        self.loc.y
    }

    pub fn bottom(&self) -> f64 {
        self.loc.y + self.size.y
    }

    pub fn center(&self) -> DVec2 {
        self.loc + self.size / 2.
    }

    pub fn contains(&self, point: DVec2) -> bool {
        self.left() <= point.x
            && point.x < self.right()
            && self.top() <= point.y
            && point.y < self.bottom()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn translated(self, offset: DVec2) -> Self {
        Self {
            loc: self.loc + offset,
            size: self.size,
        }
    }
}
