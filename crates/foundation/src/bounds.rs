/// Screen-space primitives (CSS pixels, origin at the viewport's top-left).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Size2 {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned client rectangle, as reported by `getBoundingClientRect`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect2 {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Point2 {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Size2 {
    pub fn new(width: f64, height: f64) -> Self {
        Size2 { width, height }
    }
}

impl Rect2 {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect2 {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn origin(&self) -> Point2 {
        Point2::new(self.left, self.top)
    }

    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}
