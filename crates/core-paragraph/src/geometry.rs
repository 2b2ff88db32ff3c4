//! Plain geometry shared by the paragraph service and the editing core.
//!
//! Coordinates are logical pixels (`f32`). Rectangles are axis aligned with
//! the origin at the top-left corner; width and height are never negative.

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: Offset) -> f32 {
        let d = *self - other;
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

impl Add for Offset {
    type Output = Offset;
    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Offset {
    type Output = Offset;
    fn sub(self, rhs: Offset) -> Offset {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Offset {
        Offset::new(self.x, self.y)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, point: Offset) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn translate(&self, delta: Offset) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_and_contains() {
        let r = Rect::new(10.0, 5.0, 100.0, 20.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 25.0);
        assert!(r.contains(Offset::new(10.0, 5.0)));
        assert!(!r.contains(Offset::new(111.0, 5.0)));
        assert_eq!(r.translate(Offset::new(-10.0, 0.0)).x, 0.0);
    }

    #[test]
    fn offset_arithmetic() {
        let a = Offset::new(3.0, 4.0);
        assert_eq!(a.distance(Offset::zero()), 5.0);
        assert_eq!(a - Offset::new(1.0, 1.0), Offset::new(2.0, 3.0));
    }
}
