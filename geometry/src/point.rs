use std::ops::{Add, Sub};
use units::todo::Lengthf32;
use crate::Vector;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: Lengthf32,
    pub y: Lengthf32,
}

impl Point {
    pub fn new(x: Lengthf32, y: Lengthf32) -> Self { Self { x, y } }
    pub fn origin() -> Self { Self::default() }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;
    fn add(self, rhs: Vector) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}
