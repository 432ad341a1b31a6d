use std::ops::Mul;
use units::{Angle, rad_, todo::Lengthf32};

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vector {
    pub x: Lengthf32,
    pub y: Lengthf32,
}

pub trait Dot<Rhs = Self> {
    type Output;
    fn dot(self, other: Rhs) -> Self::Output;
}

impl Dot for Vector {
    type Output = Lengthf32;
    fn dot(self, other: Self) -> Lengthf32 { self.x * other.x + self.y * other.y }
}

impl Vector {

    pub fn new(x: Lengthf32, y: Lengthf32) -> Self { Self { x, y } }

    /// Unit vector pointing at `angle`, anticlockwise from the x-axis
    pub fn unit(angle: Angle) -> Self {
        let (s, c) = rad_(angle).sin_cos();
        Self::new(c, s)
    }

    pub fn norm(self) -> Lengthf32 { self.x.hypot(self.y) }

    /// 2D cross product (z-component of the 3D one)
    pub fn cross(self, other: Self) -> Lengthf32 { self.x * other.y - self.y * other.x }

    /// Rotate anticlockwise by `angle`
    pub fn rotated(self, angle: Angle) -> Self {
        let (s, c) = rad_(angle).sin_cos();
        Self::new(c * self.x - s * self.y,
                  s * self.x + c * self.y)
    }

    /// Scale components independently
    pub fn component_div(self, sx: Lengthf32, sy: Lengthf32) -> Self {
        Self::new(self.x / sx, self.y / sy)
    }
}

impl Mul<f32> for Vector {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self::Output { Self::new(self.x * rhs, self.y * rhs) }
}
