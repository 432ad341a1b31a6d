//! Points and vectors in the normalised 2D plane in which phantoms are
//! defined.

mod point;
mod vector;

pub use point::Point;
pub use vector::{Vector, Dot};
