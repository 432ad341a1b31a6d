//! Square images: phantoms and reconstructions alike.

use ndarray::{Array2, Zip};

use units::todo::{Intensityf32, Lengthf32};
use crate::{Error, Result};

pub type ImageData = Array2<Intensityf32>;

/// A `size × size` grid of attenuation values. Row index is `y`, column index
/// is `x`; both run from -1 to 1 in normalised coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub data: ImageData,
}

impl core::ops::Index<[usize; 2]> for Image {
    type Output = Intensityf32;
    #[inline]
    fn index(&self, [row, col]: [usize; 2]) -> &Self::Output { &self.data[[row, col]] }
}

impl core::ops::IndexMut<[usize; 2]> for Image {
    #[inline]
    fn index_mut(&mut self, [row, col]: [usize; 2]) -> &mut Self::Output { &mut self.data[[row, col]] }
}

impl Image {

    pub fn new(data: ImageData) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows != cols {
            return Err(Error::Shape { expected: (rows, rows), found: (rows, cols) });
        }
        Ok(Self { data })
    }

    pub fn zeros(size: usize) -> Self { Self { data: Array2::zeros((size, size)) } }
    pub fn ones (size: usize) -> Self { Self { data: Array2::ones ((size, size)) } }

    pub fn size(&self) -> usize { self.data.nrows() }

    pub fn norm(&self) -> f32 { self.data.iter().map(|v| v * v).sum::<f32>().sqrt() }

    pub fn max(&self) -> Intensityf32 { self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max) }
    pub fn min(&self) -> Intensityf32 { self.data.iter().copied().fold(f32::INFINITY,     f32::min) }

    /// Pixel-wise multiplication, in place
    pub fn mul_assign(&mut self, other: &Self) {
        Zip::from(&mut self.data).and(&other.data).for_each(|a, &b| *a *= b);
    }

    /// `self += factor * other`
    pub fn scaled_add(&mut self, factor: f32, other: &Self) {
        self.data.scaled_add(factor, &other.data);
    }

    pub fn clamp_negative(&mut self) {
        self.data.mapv_inplace(|v| v.max(0.0));
    }

    /// Image whose values are the reciprocals of `self`, with zeros staying zero
    pub fn inverted(&self) -> Self {
        Self { data: self.data.mapv(|v| if v > 0.0 { 1.0 / v } else { 0.0 }) }
    }

    pub fn check_size(&self, size: usize) -> Result<()> {
        let found = self.data.dim();
        if found != (size, size) {
            return Err(Error::Shape { expected: (size, size), found })
        }
        Ok(())
    }
}

/// Centres of the `n` pixels spanning `[-1, 1]`, in normalised coordinates
pub fn pixel_centres(n: usize) -> impl Iterator<Item = Lengthf32> + Clone {
    let width = 2.0 / n as Lengthf32;
    (0..n).map(move |k| -1.0 + (k as Lengthf32 + 0.5) * width)
}
