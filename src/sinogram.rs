//! Sinograms: one row of detector readings per acquisition angle.

use ndarray::Array2;

use units::todo::Pixelsf32;
use crate::{Error, Result};

pub type SinogramData = Array2<Pixelsf32>;

/// `angles × detectors` line integrals, measured in pixel widths.
#[derive(Clone, Debug, PartialEq)]
pub struct Sinogram {
    pub data: SinogramData,
}

impl core::ops::Index<[usize; 2]> for Sinogram {
    type Output = Pixelsf32;
    #[inline]
    fn index(&self, [angle, detector]: [usize; 2]) -> &Self::Output { &self.data[[angle, detector]] }
}

impl core::ops::IndexMut<[usize; 2]> for Sinogram {
    #[inline]
    fn index_mut(&mut self, [angle, detector]: [usize; 2]) -> &mut Self::Output { &mut self.data[[angle, detector]] }
}

impl Sinogram {

    pub fn new(data: SinogramData) -> Self { Self { data } }

    pub fn zeros(angles: usize, detectors: usize) -> Self {
        Self { data: Array2::zeros((angles, detectors)) }
    }

    pub fn angles   (&self) -> usize { self.data.nrows() }
    pub fn detectors(&self) -> usize { self.data.ncols() }
    pub fn dim      (&self) -> (usize, usize) { self.data.dim() }

    /// Largest reading; 0 for an empty sinogram
    pub fn max(&self) -> Pixelsf32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    pub fn norm(&self) -> f32 { self.data.iter().map(|v| v * v).sum::<f32>().sqrt() }

    /// Set negative readings to zero, returning how many were changed.
    ///
    /// Applying this twice is the same as applying it once.
    pub fn clamp_negative(&mut self) -> usize {
        let mut clamped = 0;
        self.data.mapv_inplace(|v| if v < 0.0 { clamped += 1; 0.0 } else { v });
        clamped
    }

    pub fn check_dim(&self, expected: (usize, usize)) -> Result<()> {
        let found = self.dim();
        if found != expected {
            return Err(Error::Shape { expected, found })
        }
        Ok(())
    }
}
