//! Pixel-driven projection.
//!
//! The centre of every pixel is projected onto the detector axis at each
//! angle, landing at `s = x cos θ + y sin θ` (in pixel widths). The pixel's
//! value is shared between the two detectors either side of `s`, in
//! proportion to proximity. Each pixel therefore contributes its full area
//! to every projection, which makes the result approximate line integrals in
//! pixel units.
//!
//! Back projection gathers with exactly the same weights, so the pair is
//! adjoint by construction.

use ndarray::Axis;
use ndarray::parallel::prelude::*;

use crate::{Acquisition, Image, Sinogram};
use super::Projector;

#[derive(Clone, Debug)]
pub struct PixelDriven {
    acquisition: Acquisition,
    sin_cos: Vec<(f32, f32)>,
    /// Offsets of pixel centres from the rotation axis, in pixel widths
    centres: Vec<f32>,
}

impl PixelDriven {

    pub fn new(acquisition: Acquisition) -> Self {
        let n = acquisition.size();
        let half = (n as f32 - 1.0) / 2.0;
        let centres = (0..n).map(|k| k as f32 - half).collect();
        let sin_cos = acquisition.sin_cos();
        Self { acquisition, sin_cos, centres }
    }

    /// Lower detector index and the weight of the upper neighbour for a pixel
    /// centred at `(x, y)` seen at an angle with the given `(sin, cos)`
    #[inline]
    fn detector_position(&self, x: f32, y: f32, (sin, cos): (f32, f32)) -> (isize, f32) {
        let t = x * cos + y * sin - self.acquisition.first_detector_offset();
        let lower = t.floor();
        (lower as isize, t - lower)
    }
}

impl Projector for PixelDriven {

    fn acquisition(&self) -> &Acquisition { &self.acquisition }

    fn forward(&self, image: &Image) -> Sinogram {
        let detectors = self.acquisition.detectors() as isize;
        let mut sinogram = Sinogram::zeros(self.acquisition.n_angles(), self.acquisition.detectors());
        sinogram.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(self.sin_cos.par_iter())
            .for_each(|(mut row, &sc)| {
                for (i, &y) in self.centres.iter().enumerate() {
                    for (j, &x) in self.centres.iter().enumerate() {
                        let value = image.data[[i, j]];
                        if value == 0.0 { continue }
                        let (lower, upper_weight) = self.detector_position(x, y, sc);
                        if lower >= 0 && lower < detectors {
                            row[lower as usize] += value * (1.0 - upper_weight);
                        }
                        let upper = lower + 1;
                        if upper >= 0 && upper < detectors {
                            row[upper as usize] += value * upper_weight;
                        }
                    }
                }
            });
        sinogram
    }

    fn back(&self, sinogram: &Sinogram) -> Image {
        let detectors = self.acquisition.detectors() as isize;
        let mut image = Image::zeros(self.acquisition.size());
        image.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(self.centres.par_iter())
            .for_each(|(mut row, &y)| {
                for (pixel, &x) in row.iter_mut().zip(self.centres.iter()) {
                    let mut sum = 0.0;
                    for (a, &sc) in self.sin_cos.iter().enumerate() {
                        let (lower, upper_weight) = self.detector_position(x, y, sc);
                        if lower >= 0 && lower < detectors {
                            sum += sinogram.data[[a, lower as usize]] * (1.0 - upper_weight);
                        }
                        let upper = lower + 1;
                        if upper >= 0 && upper < detectors {
                            sum += sinogram.data[[a, upper as usize]] * upper_weight;
                        }
                    }
                    *pixel = sum;
                }
            });
        image
    }
}
