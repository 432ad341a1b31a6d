//! Direct Fourier reconstruction.
//!
//! The 1D transform of a projection at angle θ is a radial slice through the
//! 2D transform of the image (projection-slice theorem). All slices are
//! gathered onto a Cartesian frequency grid by polar interpolation, and a 2D
//! inverse FFT returns to image space.
//!
//! Projections and image are both zero padded to `Q = next_pow2(2 max(P, N))`
//! samples, which oversamples every slice radially by at least a factor of
//! two and keeps the periodic image copies from overlapping.

use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::{Acquisition, Error, Image, Result, Sinogram};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
}

impl std::str::FromStr for Interpolation {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear"  => Ok(Self::Linear),
            _ => Err(Error::invalid(format!("unknown interpolation `{s}` (expected nearest or linear)"))),
        }
    }
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self { Self::Nearest => "nearest", Self::Linear => "linear" })
    }
}

type C32 = Complex<f32>;

pub fn fourier(sinogram: &Sinogram, acquisition: &Acquisition, interpolation: Interpolation) -> Result<Image> {
    sinogram.check_dim(acquisition.sinogram_dim())?;
    let n = acquisition.size();
    let p = acquisition.detectors();
    let q = (2 * n.max(p)).next_power_of_two();
    tracing::debug!(%interpolation, padded = q, "direct Fourier reconstruction");

    let mut planner = FftPlanner::new();
    let slices = Slices::new(sinogram, acquisition, planner.plan_fft_forward(q));

    // Gather the Cartesian spectrum, row index ky, column index kx
    let mut grid = vec![C32::new(0.0, 0.0); q * q];
    grid.par_chunks_mut(q).enumerate().for_each(|(row, values)| {
        let ky = signed_frequency(row, q);
        for (col, value) in values.iter_mut().enumerate() {
            let kx = signed_frequency(col, q);
            *value = slices.sample(kx, ky, interpolation);
        }
    });

    let inverse: Arc<dyn Fft<f32>> = planner.plan_fft_inverse(q);
    grid.par_chunks_mut(q).for_each(|row| inverse.process(row));
    let mut grid = transpose(&grid, q);
    grid.par_chunks_mut(q).for_each(|col| inverse.process(col));
    // `grid` is now indexed [x][y]

    let scale = 1.0 / (q * q) as f32;
    let centre = n / 2;
    let wrap = |j: usize| (j + q - centre) % q;
    let mut image = Image::zeros(n);
    for ((row, col), pixel) in image.data.indexed_iter_mut() {
        *pixel = grid[wrap(col) * q + wrap(row)].re * scale;
    }
    Ok(image)
}

/// Phase-corrected 1D spectra of all projections, sorted by angle in `[0, π)`
struct Slices {
    thetas: Vec<f32>,
    spectra: Vec<Vec<C32>>,
    q: usize,
}

impl Slices {

    fn new(sinogram: &Sinogram, acquisition: &Acquisition, fft: Arc<dyn Fft<f32>>) -> Self {
        use std::f32::consts::PI;
        let q = fft.len();
        let (n, p) = (acquisition.size(), acquisition.detectors());
        // Sub-pixel offsets between sample positions and FFT grid indices
        let e_n = half_offset(n);
        let e_p = half_offset(p);
        let centre = p / 2;

        let mut slices: Vec<(f32, Vec<C32>)> = acquisition.angles_rad().into_par_iter()
            .zip(sinogram.data.outer_iter().into_par_iter())
            .map(|(theta, projection)| {
                let mut theta = theta.rem_euclid(2.0 * PI);
                let flip = theta >= PI;
                if flip { theta -= PI; }
                let mut buffer = vec![C32::new(0.0, 0.0); q];
                for (d, &v) in projection.iter().enumerate() {
                    // p(-t) sits at the mirrored detector
                    let d = if flip { p - 1 - d } else { d };
                    buffer[(d + q - centre) % q].re += v;
                }
                fft.process(&mut buffer);
                let (sin, cos) = theta.sin_cos();
                let delta = e_n * (cos + sin) - e_p;
                for (k, b) in buffer.iter_mut().enumerate() {
                    let k = signed_frequency(k, q);
                    *b *= C32::from_polar(1.0, -2.0 * PI * k * delta / q as f32);
                }
                (theta, buffer)
            })
            .collect();

        slices.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (thetas, spectra) = slices.into_iter().unzip();
        Self { thetas, spectra, q }
    }

    /// Spectrum value at Cartesian frequency `(kx, ky)`
    fn sample(&self, kx: f32, ky: f32, interpolation: Interpolation) -> C32 {
        use std::f32::consts::PI;
        let mut rho = kx.hypot(ky);
        let mut phi = ky.atan2(kx);
        if phi < 0.0 { phi += PI; rho = -rho; }

        let (low, high, w) = self.bracket(phi);
        match interpolation {
            Interpolation::Nearest => {
                let slice = if w < 0.5 { low } else { high };
                self.radial(slice, rho, Interpolation::Nearest)
            }
            Interpolation::Linear => {
                self.radial(low , rho, Interpolation::Linear) * (1.0 - w) +
                self.radial(high, rho, Interpolation::Linear) * w
            }
        }
    }

    /// The slices on either side of `phi`, and the weight of the upper one.
    /// Slices past either end wrap round through π with reversed frequency.
    fn bracket(&self, phi: f32) -> ((usize, bool), (usize, bool), f32) {
        use std::f32::consts::PI;
        let t = &self.thetas;
        let last = t.len() - 1;
        let i = t.partition_point(|&theta| theta <= phi);
        let (low, theta_low, high, theta_high) = if i == 0 {
            ((last, true), t[last] - PI, (0, false), t[0])
        } else if i == t.len() {
            ((last, false), t[last], (0, true), t[0] + PI)
        } else {
            ((i - 1, false), t[i - 1], (i, false), t[i])
        };
        let span = theta_high - theta_low;
        let w = if span > 0.0 { ((phi - theta_low) / span).clamp(0.0, 1.0) } else { 0.0 };
        (low, high, w)
    }

    /// Value of one slice at signed radial frequency `rho`
    fn radial(&self, (index, reversed): (usize, bool), rho: f32, interpolation: Interpolation) -> C32 {
        let rho = if reversed { -rho } else { rho };
        let spectrum = &self.spectra[index];
        let half = (self.q / 2) as f32;
        let at = |k: f32| {
            if k.abs() > half { return C32::new(0.0, 0.0) }
            spectrum[(k as isize).rem_euclid(self.q as isize) as usize]
        };
        match interpolation {
            Interpolation::Nearest => at(rho.round()),
            Interpolation::Linear  => {
                let k0 = rho.floor();
                let w = rho - k0;
                at(k0) * (1.0 - w) + at(k0 + 1.0) * w
            }
        }
    }
}

/// `(X - 1)/2 - floor(X/2)`: how far the physical centre of `X` samples lies
/// from the sample that lands on FFT index 0
fn half_offset(x: usize) -> f32 { (x as f32 - 1.0) / 2.0 - (x / 2) as f32 }

/// FFT index `k` of a length-`q` transform as a signed frequency
fn signed_frequency(k: usize, q: usize) -> f32 {
    if k < q / 2 { k as f32 } else { k as f32 - q as f32 }
}

fn transpose(grid: &[C32], q: usize) -> Vec<C32> {
    let mut out = vec![C32::new(0.0, 0.0); q * q];
    out.par_chunks_mut(q).enumerate().for_each(|(col, values)| {
        for (row, v) in values.iter_mut().enumerate() {
            *v = grid[row * q + col];
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use crate::phantom::Library;

    #[rstest(/**/ x, expected,
             case(4,  -0.5),
             case(5,   0.0),
             case(724, -0.5),
    )]
    fn offsets(x: usize, expected: f32) {
        assert_float_eq!(half_offset(x), expected, abs <= 1e-6);
    }

    #[test]
    fn frequencies_are_signed() {
        let got: Vec<_> = (0..6).map(|k| signed_frequency(k, 6)).collect();
        assert_eq!(got, vec![0.0, 1.0, 2.0, -3.0, -2.0, -1.0]);
    }

    #[rstest(interpolation, case(Interpolation::Nearest), case(Interpolation::Linear))]
    fn reconstructs_a_disc(interpolation: Interpolation) {
        let n = 48;
        let acquisition = Acquisition::for_image_size(n).unwrap();
        let model = Library::builtin().model(2).unwrap();
        let phantom = model.image(n);
        let sinogram = model.sinogram(&acquisition);
        let image = fourier(&sinogram, &acquisition, interpolation).unwrap();

        let error = (&image.data - &phantom.data).mapv(|v| v * v).sum().sqrt() / phantom.norm();
        assert!(error < 0.35, "relative error {error}");
        // Centre well inside the disc, corner well outside
        assert_float_eq!(image[[n / 2, n / 2]], 1.0, abs <= 0.2);
        assert_float_eq!(image[[2, 2]], 0.0, abs <= 0.2);
    }

    #[test]
    fn angles_beyond_half_turn_are_mirrored() {
        use units::deg;
        let n = 32;
        let model = Library::builtin().model(4).unwrap();
        let half = Acquisition::evenly_spaced(n, deg(0.0), deg(178.0), Some(90)).unwrap();
        let full = Acquisition::evenly_spaced(n, deg(180.0), deg(358.0), Some(90)).unwrap();
        let a = fourier(&model.sinogram(&half), &half, Interpolation::Linear).unwrap();
        let b = fourier(&model.sinogram(&full), &full, Interpolation::Linear).unwrap();
        let difference = (&a.data - &b.data).mapv(f32::abs).fold(0.0_f32, |m, &v| m.max(v));
        assert!(difference < 1e-2, "max difference {difference}");
    }

    #[test]
    fn wrong_sinogram_shape_is_rejected() {
        let acquisition = Acquisition::for_image_size(16).unwrap();
        assert!(fourier(&Sinogram::zeros(3, 3), &acquisition, Interpolation::Linear).is_err());
    }
}
