//! Filtered back projection.
//!
//! Each projection is convolved with the band-limited ramp (Ram-Lak) kernel,
//! optionally apodized by a frequency window, and the filtered sinogram is
//! back projected. The convolution is done with FFTs on projections
//! zero-padded to at least twice their length, so no wrap-around reaches the
//! detectors.

use std::sync::Arc;

use ndarray::Axis;
use ndarray::parallel::prelude::*;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::projector::Projector;
use crate::{Error, Image, Result, Sinogram};

/// Frequency window applied on top of the ramp
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    RamLak,
    SheppLogan,
    Cosine,
    Hamming,
    Hann,
}

impl Filter {

    pub const ALL: [Filter; 5] = [Filter::RamLak, Filter::SheppLogan, Filter::Cosine, Filter::Hamming, Filter::Hann];

    pub fn name(self) -> &'static str {
        use Filter::*;
        match self {
            RamLak     => "ram-lak",
            SheppLogan => "shepp-logan",
            Cosine     => "cosine",
            Hamming    => "hamming",
            Hann       => "hann",
        }
    }

    /// Window value at `f` cycles per detector, `0 ≤ f ≤ ½`
    pub fn window(self, f: f32) -> f32 {
        use std::f32::consts::PI;
        use Filter::*;
        match self {
            RamLak     => 1.0,
            SheppLogan => if f == 0.0 { 1.0 } else { (PI * f).sin() / (PI * f) },
            Cosine     => (PI * f).cos(),
            Hamming    => 0.54 + 0.46 * (2.0 * PI * f).cos(),
            Hann       => 0.5  + 0.5  * (2.0 * PI * f).cos(),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        Filter::ALL.into_iter()
            .find(|f| f.name() == wanted || f.name().replace('-', "") == wanted)
            .ok_or_else(|| Error::invalid(format!("unknown filter `{s}`")))
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

/// Ramp filter for projections of a fixed length, with its FFT plans
pub struct RampFilter {
    detectors: usize,
    response: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl RampFilter {

    pub fn new(detectors: usize, filter: Filter) -> Self {
        let padded = padded_length(detectors);
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(padded);
        let inverse = planner.plan_fft_inverse(padded);

        let mut kernel = ram_lak_kernel(padded);
        forward.process(&mut kernel);
        let response = kernel.iter().enumerate()
            .map(|(k, h)| h.re * filter.window(frequency(k, padded)))
            .collect();
        Self { detectors, response, forward, inverse }
    }

    pub fn padded_length(&self) -> usize { self.response.len() }

    /// Frequency response, in standard FFT order
    pub fn response(&self) -> &[f32] { &self.response }

    /// Filter every projection of `sinogram`
    pub fn apply(&self, sinogram: &Sinogram) -> Result<Sinogram> {
        if sinogram.detectors() != self.detectors {
            return Err(Error::Shape { expected: (sinogram.angles(), self.detectors), found: sinogram.dim() })
        }
        let padded = self.padded_length();
        let scale = 1.0 / padded as f32;
        let mut filtered = sinogram.clone();
        filtered.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut row| {
                let mut buffer = vec![Complex::new(0.0, 0.0); padded];
                for (b, &v) in buffer.iter_mut().zip(row.iter()) { b.re = v; }
                self.forward.process(&mut buffer);
                for (b, &h) in buffer.iter_mut().zip(self.response.iter()) { *b *= h; }
                self.inverse.process(&mut buffer);
                for (v, b) in row.iter_mut().zip(buffer.iter()) { *v = b.re * scale; }
            });
        Ok(filtered)
    }
}

/// Reconstruct by filtering `sinogram` and back projecting with `projector`.
///
/// Angles are assumed to cover half a turn evenly.
pub fn fbp<P: Projector>(projector: &P, sinogram: &Sinogram, filter: Filter) -> Result<Image> {
    let acquisition = projector.acquisition();
    sinogram.check_dim(acquisition.sinogram_dim())?;
    tracing::debug!(%filter, angles = acquisition.n_angles(), "filtered back projection");
    let filtered = RampFilter::new(acquisition.detectors(), filter).apply(sinogram)?;
    let mut image = projector.back(&filtered);
    image.data *= std::f32::consts::PI / acquisition.n_angles() as f32;
    Ok(image)
}

/// Smallest power of two holding twice `n` samples
fn padded_length(n: usize) -> usize { (2 * n).max(64).next_power_of_two() }

/// Magnitude of the frequency at index `k` of a length-`n` FFT, in cycles per sample
fn frequency(k: usize, n: usize) -> f32 { k.min(n - k) as f32 / n as f32 }

/// Spatial Ram-Lak kernel for unit detector spacing, wrapped for circular
/// convolution of length `n`
fn ram_lak_kernel(n: usize) -> Vec<Complex<f32>> {
    use std::f32::consts::PI;
    let mut kernel = vec![Complex::new(0.0, 0.0); n];
    kernel[0].re = 0.25;
    for k in (1..=n / 2).step_by(2) {
        let h = -1.0 / (PI * PI * (k * k) as f32);
        kernel[k].re = h;
        kernel[n - k].re = h;
    }
    kernel
}
