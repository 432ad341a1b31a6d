//! Parallel-beam acquisition geometry: which angles, how many detectors, and
//! how large the reconstructed image is.

use units::{Angle, deg, deg_, rad_};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Acquisition {
    size: usize,
    detectors: usize,
    angles: Vec<Angle>,
}

impl Acquisition {

    pub fn new(size: usize, detectors: usize, angles: Vec<Angle>) -> Result<Self> {
        if size == 0      { return Err(Error::invalid("image size must be positive")) }
        if detectors == 0 { return Err(Error::invalid("detector count must be positive")) }
        if angles.is_empty() { return Err(Error::invalid("at least one projection angle is required")) }
        if angles.iter().any(|a| !rad_(*a).is_finite()) {
            return Err(Error::invalid("projection angles must be finite"))
        }
        Ok(Self { size, detectors, angles })
    }

    /// The geometry conventionally paired with an `n × n` phantom:
    /// `floor(π n / 2)` angles evenly covering 0° to 179.9°, and enough
    /// detectors (`floor(√2 n)`) to see the whole diagonal of the image.
    pub fn for_image_size(n: usize) -> Result<Self> {
        let n_angles = (0.5 * std::f64::consts::PI * n as f64) as usize;
        let detectors = (std::f64::consts::SQRT_2 * n as f64) as usize;
        Self::new(n, detectors, evenly_spaced(deg(0.0), deg(179.9), n_angles))
    }

    /// Same as `for_image_size` but with explicit angular range and count
    pub fn evenly_spaced(n: usize, start: Angle, stop: Angle, count: Option<usize>) -> Result<Self> {
        let default = Self::for_image_size(n)?;
        let count = count.unwrap_or(default.angles.len());
        Self::new(n, default.detectors, evenly_spaced(start, stop, count))
    }

    pub fn with_detectors(self, detectors: usize) -> Result<Self> {
        Self::new(self.size, detectors, self.angles)
    }

    pub fn size     (&self) -> usize { self.size }
    pub fn detectors(&self) -> usize { self.detectors }
    pub fn n_angles (&self) -> usize { self.angles.len() }
    pub fn angles   (&self) -> &[Angle] { &self.angles }

    pub fn angles_deg(&self) -> Vec<f32> { self.angles.iter().copied().map(deg_).collect() }
    pub fn angles_rad(&self) -> Vec<f32> { self.angles.iter().copied().map(rad_).collect() }

    /// Shape of the sinograms belonging to this geometry
    pub fn sinogram_dim(&self) -> (usize, usize) { (self.n_angles(), self.detectors) }

    /// Signed offset (in pixel widths) of the centre of detector 0 from the
    /// rotation axis
    pub fn first_detector_offset(&self) -> f32 { -(self.detectors as f32 - 1.0) / 2.0 }

    /// `(sin θ, cos θ)` for every angle
    pub fn sin_cos(&self) -> Vec<(f32, f32)> {
        self.angles.iter().map(|a| rad_(*a).sin_cos()).collect()
    }
}

/// `count` angles from `start` to `stop` inclusive, like numpy's `linspace`
pub fn evenly_spaced(start: Angle, stop: Angle, count: usize) -> Vec<Angle> {
    match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f32;
            (0..count).map(|i| start + step * i as f32).collect()
        }
    }
}
