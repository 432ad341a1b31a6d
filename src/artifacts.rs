//! Synthetic measurement artifacts: noise, zingers and stripes.
//!
//! Every operation takes a sinogram and returns a new one of the same shape,
//! so artifacts can be layered in any order. Randomness comes from the
//! generator held by [`Artifacts`]: seeded runs are reproducible, unseeded
//! ones draw from OS entropy and differ from call to call.

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Sinogram};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum Noise {
    /// Additive Gaussian noise, standard deviation `sigma · max(sinogram)`
    Gaussian { sigma: f32 },
    /// Photon-counting noise with incident flux `sigma` photons per reading
    Poisson { sigma: f32 },
}

/// Isolated bright readings
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Zingers {
    /// Percentage of readings considered as zinger candidates
    pub percentage: f32,
    /// Only candidates whose flat index is a multiple of this become zingers
    pub modulus: usize,
}

/// Whole detector columns with a miscalibrated gain
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Stripes {
    /// Percentage of detectors at which a stripe starts
    pub percentage: f32,
    /// Maximum stripe width in detectors
    pub max_thickness: usize,
}

pub struct Artifacts {
    rng: StdRng,
}

impl Artifacts {

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn noise(&mut self, sinogram: &Sinogram, noise: Noise) -> Result<Sinogram> {
        let max = sinogram.max();
        let mut noisy = sinogram.clone();
        match noise {
            Noise::Gaussian { sigma } => {
                check_non_negative("gaussian sigma", sigma)?;
                let sd = sigma * max;
                if sd == 0.0 { return Ok(noisy) }
                let normal = Normal::new(0.0, sd).map_err(|e| Error::invalid(e.to_string()))?;
                noisy.data.mapv_inplace(|v| v + normal.sample(&mut self.rng));
            }
            Noise::Poisson { sigma: flux } => {
                if !(flux > 0.0) { return Err(Error::invalid(format!("poisson flux must be positive, got {flux}"))) }
                if max == 0.0 { return Ok(noisy) }
                let flux = flux as f64;
                let max = max as f64;
                for v in noisy.data.iter_mut() {
                    let expected = flux * (-(*v as f64) / max).exp();
                    let counts = match Poisson::new(expected) {
                        Ok(poisson) => poisson.sample(&mut self.rng),
                        Err(_)      => 0.0,
                    }.max(1.0);
                    *v = (-(counts / flux).ln() * max) as f32;
                }
            }
        }
        Ok(noisy)
    }

    pub fn zingers(&mut self, sinogram: &Sinogram, Zingers { percentage, modulus }: Zingers) -> Result<Sinogram> {
        check_percentage("zinger percentage", percentage)?;
        if modulus == 0 { return Err(Error::invalid("zinger modulus must be positive")) }
        let mut zingered = sinogram.clone();
        let len = sinogram.data.len();
        if len == 0 { return Ok(zingered) }
        let detectors = sinogram.detectors();
        let max = sinogram.max();
        let candidates = (len as f64 * percentage as f64 / 100.0) as usize;
        for _ in 0..candidates {
            let index = self.rng.gen_range(0..len);
            if index % modulus != 0 { continue }
            let (angle, detector) = (index / detectors, index % detectors);
            zingered[[angle, detector]] = max;
            // Zingers are often two readings wide
            if detector + 1 < detectors {
                zingered[[angle, detector + 1]] = max;
            }
        }
        Ok(zingered)
    }

    pub fn stripes(&mut self, sinogram: &Sinogram, Stripes { percentage, max_thickness }: Stripes) -> Result<Sinogram> {
        check_percentage("stripe percentage", percentage)?;
        if max_thickness == 0 { return Err(Error::invalid("stripe thickness must be positive")) }
        let mut striped = sinogram.clone();
        let detectors = sinogram.detectors();
        if percentage == 0.0 || detectors == 0 { return Ok(striped) }
        let n_stripes = ((detectors as f64 * percentage as f64 / 100.0) as usize).max(1);
        for _ in 0..n_stripes {
            let start = self.rng.gen_range(0..detectors);
            let thickness = self.rng.gen_range(1..=max_thickness);
            let gain = 1.0 + self.rng.gen_range(-1.0..0.5_f32);
            let stop = (start + thickness).min(detectors);
            striped.data
                .slice_mut(ndarray::s![.., start..stop])
                .mapv_inplace(|v| v * gain);
        }
        Ok(striped)
    }
}

fn check_non_negative(what: &str, value: f32) -> Result<()> {
    if value >= 0.0 { Ok(()) } else { Err(Error::invalid(format!("{what} must not be negative, got {value}"))) }
}

fn check_percentage(what: &str, value: f32) -> Result<()> {
    if (0.0..=100.0).contains(&value) { Ok(()) }
    else { Err(Error::invalid(format!("{what} must lie in [0, 100], got {value}"))) }
}
