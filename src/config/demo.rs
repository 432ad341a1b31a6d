//! Configuration of the phantom-to-reconstruction demo run
//!
//! Parsing a file starts from an empty run: any artifact section left out is
//! simply not injected, and the regularised FISTA pass only happens when
//! `[fista.regularisation]` is present. [`Config::default`] is the full demo.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use units::{Angle, deg};

use crate::{Acquisition, Error, Result};
use crate::artifacts::{Noise, Stripes, Zingers};
use crate::fbp::Filter;
use crate::fista::FistaOptions;
use crate::fourier::Interpolation;
use crate::regularisation::{Regularisation, RofTv};
use crate::sirt::SirtOptions;
use super::{deserialize_angle, deserialize_parsed};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Model number in the phantom library
    #[serde(default = "defaults::model")]
    pub model: u32,

    /// Side of the square image, in pixels
    #[serde(default = "defaults::size")]
    pub size: usize,

    /// Phantom library file; the built-in one when absent
    #[serde(default)]
    pub library: Option<PathBuf>,

    /// Seed for artifact generation; fresh entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub angles: Angles,

    #[serde(default)]
    pub noise: Option<Noise>,

    #[serde(default)]
    pub zingers: Option<Zingers>,

    #[serde(default)]
    pub stripes: Option<Stripes>,

    #[serde(default)]
    pub fourier: FourierSection,

    #[serde(default)]
    pub fbp: FbpSection,

    #[serde(default)]
    pub sirt: SirtOptions,

    #[serde(default)]
    pub fista: FistaOptions,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Angles {
    #[serde(default = "defaults::start", deserialize_with = "deserialize_angle")]
    pub start: Angle,
    #[serde(default = "defaults::stop", deserialize_with = "deserialize_angle")]
    pub stop: Angle,
    /// Number of projections; `floor(π size / 2)` when absent
    #[serde(default)]
    pub count: Option<usize>,
    /// Number of detectors; `floor(√2 size)` when absent
    #[serde(default)]
    pub detectors: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FourierSection {
    #[serde(default, deserialize_with = "deserialize_parsed")]
    pub interpolation: Interpolation,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FbpSection {
    #[serde(default, deserialize_with = "deserialize_parsed")]
    pub filter: Filter,
}

mod defaults {
    use super::*;
    pub fn model() -> u32 { 4 }
    pub fn size() -> usize { 512 }
    pub fn start() -> Angle { deg(0.0) }
    pub fn stop () -> Angle { deg(179.9) }
}

impl Default for Angles {
    fn default() -> Self {
        Self { start: defaults::start(), stop: defaults::stop(), count: None, detectors: None }
    }
}

impl Default for Config {
    /// The demo run: Poisson noise, zingers and stripes on model 4, every
    /// reconstruction, FISTA with and without ROF-TV
    fn default() -> Self {
        Self {
            model: defaults::model(),
            size: defaults::size(),
            library: None,
            seed: None,
            angles: Angles::default(),
            noise: Some(Noise::Poisson { sigma: 10_000.0 }),
            zingers: Some(Zingers { percentage: 0.25, modulus: 10 }),
            stripes: Some(Stripes { percentage: 1.0, max_thickness: 1 }),
            fourier: FourierSection { interpolation: Interpolation::Nearest },
            fbp: FbpSection::default(),
            sirt: SirtOptions::default(),
            fista: FistaOptions {
                regularisation: Some(Regularisation::RofTv(RofTv::new(0.01))),
                ..FistaOptions::default()
            },
        }
    }
}

impl Config {

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(Error::io(path))?;
        text.parse()
    }

    /// Projection geometry implied by `size` and `[angles]`
    pub fn acquisition(&self) -> Result<Acquisition> {
        let Angles { start, stop, count, detectors } = self.angles;
        let acquisition = Acquisition::evenly_spaced(self.size, start, stop, count)?;
        match detectors {
            Some(d) => acquisition.with_detectors(d),
            None    => Ok(acquisition),
        }
    }

    /// Whether any artifact is injected
    pub fn corrupts(&self) -> bool {
        self.noise.is_some() || self.zingers.is_some() || self.stripes.is_some()
    }
}

impl std::str::FromStr for Config {
    type Err = Error;
    fn from_str(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }
}
