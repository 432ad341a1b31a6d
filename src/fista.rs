//! Fast Iterative Shrinkage-Thresholding Algorithm with least-squares data
//! fidelity and an optional TV proximal step.

use serde::{Deserialize, Serialize};

use crate::projector::Projector;
use crate::regularisation::{Regularisation, Regulariser};
use crate::{Error, Image, Result, Sinogram, power};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FistaOptions {
    #[serde(default = "defaults::iterations")]
    pub iterations: usize,
    /// Stop once the relative change between iterates drops below this
    #[serde(default = "defaults::tolerance")]
    pub tolerance: f32,
    /// Iterations of the power method, when `lipschitz` is not given
    #[serde(default = "defaults::power_iterations")]
    pub power_iterations: usize,
    #[serde(default)]
    pub lipschitz: Option<f32>,
    #[serde(default)]
    pub nonnegative: bool,
    #[serde(default)]
    pub regularisation: Option<Regularisation>,
}

mod defaults {
    pub fn iterations() -> usize { 150 }
    pub fn tolerance() -> f32 { 1e-6 }
    pub fn power_iterations() -> usize { crate::power::DEFAULT_ITERATIONS }
}

impl Default for FistaOptions {
    fn default() -> Self {
        Self {
            iterations: defaults::iterations(),
            tolerance: defaults::tolerance(),
            power_iterations: defaults::power_iterations(),
            lipschitz: None,
            nonnegative: false,
            regularisation: None,
        }
    }
}

pub struct Fista<'a, P: Projector> {
    projector: &'a P,
    measured: &'a Sinogram,
    options: FistaOptions,
    lipschitz: f32,
}

/// What a finished run looked like
#[derive(Clone, Debug)]
pub struct FistaOutcome {
    pub image: Image,
    pub iterations: usize,
    pub converged: bool,
    pub lipschitz: f32,
}

impl<'a, P: Projector> Fista<'a, P> {

    pub fn new(projector: &'a P, measured: &'a Sinogram, options: FistaOptions) -> Result<Self> {
        measured.check_dim(projector.acquisition().sinogram_dim())?;
        if let Some(r) = &options.regularisation { r.validate()?; }
        let lipschitz = match options.lipschitz {
            Some(l) => l,
            None    => power::lipschitz(projector, options.power_iterations),
        };
        if !(lipschitz > 0.0 && lipschitz.is_finite()) {
            return Err(Error::invalid(format!("Lipschitz constant must be positive and finite, got {lipschitz}")))
        }
        Ok(Self { projector, measured, options, lipschitz })
    }

    pub fn lipschitz(&self) -> f32 { self.lipschitz }

    /// Gradient step from `y`, then the proximal step
    fn step(&self, y: &Image) -> Image {
        let mut residual = self.projector.forward(y);
        residual.data -= &self.measured.data;
        let gradient = self.projector.back(&residual);
        let mut x = y.clone();
        x.scaled_add(-1.0 / self.lipschitz, &gradient);
        if let Some(regularisation) = &self.options.regularisation {
            x = regularisation.prox(&x);
        }
        if self.options.nonnegative { x.clamp_negative(); }
        x
    }

    pub fn run(&self) -> FistaOutcome {
        let FistaOptions { iterations, tolerance, .. } = self.options;
        let size = self.projector.acquisition().size();
        let mut x = Image::zeros(size);
        let mut y = x.clone();
        let mut t = 1.0_f32;
        let mut done = 0;
        let mut converged = false;
        let progress = crate::progress::bar(iterations as u64, "FISTA");

        for k in 0..iterations {
            let x_next = self.step(&y);
            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;

            let mut change = x_next.clone();
            change.scaled_add(-1.0, &x);
            let relative = change.norm() / x_next.norm();

            y = x_next.clone();
            y.scaled_add((t - 1.0) / t_next, &change);
            x = x_next;
            t = t_next;
            done = k + 1;
            progress.inc(1);

            if relative < tolerance {
                tracing::debug!(iteration = done, relative, "FISTA converged");
                converged = true;
                break
            }
        }
        progress.finish_and_clear();
        FistaOutcome { image: x, iterations: done, converged, lipschitz: self.lipschitz }
    }
}
