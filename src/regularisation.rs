//! Total-variation denoisers, used as proximal steps inside FISTA.
//!
//! Both solve (approximately) the Rudin-Osher-Fatemi problem
//!
//! ```text
//! argmin_u  ½‖u − f‖² + λ TV(u)
//! ```
//!
//! with isotropic TV built from forward differences and Neumann boundaries.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::{Error, Image, Result};
use crate::image::ImageData;

/// Denoiser applied to an image as a proximal step
pub trait Regulariser: Sync {
    fn prox(&self, image: &Image) -> Image;
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Regularisation {
    RofTv(RofTv),
    FgpTv(FgpTv),
}

impl Regularisation {
    pub fn lambda(&self) -> f32 {
        match self {
            Self::RofTv(r) => r.lambda,
            Self::FgpTv(r) => r.lambda,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lambda = self.lambda();
        if !(lambda >= 0.0) { return Err(Error::invalid(format!("regularisation lambda must not be negative, got {lambda}"))) }
        if let Self::RofTv(RofTv { time_step, .. }) = self {
            if !(*time_step > 0.0) { return Err(Error::invalid(format!("ROF time step must be positive, got {time_step}"))) }
        }
        Ok(())
    }
}

impl Regulariser for Regularisation {
    fn prox(&self, image: &Image) -> Image {
        match self {
            Self::RofTv(r) => r.prox(image),
            Self::FgpTv(r) => r.prox(image),
        }
    }
}

/// Explicit time marching of the ROF Euler-Lagrange equation
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RofTv {
    pub lambda: f32,
    #[serde(default = "defaults::rof_iterations")]
    pub iterations: usize,
    #[serde(default = "defaults::time_step")]
    pub time_step: f32,
}

/// Fast gradient projection on the dual of the ROF problem (Beck & Teboulle)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FgpTv {
    pub lambda: f32,
    #[serde(default = "defaults::fgp_iterations")]
    pub iterations: usize,
}

mod defaults {
    pub fn rof_iterations() -> usize { 100 }
    pub fn fgp_iterations() -> usize { 50 }
    pub fn time_step() -> f32 { 0.0025 }
}

/// Smoothing of |∇u| in the ROF flux
const EPSILON: f32 = 1e-3;

impl RofTv {
    pub fn new(lambda: f32) -> Self {
        Self { lambda, iterations: defaults::rof_iterations(), time_step: defaults::time_step() }
    }
}

impl Regulariser for RofTv {
    fn prox(&self, image: &Image) -> Image {
        let RofTv { lambda, iterations, time_step } = *self;
        let f = &image.data;
        let mut u = f.clone();
        if lambda == 0.0 { return Image { data: u } }
        for _ in 0..iterations {
            let (mut gx, mut gy) = gradient(&u);
            Zip::from(&mut gx).and(&mut gy).par_for_each(|x, y| {
                let magnitude = (*x * *x + *y * *y + EPSILON * EPSILON).sqrt();
                *x /= magnitude;
                *y /= magnitude;
            });
            let curvature = divergence(&gx, &gy);
            Zip::from(&mut u).and(&curvature).and(f).par_for_each(|u, &k, &f| {
                *u += time_step * (lambda * k - (*u - f));
            });
        }
        Image { data: u }
    }
}

impl FgpTv {
    pub fn new(lambda: f32) -> Self { Self { lambda, iterations: defaults::fgp_iterations() } }
}

impl Regulariser for FgpTv {
    fn prox(&self, image: &Image) -> Image {
        let FgpTv { lambda, iterations } = *self;
        let f = &image.data;
        if lambda == 0.0 { return image.clone() }
        let dim = f.dim();
        let step = 1.0 / (8.0 * lambda);
        // Dual variables p, and their extrapolation r
        let (mut px, mut py) = (Array2::zeros(dim), Array2::zeros(dim));
        let (mut rx, mut ry): (ImageData, ImageData) = (Array2::zeros(dim), Array2::zeros(dim));
        let mut t = 1.0_f32;

        for _ in 0..iterations {
            let mut u = divergence(&rx, &ry);
            u.zip_mut_with(f, |u, &f| *u = f + lambda * *u);
            let (gx, gy) = gradient(&u);

            let (mut qx, mut qy) = (rx + &gx * step, ry + &gy * step);
            Zip::from(&mut qx).and(&mut qy).par_for_each(|x, y| {
                let scale = (*x * *x + *y * *y).sqrt().max(1.0);
                *x /= scale;
                *y /= scale;
            });

            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let momentum = (t - 1.0) / t_next;
            rx = &qx + &((&qx - &px) * momentum);
            ry = &qy + &((&qy - &py) * momentum);
            px = qx;
            py = qy;
            t = t_next;
        }
        let mut u = divergence(&px, &py);
        u.zip_mut_with(f, |u, &f| *u = f + lambda * *u);
        Image { data: u }
    }
}

/// Forward differences along columns (x) and rows (y), zero on the far edge
pub fn gradient(u: &ImageData) -> (ImageData, ImageData) {
    let (rows, cols) = u.dim();
    let mut gx = Array2::zeros((rows, cols));
    let mut gy = Array2::zeros((rows, cols));
    Zip::indexed(&mut gx).and(&mut gy).par_for_each(|(i, j), gx, gy| {
        if j + 1 < cols { *gx = u[[i, j + 1]] - u[[i, j]]; }
        if i + 1 < rows { *gy = u[[i + 1, j]] - u[[i, j]]; }
    });
    (gx, gy)
}

/// Negative adjoint of [`gradient`]
pub fn divergence(px: &ImageData, py: &ImageData) -> ImageData {
    let (rows, cols) = px.dim();
    let mut div = Array2::zeros((rows, cols));
    Zip::indexed(&mut div).par_for_each(|(i, j), d| {
        let mut v = 0.0;
        if j + 1 < cols { v += px[[i, j]]; }
        if j > 0        { v -= px[[i, j - 1]]; }
        if i + 1 < rows { v += py[[i, j]]; }
        if i > 0        { v -= py[[i - 1, j]]; }
        *d = v;
    });
    div
}

/// Isotropic total variation
pub fn total_variation(image: &Image) -> f32 {
    let (gx, gy) = gradient(&image.data);
    Zip::from(&gx).and(&gy).fold(0.0, |sum, x, y| sum + (x * x + y * y).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rand_distr::Normal;
    use proptest::prelude::*;

    fn noisy_square(n: usize, sd: f32, seed: u64) -> (Image, Image) {
        let clean = Image::new(Array2::from_shape_fn((n, n), |(i, j)| {
            if (n / 4..3 * n / 4).contains(&i) && (n / 4..3 * n / 4).contains(&j) { 1.0 } else { 0.0 }
        })).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sd).unwrap();
        let noisy = Image::new(clean.data.mapv(|v| v + rng.sample(normal))).unwrap();
        (clean, noisy)
    }

    fn distance(a: &Image, b: &Image) -> f32 {
        (&a.data - &b.data).mapv(|v| v * v).sum().sqrt()
    }

    proptest! {
        #[test]
        fn divergence_is_negative_adjoint_of_gradient(seed in 0..1000_u64, rows in 1..12_usize, cols in 1..12_usize) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut random = || Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0..1.0_f32));
            let (u, px, py) = (random(), random(), random());
            let (gx, gy) = gradient(&u);
            let lhs = (&gx * &px).sum() + (&gy * &py).sum();
            let rhs = -(&u * &divergence(&px, &py)).sum();
            prop_assert!((lhs - rhs).abs() <= 1e-4 * (1.0 + lhs.abs()));
        }
    }

    #[test]
    fn constant_images_are_fixed_points() {
        let flat = Image::new(Array2::from_elem((10, 10), 0.7)).unwrap();
        let regularisers = [Regularisation::RofTv(RofTv::new(0.05)), Regularisation::FgpTv(FgpTv::new(0.05))];
        for r in regularisers {
            let out = r.prox(&flat);
            assert_float_eq!(out.data.iter().copied().collect::<Vec<_>>(), vec![0.7; 100], abs_all <= 1e-5);
        }
    }

    #[test]
    fn fgp_reduces_noise_and_total_variation() {
        let (clean, noisy) = noisy_square(32, 0.1, 1);
        let denoised = FgpTv::new(0.1).prox(&noisy);
        assert!(distance(&denoised, &clean) < 0.7 * distance(&noisy, &clean));
        assert!(total_variation(&denoised) < total_variation(&noisy));
    }

    #[test]
    fn rof_reduces_total_variation() {
        let (_, noisy) = noisy_square(32, 0.1, 2);
        let rof = RofTv { lambda: 1.0, iterations: 200, time_step: 0.0002 };
        let denoised = rof.prox(&noisy);
        assert!(total_variation(&denoised) < total_variation(&noisy));
        // Mean is conserved by the Neumann flow
        assert_float_eq!(denoised.data.mean().unwrap(), noisy.data.mean().unwrap(), abs <= 1e-3);
    }

    #[test]
    fn zero_lambda_is_identity() {
        let (_, noisy) = noisy_square(8, 0.1, 3);
        assert_eq!(RofTv::new(0.0).prox(&noisy), noisy);
        assert_eq!(FgpTv::new(0.0).prox(&noisy), noisy);
    }

    #[test]
    fn deserialize_tagged() {
        let r: Regularisation = toml::from_str(r#"kind = "fgp-tv"
lambda = 0.2"#).unwrap();
        assert_eq!(r, Regularisation::FgpTv(FgpTv { lambda: 0.2, iterations: 50 }));
        assert!(Regularisation::RofTv(RofTv { lambda: 1.0, iterations: 1, time_step: 0.0 }).validate().is_err());
    }
}
