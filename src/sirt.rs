//! Simultaneous Iterative Reconstruction Technique.
//!
//! `x ← x + C Aᵀ R (b − A x)`, where `R` and `C` hold the reciprocals of the
//! row and column sums of the system matrix `A`. Rays or pixels that the
//! geometry never touches get a weight of zero.

use crate::projector::Projector;
use crate::{Image, Result, Sinogram};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct SirtOptions {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Clip negative values after every update
    #[serde(default)]
    pub nonnegative: bool,
}

fn default_iterations() -> usize { 250 }

impl Default for SirtOptions {
    fn default() -> Self { Self { iterations: default_iterations(), nonnegative: false } }
}

impl Image {

    /// An infinite sequence of SIRT iterates, starting from a zero image
    pub fn sirt<'a, P: Projector>(
        projector  : &'a P,
        measured   : &'a Sinogram,
        nonnegative: bool,
    ) -> Result<impl Iterator<Item = Image> + 'a> {
        let acquisition = projector.acquisition();
        measured.check_dim(acquisition.sinogram_dim())?;

        let inverse_rows = {
            let mut r = projector.row_sums();
            r.data.mapv_inplace(|v| if v > 0.0 { 1.0 / v } else { 0.0 });
            r
        };
        let inverse_columns = projector.column_sums().inverted();
        let mut image = Image::zeros(acquisition.size());

        Ok(std::iter::from_fn(move || {
            let mut residual = projector.forward(&image);
            residual.data.zip_mut_with(&measured.data, |r, &b| *r = b - *r);
            residual.data *= &inverse_rows.data;
            let mut update = projector.back(&residual);
            update.mul_assign(&inverse_columns);
            image.scaled_add(1.0, &update);
            if nonnegative { image.clamp_negative(); }
            Some(image.clone())
        }))
    }
}

/// Run SIRT for a fixed number of iterations
pub fn sirt<P: Projector>(projector: &P, measured: &Sinogram, options: SirtOptions) -> Result<Image> {
    let SirtOptions { iterations, nonnegative } = options;
    tracing::debug!(iterations, nonnegative, "SIRT");
    let progress = crate::progress::bar(iterations as u64, "SIRT");
    let mut last = Image::zeros(projector.acquisition().size());
    for image in Image::sirt(projector, measured, nonnegative)?.take(iterations) {
        last = image;
        progress.inc(1);
    }
    progress.finish_and_clear();
    Ok(last)
}
