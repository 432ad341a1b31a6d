//! Two-dimensional analytical phantoms, their sinograms, synthetic
//! measurement artifacts, and a handful of reconstructions to compare.

mod error;
pub use error::{Error, Result};

pub mod image;
pub mod sinogram;
pub mod acquisition;
pub mod phantom;
pub mod projector;
pub mod artifacts;
pub mod fourier;
pub mod fbp;
pub mod sirt;
pub mod power;
pub mod fista;
pub mod regularisation;
pub mod fom;
pub mod config;
pub mod pipeline;
pub mod io;
pub mod progress;

pub use image::Image;
pub use sinogram::Sinogram;
pub use acquisition::Acquisition;
