pub use pixel::PixelDriven;

pub mod pixel;

use crate::{Acquisition, Image, Sinogram};

/// Abstract interface for discrete forward/back projection implementations.
///
/// `back` must be the exact adjoint of `forward`: iterative reconstructions
/// rely on `⟨forward(x), y⟩ = ⟨x, back(y)⟩`.
pub trait Projector: Sync {
    fn acquisition(&self) -> &Acquisition;
    fn forward(&self, image: &Image) -> Sinogram;
    fn back(&self, sinogram: &Sinogram) -> Image;

    /// Forward projection of an all-ones image: the row sums of the system matrix
    fn row_sums(&self) -> Sinogram { self.forward(&Image::ones(self.acquisition().size())) }

    /// Back projection of an all-ones sinogram: the column sums of the system matrix
    fn column_sums(&self) -> Image {
        let (angles, detectors) = self.acquisition().sinogram_dim();
        self.back(&Sinogram::new(ndarray::Array2::ones((angles, detectors))))
    }
}
