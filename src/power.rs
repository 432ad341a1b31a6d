//! Largest eigenvalue of `AᵀA` by power iteration.
//!
//! Its value is the Lipschitz constant of the gradient of `½‖Ax − b‖²`, which
//! fixes the gradient step of FISTA.

use crate::Image;
use crate::projector::Projector;

pub const DEFAULT_ITERATIONS: usize = 15;

/// Estimate of the largest eigenvalue of `AᵀA`, starting from an all-ones image
pub fn lipschitz<P: Projector>(projector: &P, iterations: usize) -> f32 {
    let mut x = Image::ones(projector.acquisition().size());
    let mut eigenvalue = 0.0;
    for _ in 0..iterations.max(1) {
        let norm = x.norm();
        if norm == 0.0 { return 0.0 }
        x.data /= norm;
        let y = projector.back(&projector.forward(&x));
        // Rayleigh quotient of the unit vector x
        eigenvalue = x.data.iter().zip(y.data.iter()).map(|(a, b)| a * b).sum();
        x = y;
    }
    tracing::debug!(eigenvalue, iterations, "power method");
    eigenvalue
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use crate::{Acquisition, projector::PixelDriven};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn bounds_the_rayleigh_quotient_of_any_image() {
        let n = 16;
        let projector = PixelDriven::new(Acquisition::for_image_size(n).unwrap());
        let l = lipschitz(&projector, 30);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5 {
            let x = Image::new(ndarray::Array2::from_shape_fn((n, n), |_| rng.gen_range(-1.0..1.0))).unwrap();
            let ax = projector.forward(&x).norm();
            assert!(ax * ax <= l * x.norm() * x.norm() * 1.001);
        }
    }

    #[test]
    fn more_iterations_settle() {
        let projector = PixelDriven::new(Acquisition::for_image_size(16).unwrap());
        let a = lipschitz(&projector, 40);
        let b = lipschitz(&projector, 60);
        assert_float_eq!(a, b, rmax <= 1e-3);
        assert!(lipschitz(&projector, DEFAULT_ITERATIONS) <= b * 1.0001);
    }
}
