//! Figures of merit comparing two images of the same size.

use crate::{Error, Image, Result};

fn check_same(a: &Image, b: &Image) -> Result<()> {
    if a.data.dim() != b.data.dim() {
        return Err(Error::Shape { expected: b.data.dim(), found: a.data.dim() })
    }
    Ok(())
}

/// `‖a − b‖₂ / ‖b‖₂`, or 0 when both images vanish
pub fn relative_error(a: &Image, b: &Image) -> Result<f32> {
    let difference = abs_difference(a, b)?.norm();
    let reference = b.norm();
    Ok(match (difference == 0.0, reference == 0.0) {
        (true, _)      => 0.0,
        (false, true)  => f32::INFINITY,
        (false, false) => difference / reference,
    })
}

/// Root mean square of the pixel-wise differences
pub fn rmse(a: &Image, b: &Image) -> Result<f32> {
    check_same(a, b)?;
    let n = a.data.len();
    if n == 0 { return Ok(0.0) }
    let sum: f64 = a.data.iter().zip(b.data.iter())
        .map(|(x, y)| (x - y) as f64)
        .map(|d| d * d)
        .sum();
    Ok((sum / n as f64).sqrt() as f32)
}

/// `|a − b|`, pixel by pixel
pub fn abs_difference(a: &Image, b: &Image) -> Result<Image> {
    check_same(a, b)?;
    Image::new((&a.data - &b.data).mapv(f32::abs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use ndarray::arr2;

    fn image(data: [[f32; 2]; 2]) -> Image { Image::new(arr2(&data)).unwrap() }

    #[test]
    fn identical_images() {
        let a = image([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(relative_error(&a, &a).unwrap(), 0.0);
        assert_eq!(rmse(&a, &a).unwrap(), 0.0);
        assert_eq!(relative_error(&Image::zeros(3), &Image::zeros(3)).unwrap(), 0.0);
    }

    #[test]
    fn known_values() {
        let a = image([[1.0, 0.0], [0.0, 0.0]]);
        let b = image([[0.0, 0.0], [0.0, 2.0]]);
        assert_float_eq!(relative_error(&a, &b).unwrap(), 5.0_f32.sqrt() / 2.0, ulps <= 2);
        assert_float_eq!(rmse(&a, &b).unwrap(), (5.0_f32 / 4.0).sqrt(), ulps <= 2);
        assert_eq!(abs_difference(&a, &b).unwrap(), image([[1.0, 0.0], [0.0, 2.0]]));
    }

    #[test]
    fn size_mismatch() {
        assert!(rmse(&Image::zeros(2), &Image::zeros(3)).is_err());
        assert!(relative_error(&Image::zeros(2), &Image::zeros(3)).is_err());
    }
}
