//! Analytical phantoms: images and sinograms computed in closed form from a
//! list of simple parametric objects.
//!
//! Every object is a profile `f(T)` of the squared elliptical radius
//! `T = (x'/a)² + (y'/b)²`, where `(x', y')` are coordinates in the object's
//! own frame (translated to its centre and rotated by its angle), except for
//! rectangles which are flat-topped boxes of half-sides `a` and `b`.
//!
//! For the elliptical profiles a line integral is easy to find: in the
//! object's unit frame the line becomes `u(t) = u₀ + t v`, the profile
//! depends only on `|u|² = s'² + τ²` with `τ = |v| t`, and so the integral is
//! `g(s') / |v|`, where `g` is the chord integral of the profile across the
//! unit disc at distance `s'` from its centre.

pub mod library;

pub use library::Library;

use std::path::Path;

use ndarray::{Axis, Zip};
use ndarray::parallel::prelude::*;

use geometry::{Point, Vector, Dot};
use units::{Angle, todo::{Intensityf32, Lengthf32}};

use crate::{Acquisition, Image, Result, Sinogram};
use crate::image::pixel_centres;

/// `4 ln 2`: makes the `a` and `b` of a Gaussian its full widths at half maximum
const GAUSS_ALPHA: f32 = 4.0 * std::f32::consts::LN_2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Gaussian,
    Parabola,
    Parabola1,
    Ellipse,
    Cone,
    Rectangle,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Gaussian  => "gaussian",
            Kind::Parabola  => "parabola",
            Kind::Parabola1 => "parabola1",
            Kind::Ellipse   => "ellipse",
            Kind::Cone      => "cone",
            Kind::Rectangle => "rectangle",
        }
    }
}

impl std::str::FromStr for Kind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "gaussian"  => Kind::Gaussian,
            "parabola"  => Kind::Parabola,
            "parabola1" => Kind::Parabola1,
            "ellipse"   => Kind::Ellipse,
            "cone"      => Kind::Cone,
            "rectangle" => Kind::Rectangle,
            other => return Err(format!("unknown object kind `{other}`")),
        })
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

/// One component of a phantom model
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Object {
    pub kind: Kind,
    pub intensity: Intensityf32,
    pub centre: Point,
    /// Half-axes `(a, b)` along the object's own x and y directions
    pub half_axes: (Lengthf32, Lengthf32),
    pub rotation: Angle,
}

impl Object {

    /// Map a displacement from the object's centre into its unit frame
    fn to_unit_frame(&self, v: Vector) -> Vector {
        let (a, b) = self.half_axes;
        v.rotated(-self.rotation).component_div(a, b)
    }

    /// Value of the object at point `p`
    pub fn value_at(&self, p: Point) -> Intensityf32 {
        let u = self.to_unit_frame(p - self.centre);
        let profile = match self.kind {
            Kind::Rectangle => if u.x.abs() <= 1.0 && u.y.abs() <= 1.0 { 1.0 } else { 0.0 },
            kind            => radial_profile(kind, u.dot(u)),
        };
        self.intensity * profile
    }

    /// Integral of the object along the line `{ s n + t n⊥ : t ∈ ℝ }`, where
    /// `n` is the unit vector at angle `θ` and `s` the signed distance of the
    /// line from the origin.
    pub fn line_integral(&self, s: Lengthf32, normal: Vector) -> Intensityf32 {
        let direction = Vector::new(-normal.y, normal.x);
        let u0 = self.to_unit_frame((Point::origin() + normal * s) - self.centre);
        let v  = self.to_unit_frame(direction);
        let integral = match self.kind {
            Kind::Rectangle => box_chord(u0, v),
            kind => {
                let speed = v.norm();
                let distance = u0.cross(v).abs() / speed;
                chord(kind, distance) / speed
            }
        };
        self.intensity * integral
    }
}

/// Profile of the elliptical kinds as a function of `T = |u|²` in the unit frame
fn radial_profile(kind: Kind, t: f32) -> f32 {
    if kind == Kind::Gaussian { return (-GAUSS_ALPHA * t).exp() }
    if t > 1.0 { return 0.0 }
    match kind {
        Kind::Ellipse   => 1.0,
        Kind::Parabola  => (1.0 - t).sqrt(),
        Kind::Parabola1 => 1.0 - t,
        Kind::Cone      => 1.0 - t.sqrt(),
        Kind::Gaussian | Kind::Rectangle => unreachable!(),
    }
}

/// Integral of the unit-frame profile along a chord at distance `s` from the
/// centre of the unit disc
fn chord(kind: Kind, s: f32) -> f32 {
    if kind == Kind::Gaussian {
        return (-GAUSS_ALPHA * s * s).exp() * (std::f32::consts::PI / GAUSS_ALPHA).sqrt()
    }
    if s >= 1.0 { return 0.0 }
    let l2 = 1.0 - s * s;
    let l = l2.sqrt();
    match kind {
        Kind::Ellipse   => 2.0 * l,
        Kind::Parabola  => std::f32::consts::FRAC_PI_2 * l2,
        Kind::Parabola1 => 4.0 / 3.0 * l2 * l,
        Kind::Cone      => if s < 1e-12 { 1.0 } else { l - s * s * ((1.0 + l) / s).ln() },
        Kind::Gaussian | Kind::Rectangle => unreachable!(),
    }
}

/// Length of the line `u₀ + t v` inside the square `[-1, 1]²`, measured in `t`
fn box_chord(u0: Vector, v: Vector) -> f32 {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for (start, step) in [(u0.x, v.x), (u0.y, v.y)] {
        if step.abs() < 1e-12 {
            if start.abs() > 1.0 { return 0.0 }
        } else {
            let t1 = (-1.0 - start) / step;
            let t2 = ( 1.0 - start) / step;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }
    }
    (t_max - t_min).max(0.0)
}

/// A numbered collection of objects, as found in a phantom library
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub id: u32,
    pub objects: Vec<Object>,
}

impl Model {

    pub fn value_at(&self, p: Point) -> Intensityf32 {
        self.objects.iter().map(|o| o.value_at(p)).sum()
    }

    /// Sample the model at the pixel centres of a `size × size` grid
    pub fn image(&self, size: usize) -> Image {
        let mut image = Image::zeros(size);
        let centres: Vec<_> = pixel_centres(size).collect();
        Zip::indexed(&mut image.data).par_for_each(|(row, col), value| {
            *value = self.value_at(Point::new(centres[col], centres[row]));
        });
        image
    }

    /// Closed-form sinogram of the model for the given geometry, in pixel units
    pub fn sinogram(&self, acquisition: &Acquisition) -> Sinogram {
        let n = acquisition.size() as f32;
        let pixel = 2.0 / n; // pixel width in normalised units
        let offset = acquisition.first_detector_offset();
        let mut sinogram = Sinogram::zeros(acquisition.n_angles(), acquisition.detectors());
        let normals: Vec<_> = acquisition.angles().iter().copied().map(Vector::unit).collect();
        sinogram.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(normals.par_iter())
            .for_each(|(mut row, &normal)| {
                for (d, reading) in row.iter_mut().enumerate() {
                    let s = (offset + d as f32) * pixel;
                    let integral: f32 = self.objects.iter().map(|o| o.line_integral(s, normal)).sum();
                    // Normalised lengths to pixel widths
                    *reading = integral / pixel;
                }
            });
        sinogram
    }

    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ { self.objects.iter().map(|o| o.kind) }
}

/// Look up `model` in the library at `path` (or in the built-in library) and
/// sample it on a `size × size` grid
pub fn model_image(model: u32, size: usize, path: Option<&Path>) -> Result<Image> {
    Ok(Library::load(path)?.model(model)?.image(size))
}

/// Look up `model` in the library at `path` (or in the built-in library) and
/// compute its analytical sinogram
pub fn model_sinogram(
    model    : u32,
    size     : usize,
    detectors: usize,
    angles   : Vec<Angle>,
    path     : Option<&Path>,
) -> Result<Sinogram> {
    let acquisition = Acquisition::new(size, detectors, angles)?;
    Ok(Library::load(path)?.model(model)?.sinogram(&acquisition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use units::deg;

    fn object(kind: Kind, centre: (f32, f32), half_axes: (f32, f32), rotation: f32) -> Object {
        Object {
            kind, intensity: 1.0,
            centre: Point::new(centre.0, centre.1),
            half_axes,
            rotation: deg(rotation),
        }
    }

    #[rstest(/**/    kind        , centre_value,
             case(Kind::Gaussian ,    1.0      ),
             case(Kind::Parabola ,    1.0      ),
             case(Kind::Parabola1,    1.0      ),
             case(Kind::Ellipse  ,    1.0      ),
             case(Kind::Cone     ,    1.0      ),
             case(Kind::Rectangle,    1.0      ),
    )]
    fn value_at_centre(kind: Kind, centre_value: f32) {
        let o = object(kind, (0.2, -0.3), (0.2, 0.1), 30.0);
        assert_float_eq!(o.value_at(Point::new(0.2, -0.3)), centre_value, ulps <= 1);
        // Far outside everything, only the Gaussian's tail is non-zero
        assert!(o.value_at(Point::new(0.9, 0.9)) < 1e-6);
    }

    #[test]
    fn rotation_is_anticlockwise() {
        // Long axis along x, then rotated by 90° to lie along y
        let o = object(Kind::Ellipse, (0.0, 0.0), (0.5, 0.1), 90.0);
        assert_eq!(o.value_at(Point::new(0.0, 0.4)), 1.0);
        assert_eq!(o.value_at(Point::new(0.4, 0.0)), 0.0);
    }

    // Chords of a centred disc of radius r: 2√(r² - s²)
    #[rstest(/**/ r  ,  s  , angle,
             case(0.5, 0.0 ,   0.0),
             case(0.5, 0.3 ,  37.0),
             case(0.5, -0.49, 123.0),
             case(0.8, 0.79, 270.0),
    )]
    fn disc_chords(r: f32, s: f32, angle: f32) {
        let o = object(Kind::Ellipse, (0.0, 0.0), (r, r), 0.0);
        let got = o.line_integral(s, Vector::unit(deg(angle)));
        assert_float_eq!(got, 2.0 * (r * r - s * s).sqrt(), abs <= 1e-5);
        assert_eq!(o.line_integral(r + 0.01, Vector::unit(deg(angle))), 0.0);
    }

    #[test]
    fn rectangle_diagonal_chord() {
        // Axis-aligned square of half-side 0.5, integrated along its diagonal
        let o = object(Kind::Rectangle, (0.0, 0.0), (0.5, 0.5), 0.0);
        let got = o.line_integral(0.0, Vector::unit(deg(45.0)));
        assert_float_eq!(got, std::f32::consts::SQRT_2, abs <= 1e-5);
    }

    // Brute-force the line integral by summing samples along the line
    fn numerical_line_integral(o: &Object, s: f32, normal: Vector) -> f32 {
        let direction = Vector::new(-normal.y, normal.x);
        let base = Point::origin() + normal * s;
        let dt = 1e-4;
        let n = (6.0 / dt) as i32;
        (-n/2..n/2)
            .map(|i| o.value_at(base + direction * ((i as f32 + 0.5) * dt)))
            .sum::<f32>() * dt
    }

    use proptest::prelude::*;

    fn kind() -> impl Strategy<Value = Kind> {
        prop_oneof![
            Just(Kind::Gaussian), Just(Kind::Parabola), Just(Kind::Parabola1),
            Just(Kind::Ellipse), Just(Kind::Cone), Just(Kind::Rectangle),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]
        #[test]
        fn closed_form_matches_quadrature(
            kind in kind(),
            x0 in -0.5..0.5_f32, y0 in -0.5..0.5_f32,
            a in 0.05..0.5_f32,  b in 0.05..0.5_f32,
            rotation in -180.0..180.0_f32,
            s in -0.9..0.9_f32,
            angle in 0.0..180.0_f32,
        ) {
            let o = object(kind, (x0, y0), (a, b), rotation);
            let normal = Vector::unit(deg(angle));
            let exact = o.line_integral(s, normal);
            let approx = numerical_line_integral(&o, s, normal);
            prop_assert!((exact - approx).abs() < 2e-3 + 1e-2 * exact.abs(),
                         "{kind}: closed form {exact} vs quadrature {approx}");
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let model = Library::builtin().model(4).unwrap().clone();
        let acq = Acquisition::for_image_size(32).unwrap();
        assert_eq!(model.image(32), model.image(32));
        assert_eq!(model.sinogram(&acq), model.sinogram(&acq));
    }

    #[test]
    fn unknown_model_is_an_error() {
        assert!(matches!(model_image(999, 8, None), Err(crate::Error::ModelNotFound(999))));
    }
}
