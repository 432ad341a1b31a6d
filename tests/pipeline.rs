use rstest::rstest;

use phantom2d::{Acquisition, Image, Sinogram};
use phantom2d::artifacts::{Artifacts, Noise, Stripes, Zingers};
use phantom2d::config::demo::Config;
use phantom2d::fbp::{Filter, fbp};
use phantom2d::fista::{Fista, FistaOptions};
use phantom2d::fom::relative_error;
use phantom2d::fourier::{Interpolation, fourier};
use phantom2d::phantom::{Library, model_image, model_sinogram};
use phantom2d::pipeline::Pipeline;
use phantom2d::projector::{PixelDriven, Projector};
use phantom2d::sirt::{SirtOptions, sirt};

const DISC: u32 = 2;

fn disc(n: usize) -> (Image, Sinogram, PixelDriven) {
    let acquisition = Acquisition::for_image_size(n).unwrap();
    let model = Library::builtin().model(DISC).unwrap();
    let image = model.image(n);
    let sinogram = model.sinogram(&acquisition);
    (image, sinogram, PixelDriven::new(acquisition))
}

fn sinogram_relative_error(a: &Sinogram, b: &Sinogram) -> f32 {
    let diff = Sinogram::new(&a.data - &b.data);
    diff.norm() / b.norm()
}

#[test]
fn generation_is_deterministic() {
    let acquisition = Acquisition::for_image_size(32).unwrap();
    let angles = acquisition.angles().to_vec();
    assert_eq!(model_image(1, 32, None).unwrap(), model_image(1, 32, None).unwrap());
    assert_eq!(model_sinogram(1, 32, acquisition.detectors(), angles.clone(), None).unwrap(),
               model_sinogram(1, 32, acquisition.detectors(), angles        , None).unwrap());
}

#[rstest(model, case(1), case(2), case(4))]
fn analytical_sinogram_agrees_with_projected_image(model: u32) {
    let n = 64;
    let acquisition = Acquisition::for_image_size(n).unwrap();
    let model = Library::builtin().model(model).unwrap();
    let analytical = model.sinogram(&acquisition);
    let projected = PixelDriven::new(acquisition).forward(&model.image(n));
    let err = sinogram_relative_error(&projected, &analytical);
    assert!(err < 0.1, "relative error {err}");
}

#[test]
fn every_reconstruction_recovers_a_disc() {
    let (phantom, sinogram, projector) = disc(48);
    let acquisition = projector.acquisition();

    let fbp_image = fbp(&projector, &sinogram, Filter::RamLak).unwrap();
    let sirt_image = sirt(&projector, &sinogram, SirtOptions { iterations: 200, nonnegative: true }).unwrap();
    let fista_options = FistaOptions { iterations: 100, ..FistaOptions::default() };
    let fista_image = Fista::new(&projector, &sinogram, fista_options).unwrap().run().image;
    let fourier_image = fourier(&sinogram, acquisition, Interpolation::Linear).unwrap();

    for (name, image, tolerance) in [
        ("fbp"    , &fbp_image    , 0.3 ),
        ("sirt"   , &sirt_image   , 0.3 ),
        ("fista"  , &fista_image  , 0.3 ),
        ("fourier", &fourier_image, 0.4 ),
    ] {
        let err = relative_error(image, &phantom).unwrap();
        assert!(err < tolerance, "{name}: relative error {err}");
    }
}

// ----- Artifacts ----------------------------------------------------------------------

fn corrupt(sinogram: &Sinogram, seed: Option<u64>) -> Sinogram {
    let mut artifacts = Artifacts::new(seed);
    let noisy = artifacts.noise(sinogram, Noise::Poisson { sigma: 1000.0 }).unwrap();
    let zinged = artifacts.zingers(&noisy, Zingers { percentage: 1.0, modulus: 5 }).unwrap();
    artifacts.stripes(&zinged, Stripes { percentage: 2.0, max_thickness: 2 }).unwrap()
}

#[test]
fn artifacts_keep_the_shape() {
    let (_, sinogram, _) = disc(24);
    assert_eq!(corrupt(&sinogram, Some(1)).dim(), sinogram.dim());
}

#[test]
fn seeded_artifacts_are_reproducible() {
    let (_, sinogram, _) = disc(24);
    assert_eq!(corrupt(&sinogram, Some(9)), corrupt(&sinogram, Some(9)));
    assert_ne!(corrupt(&sinogram, Some(9)), corrupt(&sinogram, Some(10)));
}

#[test]
fn unseeded_artifacts_vary() {
    let (_, sinogram, _) = disc(24);
    assert_ne!(corrupt(&sinogram, None), corrupt(&sinogram, None));
}

#[test]
fn clamping_is_idempotent() {
    let (_, sinogram, _) = disc(24);
    let mut artifacts = Artifacts::new(Some(5));
    let mut noisy = artifacts.noise(&sinogram, Noise::Gaussian { sigma: 1.0 }).unwrap();
    let first = noisy.clamp_negative();
    assert!(first > 0);
    let once = noisy.clone();
    assert_eq!(noisy.clamp_negative(), 0);
    assert_eq!(noisy, once);
    assert!(noisy.data.iter().all(|&v| v >= 0.0));
}

// ----- The whole run ------------------------------------------------------------------

fn small_run(corrupted: bool) -> Config {
    let mut config: Config = "
        model = 2
        size = 32
        seed = 11
        [sirt]
        iterations = 20
        [fista]
        iterations = 20
    ".parse().unwrap();
    if corrupted {
        config.noise = Some(Noise::Gaussian { sigma: 0.5 });
        config.stripes = Some(Stripes { percentage: 5.0, max_thickness: 1 });
    }
    config
}

#[test]
fn ratios_vanish_without_artifacts() {
    let report = Pipeline::new(small_run(false)).unwrap().run().unwrap();
    assert_eq!(report.fbp_ratio, 0.0);
    assert_eq!(report.sirt_ratio, 0.0);
    assert!(report.fbp_difference.data.iter().all(|&v| v == 0.0));
}

#[test]
fn ratios_grow_with_artifacts() {
    let report = Pipeline::new(small_run(true)).unwrap().run().unwrap();
    assert!(report.fbp_ratio > 0.0);
    assert!(report.sirt_ratio > 0.0);
    assert_eq!(report.corrupted.dim(), report.ideal.dim());
    assert_eq!(report.fourier.size(), 32);
    assert!(report.rmse.contains_key("fista"));
}
