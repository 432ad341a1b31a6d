//! The demo run, stage by stage: phantom, analytical sinogram, artifacts,
//! reconstructions, figures of merit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::artifacts::Artifacts;
use crate::config::demo::Config;
use crate::fista::{Fista, FistaOptions};
use crate::io::{Format, write_array};
use crate::phantom::{Library, Model};
use crate::projector::{PixelDriven, Projector};
use crate::{Acquisition, Error, Image, Result, Sinogram, fbp, fom, fourier, sirt};

pub struct Pipeline {
    config: Config,
    model: Model,
    projector: PixelDriven,
}

/// Everything a run produces
#[derive(Clone, Debug)]
pub struct Report {
    pub model: u32,
    pub seed: Option<u64>,
    pub acquisition: Acquisition,
    /// Negative readings removed from the corrupted sinogram
    pub clamped: usize,
    pub lipschitz: f32,

    pub phantom: Image,
    pub ideal: Sinogram,
    pub corrupted: Sinogram,

    pub fourier: Image,
    pub fbp_ideal: Image,
    pub fbp_error: Image,
    pub sirt_ideal: Image,
    pub sirt_error: Image,
    pub fista: Image,
    pub fista_regularised: Option<Image>,

    pub fbp_difference: Image,
    pub sirt_difference: Image,
    /// `‖ideal − error‖ / ‖error‖` for FBP
    pub fbp_ratio: f32,
    /// `‖ideal − error‖ / ‖error‖` for SIRT
    pub sirt_ratio: f32,
    /// RMSE of each reconstruction against the phantom
    pub rmse: BTreeMap<String, f32>,
}

/// Log how long a stage took
fn timed<T>(stage: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f()?;
    info!(stage, elapsed = ?start.elapsed(), "done");
    Ok(result)
}

impl Pipeline {

    pub fn new(config: Config) -> Result<Self> {
        let library = Library::load(config.library.as_deref())?;
        let model = library.model(config.model)?.clone();
        let acquisition = config.acquisition()?;
        info!(model = model.id, objects = model.objects.len(), size = acquisition.size(),
              angles = acquisition.n_angles(), detectors = acquisition.detectors(), "pipeline ready");
        Ok(Self { config, model, projector: PixelDriven::new(acquisition) })
    }

    pub fn acquisition(&self) -> &Acquisition { self.projector.acquisition() }

    pub fn run(&self) -> Result<Report> {
        let config = &self.config;
        let acquisition = self.acquisition();
        let projector = &self.projector;

        let phantom = timed("phantom",  || Ok(self.model.image(acquisition.size())))?;
        let ideal   = timed("sinogram", || Ok(self.model.sinogram(acquisition)))?;

        let (corrupted, clamped) = timed("artifacts", || self.corrupt(&ideal))?;
        let corrupts = config.corrupts();

        let fourier = timed("fourier", || fourier::fourier(&corrupted, acquisition, config.fourier.interpolation))?;

        let filter = config.fbp.filter;
        let fbp_ideal = timed("fbp ideal", || fbp::fbp(projector, &ideal, filter))?;
        let fbp_error = if corrupts { timed("fbp error", || fbp::fbp(projector, &corrupted, filter))? }
                        else        { fbp_ideal.clone() };

        let sirt_ideal = timed("sirt ideal", || sirt::sirt(projector, &ideal, config.sirt))?;
        let sirt_error = if corrupts { timed("sirt error", || sirt::sirt(projector, &corrupted, config.sirt))? }
                         else        { sirt_ideal.clone() };

        // One Lipschitz estimate serves both FISTA runs
        let unregularised = FistaOptions { regularisation: None, ..config.fista };
        let fista_plain = timed("fista", || Ok(Fista::new(projector, &corrupted, unregularised)?.run()))?;
        let lipschitz = fista_plain.lipschitz;
        info!(lipschitz, iterations = fista_plain.iterations, converged = fista_plain.converged, "FISTA");

        let fista_regularised = match config.fista.regularisation {
            None => None,
            Some(_) => {
                let options = FistaOptions { lipschitz: Some(lipschitz), ..config.fista };
                let outcome = timed("fista regularised", || Ok(Fista::new(projector, &corrupted, options)?.run()))?;
                info!(iterations = outcome.iterations, converged = outcome.converged, "regularised FISTA");
                Some(outcome.image)
            }
        };

        let fbp_difference  = fom::abs_difference(&fbp_ideal , &fbp_error )?;
        let sirt_difference = fom::abs_difference(&sirt_ideal, &sirt_error)?;
        let fbp_ratio  = fom::relative_error(&fbp_ideal , &fbp_error )?;
        let sirt_ratio = fom::relative_error(&sirt_ideal, &sirt_error)?;
        info!(fbp_ratio, sirt_ratio, "ideal vs corrupted reconstructions");

        let mut rmse = BTreeMap::new();
        let mut score = |name: &str, image: &Image| -> Result<()> {
            let value = fom::rmse(image, &phantom)?;
            info!(reconstruction = name, rmse = value, "against phantom");
            rmse.insert(name.to_string(), value);
            Ok(())
        };
        score("fourier"   , &fourier   )?;
        score("fbp_ideal" , &fbp_ideal )?;
        score("fbp_error" , &fbp_error )?;
        score("sirt_ideal", &sirt_ideal)?;
        score("sirt_error", &sirt_error)?;
        score("fista"     , &fista_plain.image)?;
        if let Some(image) = &fista_regularised { score("fista_regularised", image)?; }

        Ok(Report {
            model: self.model.id,
            seed: config.seed,
            acquisition: acquisition.clone(),
            clamped,
            lipschitz,
            phantom, ideal, corrupted,
            fourier, fbp_ideal, fbp_error, sirt_ideal, sirt_error,
            fista: fista_plain.image,
            fista_regularised,
            fbp_difference, sirt_difference,
            fbp_ratio, sirt_ratio,
            rmse,
        })
    }

    /// Noise, then zingers, then stripes, then negative readings clamped.
    /// Without any artifact configured the ideal sinogram passes through untouched.
    fn corrupt(&self, ideal: &Sinogram) -> Result<(Sinogram, usize)> {
        let config = &self.config;
        if !config.corrupts() { return Ok((ideal.clone(), 0)) }
        let mut artifacts = Artifacts::new(config.seed);
        let mut sinogram = ideal.clone();
        if let Some(noise)   = config.noise   { sinogram = artifacts.noise  (&sinogram, noise  )?; }
        if let Some(zingers) = config.zingers { sinogram = artifacts.zingers(&sinogram, zingers)?; }
        if let Some(stripes) = config.stripes { sinogram = artifacts.stripes(&sinogram, stripes)?; }
        let clamped = sinogram.clamp_negative();
        if clamped > 0 {
            warn!(clamped, "negative readings in corrupted sinogram set to zero");
        }
        Ok((sinogram, clamped))
    }
}

// ----- Writing a report to disk ------------------------------------------------------------

#[derive(Serialize)]
struct Summary<'a> {
    model: u32,
    size: usize,
    angles: usize,
    detectors: usize,
    seed: Option<u64>,
    clamped: usize,
    lipschitz: f32,
    fbp_ratio: f32,
    sirt_ratio: f32,
    format: Format,
    rmse: &'a BTreeMap<String, f32>,
    arrays: BTreeMap<&'a str, ArrayEntry>,
}

#[derive(Serialize)]
struct ArrayEntry {
    file: String,
    shape: [usize; 2],
}

impl Report {

    /// Every array in the report, by name
    pub fn arrays(&self) -> Vec<(&'static str, &ndarray::Array2<f32>)> {
        let mut arrays = vec![
            ("phantom"        , &self.phantom.data),
            ("sinogram_ideal" , &self.ideal.data),
            ("sinogram_error" , &self.corrupted.data),
            ("fourier"        , &self.fourier.data),
            ("fbp_ideal"      , &self.fbp_ideal.data),
            ("fbp_error"      , &self.fbp_error.data),
            ("fbp_difference" , &self.fbp_difference.data),
            ("sirt_ideal"     , &self.sirt_ideal.data),
            ("sirt_error"     , &self.sirt_error.data),
            ("sirt_difference", &self.sirt_difference.data),
            ("fista"          , &self.fista.data),
        ];
        if let Some(image) = &self.fista_regularised {
            arrays.push(("fista_regularised", &image.data));
        }
        arrays
    }

    /// Write every array to `dir` in `format`, plus a `report.toml` summary.
    /// Returns the path of the summary.
    pub fn write(&self, dir: &Path, format: Format) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(Error::io(dir))?;
        let mut entries = BTreeMap::new();
        for (name, data) in self.arrays() {
            let path = write_array(dir, name, data, format)?;
            let file = path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
            let (rows, cols) = data.dim();
            entries.insert(name, ArrayEntry { file, shape: [rows, cols] });
        }
        let summary = Summary {
            model: self.model,
            size: self.acquisition.size(),
            angles: self.acquisition.n_angles(),
            detectors: self.acquisition.detectors(),
            seed: self.seed,
            clamped: self.clamped,
            lipschitz: self.lipschitz,
            fbp_ratio: self.fbp_ratio,
            sirt_ratio: self.sirt_ratio,
            format,
            rmse: &self.rmse,
            arrays: entries,
        };
        let path = dir.join("report.toml");
        std::fs::write(&path, toml::to_string(&summary)?).map_err(Error::io(&path))?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{Noise, Zingers};
    use crate::fista::FistaOptions;
    use crate::sirt::SirtOptions;

    fn small(noise: Option<Noise>) -> Config {
        Config {
            size: 24,
            seed: Some(3),
            noise,
            zingers: noise.map(|_| Zingers { percentage: 1.0, modulus: 2 }),
            sirt: SirtOptions { iterations: 10, nonnegative: false },
            fista: FistaOptions { iterations: 10, ..FistaOptions::default() },
            ..toml::from_str("").unwrap()
        }
    }

    #[test]
    fn clean_run_has_zero_ratios() {
        let report = Pipeline::new(small(None)).unwrap().run().unwrap();
        assert_eq!(report.fbp_ratio, 0.0);
        assert_eq!(report.sirt_ratio, 0.0);
        assert_eq!(report.clamped, 0);
        assert_eq!(report.ideal, report.corrupted);
        assert!(report.fista_regularised.is_none());
    }

    #[test]
    fn artifacts_raise_the_ratios() {
        let report = Pipeline::new(small(Some(Noise::Gaussian { sigma: 0.05 }))).unwrap().run().unwrap();
        assert!(report.fbp_ratio > 0.0);
        assert!(report.sirt_ratio > 0.0);
        assert!(report.corrupted.data.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn report_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let report = Pipeline::new(small(None)).unwrap().run().unwrap();
        let summary = report.write(dir.path(), Format::Raw).unwrap();
        let text = std::fs::read_to_string(summary).unwrap();
        let parsed: toml::Value = toml::from_str(&text).unwrap();
        assert_eq!(parsed["size"].as_integer(), Some(24));
        assert_eq!(parsed["arrays"]["phantom"]["file"].as_str(), Some("phantom.raw"));
        for (name, _) in report.arrays() {
            assert!(dir.path().join(format!("{name}.raw")).exists(), "{name} missing");
        }
    }

    #[test]
    fn unknown_model_fails_early() {
        let config = Config { model: 99, ..small(None) };
        assert!(matches!(Pipeline::new(config), Err(Error::ModelNotFound(99))));
    }
}
