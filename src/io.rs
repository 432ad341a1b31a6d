pub mod raw;

use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// On-disk representation of output arrays
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// NumPy `.npy`, shape included
    #[default]
    Npy,
    /// Bare little-endian `f32`, row-major; shape recorded in the report
    Raw,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self { Format::Npy => "npy", Format::Raw => "raw" }
    }
}

impl std::str::FromStr for Format {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "npy" => Ok(Format::Npy),
            "raw" => Ok(Format::Raw),
            _ => Err(Error::invalid(format!("unknown output format `{s}` (expected npy or raw)"))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.extension()) }
}

/// Write `data` to `dir/name.<ext>`, returning the full path
pub fn write_array(dir: &Path, name: &str, data: &Array2<f32>, format: Format) -> Result<PathBuf> {
    let path = dir.join(name).with_extension(format.extension());
    match format {
        Format::Npy => ndarray_npy::write_npy(&path, data)
            .map_err(|source| Error::Npy { path: path.clone(), source })?,
        Format::Raw => raw::write(data.iter().copied(), &path)?,
    }
    tracing::debug!(path = %path.display(), shape = ?data.dim(), "wrote array");
    Ok(path)
}
