use std::path::PathBuf;

/// Everything that can go wrong between reading a model library and writing
/// reconstructions to disk.
#[derive(Debug, thiserror::Error)]
pub enum Error {

    #[error("cannot access `{}`: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("phantom library, line {line}: {message}")]
    Library { line: usize, message: String },

    #[error("model {0} not found in phantom library")]
    ModelNotFound(u32),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    Shape { expected: (usize, usize), found: (usize, usize) },

    #[error("configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot serialize report: {0}")]
    Report(#[from] toml::ser::Error),

    #[error("cannot write `{}`: {source}", path.display())]
    Npy { path: PathBuf, source: ndarray_npy::WriteNpyError },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParameter(message.into())
    }
}
