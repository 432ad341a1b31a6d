//! Read / write float arrays as raw little-endian binary

use std::fs::File;
use std::io::{Write, Read, BufWriter, BufReader};
use std::path::Path;

use ndarray::Array2;

use crate::{Error, Result};

pub fn write(data: impl Iterator<Item = f32>, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(Error::io(path))?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes()).map_err(Error::io(path))?;
    }
    buf.flush().map_err(Error::io(path))
}

pub fn read(path: &Path) -> Result<impl Iterator<Item = Result<f32>> + '_> {
    let file = File::open(path).map_err(Error::io(path))?;
    let mut buf = BufReader::new(file);
    let mut buffer = [0; 4];

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::UnexpectedEof;
        match buf.read_exact(&mut buffer) {
            Ok(()) => Some(Ok(f32::from_le_bytes(buffer))),
            Err(e) if e.kind() == UnexpectedEof => None,
            Err(e) => Some(Err(Error::io(path)(e))),
        }
    }))
}

/// Read a row-major array of known shape
pub fn read_array(path: &Path, dim: (usize, usize)) -> Result<Array2<f32>> {
    let data: Vec<f32> = read(path)?.collect::<Result<_>>()?;
    let found = data.len();
    Array2::from_shape_vec(dim, data)
        .map_err(|_| Error::Shape { expected: dim, found: (found, 1) })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raw_io_roundtrip() -> Result<()> {
        use tempfile::tempdir;
        #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

        let dir = tempdir().map_err(Error::io("tempdir"))?;
        let file_path = dir.path().join("test.raw");

        let original = ndarray::arr2(&[[1.23, 4.56, 7.89], [0.0, -1.0, 2.5]]);
        write(original.iter().copied(), &file_path)?;

        let reloaded = read_array(&file_path, (2, 3))?;
        assert_eq!(original, reloaded);
        assert!(read_array(&file_path, (4, 4)).is_err());
        Ok(())
    }
}
