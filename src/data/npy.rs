//! NumPy-backed dataset directories.
//!
//! A dataset is a directory holding one 2-D `.npy` array per key:
//!
//! ```text
//! data/labeled_simulated/
//! ├── temp_60_90.npy   [N, D]
//! ├── wind_60.npy      [N, D]
//! ├── wind_65.npy      [N, D]
//! ├── CP07.npy         [N, D]  per-day 0/1 labels
//! └── U_T.npy          [N, D]  ("U&T" with the ampersand sanitised)
//! ```

use super::DataSource;
use crate::error::{EvalError, Result};
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Dataset stored as a directory of `.npy` files.
#[derive(Debug, Clone)]
pub struct NpyDataSource {
    root: PathBuf,
}

impl NpyDataSource {
    /// Open a dataset directory.
    ///
    /// Fails with a missing-input configuration error if `root` is not a
    /// directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(EvalError::MissingInput(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that stores `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.npy", file_stem(name)))
    }
}

impl DataSource for NpyDataSource {
    fn get_data_for_variable(&self, name: &str) -> Result<Array2<f64>> {
        let path = self.path_for(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EvalError::MissingInput(path));
            }
            Err(e) => return Err(e.into()),
        };
        let array = Array2::<f64>::read_npy(BufReader::new(file))?;
        log::debug!("Loaded {} {:?} from {}", name, array.dim(), path.display());
        Ok(array)
    }
}

/// Map a dataset key to a portable file stem.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
