//! Raw data access.
//!
//! The evaluation code never touches files directly: it asks a [`DataSource`]
//! for named arrays. Two accessors ship with the crate:
//!
//! - [`NpyDataSource`]: one `.npy` file per variable inside a dataset directory
//! - [`InMemoryDataSource`]: a keyed map, for tests and embedding
//!
//! # Array Conventions
//!
//! | Accessor | Shape | Axes |
//! |----------|-------|------|
//! | `get_data_for_variable` | `[N, D]` | sample, day |
//! | `get_data_for_variables` | `[N, V, D]` | sample, variable, day |
//!
//! All variables of one dataset must share `N` and `D`.

mod npy;

pub use npy::NpyDataSource;

use crate::error::{EvalError, Result};
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Raw per-variable daily series, axes (sample, variable, day).
pub type RawSeriesTensor = Array3<f64>;

/// Raw per-day label series, axes (sample, day).
pub type RawLabelTensor = Array2<f64>;

// ============================================================================
// Keys
// ============================================================================

/// Atmospheric variables used as classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Polar-cap temperature, 60-90°N
    #[serde(rename = "temp_60_90")]
    Temp60To90,
    /// Zonal-mean zonal wind at 60°N
    #[serde(rename = "wind_60")]
    Wind60,
    /// Zonal-mean zonal wind at 65°N
    #[serde(rename = "wind_65")]
    Wind65,
}

impl Variable {
    /// The default input variables, in feature order.
    pub const DEFAULT: [Variable; 3] = [Variable::Temp60To90, Variable::Wind60, Variable::Wind65];

    /// Dataset key of this variable.
    pub fn key(&self) -> &'static str {
        match self {
            Variable::Temp60To90 => "temp_60_90",
            Variable::Wind60 => "wind_60",
            Variable::Wind65 => "wind_65",
        }
    }

    /// Keys of a variable list, preserving order.
    pub fn keys(variables: &[Variable]) -> Vec<String> {
        variables.iter().map(|v| v.key().to_string()).collect()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Event definitions whose per-day labels are stored alongside the variables.
///
/// How a definition turns into daily labels is decided upstream; this crate
/// only reads the resulting label series by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Definition {
    #[serde(rename = "CP07")]
    Cp07,
    #[serde(rename = "U&T")]
    UAndT,
    #[serde(rename = "U65")]
    U65,
    #[serde(rename = "ZPOL_temp")]
    ZPolTemp,
}

impl Definition {
    /// Dataset key of this definition's label series.
    pub fn key(&self) -> &'static str {
        match self {
            Definition::Cp07 => "CP07",
            Definition::UAndT => "U&T",
            Definition::U65 => "U65",
            Definition::ZPolTemp => "ZPOL_temp",
        }
    }

    /// Parse a definition key (case-sensitive, as stored in datasets).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "CP07" => Some(Definition::Cp07),
            "U&T" | "UT" => Some(Definition::UAndT),
            "U65" => Some(Definition::U65),
            "ZPOL_temp" => Some(Definition::ZPolTemp),
            _ => None,
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Definition {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        Definition::from_key(s)
            .ok_or_else(|| EvalError::config(format!("unknown definition '{s}'")))
    }
}

// ============================================================================
// Accessor
// ============================================================================

/// Read-only accessor for named arrays of one dataset.
///
/// Implementations are assumed deterministic: asking twice for the same key
/// returns the same array.
pub trait DataSource {
    /// Fetch one variable (or label series) as `[N, D]`.
    fn get_data_for_variable(&self, name: &str) -> Result<Array2<f64>>;

    /// Fetch several variables stacked as `[N, V, D]`, in the order given.
    fn get_data_for_variables(&self, names: &[&str]) -> Result<RawSeriesTensor> {
        let arrays = names
            .iter()
            .map(|name| self.get_data_for_variable(name))
            .collect::<Result<Vec<_>>>()?;
        stack_variables(names, &arrays)
    }
}

/// Stack per-variable `[N, D]` arrays into a `[N, V, D]` tensor.
pub fn stack_variables(names: &[&str], arrays: &[Array2<f64>]) -> Result<RawSeriesTensor> {
    let first = arrays
        .first()
        .ok_or_else(|| EvalError::config("at least one variable is required"))?;
    let (n_samples, n_days) = first.dim();

    for (name, array) in names.iter().zip(arrays) {
        if array.dim() != (n_samples, n_days) {
            return Err(EvalError::data(format!(
                "variable '{name}' has shape {:?}, expected ({n_samples}, {n_days})",
                array.dim()
            )));
        }
    }

    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    Ok(ndarray::stack(Axis(1), &views)?)
}

/// Keyed in-memory dataset.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    arrays: HashMap<String, Array2<f64>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an array under `name`.
    pub fn with_array(mut self, name: &str, array: Array2<f64>) -> Self {
        self.arrays.insert(name.to_string(), array);
        self
    }

    pub fn insert(&mut self, name: &str, array: Array2<f64>) {
        self.arrays.insert(name.to_string(), array);
    }
}

impl DataSource for InMemoryDataSource {
    fn get_data_for_variable(&self, name: &str) -> Result<Array2<f64>> {
        self.arrays
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::config(format!("dataset has no array named '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_stack_variables_order() {
        let source = InMemoryDataSource::new()
            .with_array("a", array![[1.0, 2.0], [3.0, 4.0]])
            .with_array("b", array![[5.0, 6.0], [7.0, 8.0]]);

        let tensor = source.get_data_for_variables(&["b", "a"]).unwrap();
        assert_eq!(tensor.dim(), (2, 2, 2));
        assert_eq!(tensor[[0, 0, 0]], 5.0);
        assert_eq!(tensor[[0, 1, 0]], 1.0);
        assert_eq!(tensor[[1, 1, 1]], 4.0);
    }

    #[test]
    fn test_stack_variables_shape_mismatch() {
        let source = InMemoryDataSource::new()
            .with_array("a", array![[1.0, 2.0]])
            .with_array("b", array![[1.0, 2.0, 3.0]]);

        let err = source.get_data_for_variables(&["a", "b"]).unwrap_err();
        assert!(matches!(err, EvalError::Data(_)));
    }

    #[test]
    fn test_missing_array_is_config_error() {
        let source = InMemoryDataSource::new();
        assert!(source.get_data_for_variable("CP07").unwrap_err().is_config());
    }

    #[test]
    fn test_definition_keys() {
        for def in [
            Definition::Cp07,
            Definition::UAndT,
            Definition::U65,
            Definition::ZPolTemp,
        ] {
            assert_eq!(Definition::from_key(def.key()), Some(def));
        }
        assert_eq!("UT".parse::<Definition>().unwrap(), Definition::UAndT);
        assert!("SSW".parse::<Definition>().is_err());
    }

    #[test]
    fn test_default_variable_keys() {
        assert_eq!(
            Variable::keys(&Variable::DEFAULT),
            vec!["temp_60_90", "wind_60", "wind_65"]
        );
    }
}
