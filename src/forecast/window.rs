//! Truncating series to the feature window.

use crate::error::{EvalError, Result};
use ndarray::{s, Array3, ArrayView3};

/// Keep days `[0, cutoff)` of every series.
///
/// # Errors
///
/// Configuration error if `cutoff` is zero or longer than the series.
pub fn cutoff_for_prediction(raw: ArrayView3<f64>, cutoff: usize) -> Result<Array3<f64>> {
    let n_days = raw.dim().2;
    if cutoff == 0 || cutoff > n_days {
        return Err(EvalError::config(format!(
            "cutoff point {cutoff} outside the {n_days}-day series"
        )));
    }
    Ok(raw.slice(s![.., .., ..cutoff]).to_owned())
}
