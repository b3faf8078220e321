//! Diagnostic score plots.
//!
//! [`TextBarChart`] draws one bar per metric on a fixed `[0, 1]` axis with a
//! whisker spanning `mean ± 2·std`:
//!
//! ```text
//! Results RandomForest (CP07)
//! F1       |██████████████████▕━━━━━┃━━━━━▏            | 0.712 ± 0.041
//! ROCAUC   |████████████████████████▕━━┃━━▏            | 0.801 ± 0.022
//! ```

use crate::error::{EvalError, Result};
use std::io::Write;

/// Renders mean scores with error bars.
pub trait ScorePlotter {
    fn plot(&mut self, title: &str, names: &[&str], means: &[f64], stds: &[f64]) -> Result<()>;
}

/// Plain-text bar chart written to any `Write`.
#[derive(Debug)]
pub struct TextBarChart<W: Write> {
    out: W,
    width: usize,
}

impl<W: Write> TextBarChart<W> {
    /// Chart with a 40-column axis.
    pub fn new(out: W) -> Self {
        Self { out, width: 40 }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(10);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn column(&self, value: f64) -> usize {
        (value.clamp(0.0, 1.0) * self.width as f64).round() as usize
    }

    fn bar(&self, mean: f64, std: f64) -> String {
        let end = self.column(mean);
        let lo = self.column(mean - 2.0 * std);
        let hi = self.column(mean + 2.0 * std);
        (0..self.width)
            .map(|c| match c {
                c if c == end && std > 0.0 => '┃',
                c if c >= lo && c < hi && std > 0.0 => '━',
                c if c < end => '█',
                _ => ' ',
            })
            .collect()
    }
}

impl<W: Write> ScorePlotter for TextBarChart<W> {
    fn plot(&mut self, title: &str, names: &[&str], means: &[f64], stds: &[f64]) -> Result<()> {
        if names.len() != means.len() || means.len() != stds.len() {
            return Err(EvalError::data(format!(
                "plot needs one mean and std per name ({} names, {} means, {} stds)",
                names.len(),
                means.len(),
                stds.len()
            )));
        }
        let label_width = names.iter().map(|n| n.len()).max().unwrap_or(0);

        writeln!(self.out, "{title}")?;
        for ((name, &mean), &std) in names.iter().zip(means).zip(stds) {
            let bar = self.bar(mean, std);
            writeln!(
                self.out,
                "{name:<label_width$} |{bar}| {mean:.3} ± {std:.3}"
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}
