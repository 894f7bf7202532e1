//! Correlation Module
//! Pairwise Pearson correlation over indicator and categorical columns.

use crate::data::schema::{self, SchemaError};
use crate::data::Dataset;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Square, symmetric correlation table at full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Requested columns absent from the dataset.
    pub skipped: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Undefined pairs (zero variance or too few overlapping rows) are NaN.
    pub fn is_defined(&self, i: usize, j: usize) -> bool {
        !self.values[i][j].is_nan()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Copy rounded to `decimals` places for display.
    pub fn rounded(&self, decimals: i32) -> Vec<Vec<f64>> {
        let factor = 10f64.powi(decimals);
        self.values
            .iter()
            .map(|row| row.iter().map(|v| (v * factor).round() / factor).collect())
            .collect()
    }
}

/// Computes correlation matrices with multi-threading support.
pub struct CorrelationCalculator;

impl CorrelationCalculator {
    /// Pearson correlation over the full dataset. Absent columns are
    /// skipped and recorded; fewer than two present columns is an error.
    pub fn compute(dataset: &Dataset, columns: &[String]) -> Result<CorrelationMatrix, SchemaError> {
        let df = dataset.frame();
        let skipped = schema::missing_columns(df, columns);
        let present: Vec<String> = columns
            .iter()
            .filter(|c| !skipped.contains(c))
            .cloned()
            .collect();

        if !skipped.is_empty() {
            log::warn!("Correlation skipping missing columns: {}", skipped.join(", "));
        }
        if present.len() < 2 {
            return Err(SchemaError::InsufficientColumns {
                context: "correlation".to_string(),
                required: 2,
                found: present.len(),
            });
        }

        let data = present
            .iter()
            .map(|c| schema::float_values(df, c, "correlation"))
            .collect::<Result<Vec<_>, _>>()?;

        let n = present.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();

        // Use rayon for parallel computation
        let upper: Vec<((usize, usize), f64)> = pairs
            .par_iter()
            .map(|&(i, j)| ((i, j), Self::pearson(&data[i], &data[j])))
            .collect();

        let mut values = vec![vec![1.0; n]; n];
        for ((i, j), r) in upper {
            values[i][j] = r;
            values[j][i] = r;
        }

        Ok(CorrelationMatrix {
            columns: present,
            skipped,
            values,
        })
    }

    /// Pearson r over rows where both values are present.
    pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
        let (x, y): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(ys)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .unzip();

        if x.len() < 2 {
            return f64::NAN;
        }

        let sx = x.iter().std_dev();
        let sy = y.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return f64::NAN;
        }

        let cov = x.iter().covariance(y.iter());
        (cov / (sx * sy)).clamp(-1.0, 1.0)
    }
}
