//! The price model: a fitted linear-regression pipeline read from a JSON artifact.
//!
//! The artifact lists the one-hot encoded columns with their fitted
//! categories, the numeric pass-through columns, one coefficient per encoded
//! feature and the intercept. Encoding follows the column order in the file.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::car::{CarRow, json_kind};

pub type SharedModel = Arc<dyn PriceModel>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Schema(String),

    #[error("Found unknown categories [{value}] in column {column} during transform")]
    UnknownCategory { value: String, column: usize },

    #[error("Input contains NaN")]
    ContainsNan,

    #[error("Input contains infinity or a value too large for dtype('float64').")]
    ContainsInfinity,

    #[error("could not convert string to float: '{0}'")]
    NotANumber(String),

    #[error("column '{column}' holds a JSON {kind}, expected a scalar")]
    UnsupportedValue { column: String, kind: &'static str },
}

/// Anything that can price a batch of rows. One output per input row.
pub trait PriceModel: Send + Sync + 'static {
    fn predict(&self, rows: &[CarRow]) -> Result<Vec<f64>, ModelError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearPipeline {
    pub categorical: Vec<CategoricalColumn>,
    pub numeric: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl LinearPipeline {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let pipeline: Self = serde_json::from_slice(bytes)?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Width of the encoded feature vector.
    pub fn feature_count(&self) -> usize {
        self.categorical.iter().map(|c| c.categories.len()).sum::<usize>() + self.numeric.len()
    }

    fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        let columns = self
            .categorical
            .iter()
            .map(|c| c.column.as_str())
            .chain(self.numeric.iter().map(String::as_str));
        for column in columns {
            if !CarRow::COLUMNS.contains(&column) {
                return Err(ModelError::Schema(format!("unknown column '{column}'")));
            }
            if !seen.insert(column) {
                return Err(ModelError::Schema(format!("column '{column}' is listed twice")));
            }
        }
        if self.coefficients.len() != self.feature_count() {
            return Err(ModelError::Schema(format!(
                "expected {} coefficients, found {}",
                self.feature_count(),
                self.coefficients.len()
            )));
        }
        Ok(())
    }

    /// Encode one row into the feature vector the coefficients were fitted on.
    pub fn encode(&self, row: &CarRow) -> Result<Vec<f64>, ModelError> {
        let mut features = Vec::with_capacity(self.feature_count());

        for (index, encoder) in self.categorical.iter().enumerate() {
            let cell = row.get(&encoder.column).unwrap_or(&Value::Null);
            if matches!(cell, Value::Array(_) | Value::Object(_)) {
                return Err(ModelError::UnsupportedValue {
                    column: encoder.column.clone(),
                    kind: json_kind(cell),
                });
            }
            let position = cell
                .as_str()
                .and_then(|value| encoder.categories.iter().position(|c| c == value));
            if position.is_none() && self.handle_unknown == HandleUnknown::Error {
                return Err(ModelError::UnknownCategory {
                    value: category_label(cell),
                    column: index,
                });
            }
            features.extend((0..encoder.categories.len()).map(|i| {
                if Some(i) == position { 1.0 } else { 0.0 }
            }));
        }

        for column in &self.numeric {
            let cell = row.get(column).unwrap_or(&Value::Null);
            features.push(to_float(column, cell)?);
        }

        Ok(features)
    }

    fn predict_row(&self, row: &CarRow) -> Result<f64, ModelError> {
        let features = self.encode(row)?;
        let dot: f64 = features
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum();
        Ok(self.intercept + dot)
    }
}

impl PriceModel for LinearPipeline {
    fn predict(&self, rows: &[CarRow]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Read the artifact once at startup and wrap it for sharing between handlers.
pub fn load_model(path: impl AsRef<Path>) -> Result<SharedModel, ModelError> {
    let path = path.as_ref();
    let pipeline = LinearPipeline::from_path(path)?;
    info!(
        path = %path.display(),
        features = pipeline.feature_count(),
        "Model loaded"
    );
    for encoder in &pipeline.categorical {
        debug!(column = %encoder.column, categories = encoder.categories.len(), "One-hot column");
    }
    Ok(Arc::new(pipeline))
}

fn to_float(column: &str, cell: &Value) -> Result<f64, ModelError> {
    let value = match cell {
        Value::Null => return Err(ModelError::ContainsNan),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().ok_or(ModelError::ContainsInfinity)?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ModelError::NotANumber(s.clone()))?,
        Value::Array(_) | Value::Object(_) => {
            return Err(ModelError::UnsupportedValue {
                column: column.to_string(),
                kind: json_kind(cell),
            });
        }
    };
    if value.is_nan() {
        return Err(ModelError::ContainsNan);
    }
    if value.is_infinite() {
        return Err(ModelError::ContainsInfinity);
    }
    Ok(value)
}

fn category_label(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}
