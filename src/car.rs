use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::ApiError;

//Define the datastructures for a car price request, the row the model consumes and the replies

/// Body of `POST /predict`.
///
/// Every field is optional and kept as raw JSON: missing keys and explicit
/// nulls both end up as `None`, and no type checks happen here. Whatever the
/// caller sent is handed to the model as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRequest {
    pub car_name: Option<Value>,
    pub model: Option<Value>,
    pub year: Option<Value>,
    pub kms_driven: Option<Value>,
    pub fuel_type: Option<Value>,
}

impl PredictionRequest {
    /// Pull the known fields out of a parsed JSON object. Unknown keys are ignored.
    pub fn from_object(data: &Map<String, Value>) -> Self {
        let field = |key: &str| data.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            car_name: field("car_name"),
            model: field("model"),
            year: field("year"),
            kms_driven: field("kms_driven"),
            fuel_type: field("fuel_type"),
        }
    }

    /// Rename the request fields to the column names the model was fitted on.
    pub fn into_row(self) -> CarRow {
        CarRow {
            company: self.car_name.unwrap_or(Value::Null),
            name: self.model.unwrap_or(Value::Null),
            year: self.year.unwrap_or(Value::Null),
            kms_driven: self.kms_driven.unwrap_or(Value::Null),
            fuel_type: self.fuel_type.unwrap_or(Value::Null),
        }
    }
}

/// One record in the model's column schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarRow {
    pub company: Value,
    pub name: Value,
    pub year: Value,
    pub kms_driven: Value,
    pub fuel_type: Value,
}

impl CarRow {
    pub const COLUMNS: [&'static str; 5] = ["company", "name", "year", "kms_driven", "fuel_type"];

    pub fn get(&self, column: &str) -> Option<&Value> {
        match column {
            "company" => Some(&self.company),
            "name" => Some(&self.name),
            "year" => Some(&self.year),
            "kms_driven" => Some(&self.kms_driven),
            "fuel_type" => Some(&self.fuel_type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predicted_price: Number,
    pub car_details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Bounds of i64 as f64; the upper one is exclusive since i64::MAX is not representable
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Round a raw model output to a whole price, halves going to the even neighbour.
///
/// Prices that fit in an `i64` come back as JSON integers. Anything wider stays
/// a whole-valued float instead of being clamped.
pub fn round_price(raw: f64) -> Result<Number, ApiError> {
    if raw.is_nan() {
        return Err(ApiError::Processing("cannot convert float NaN to integer".to_string()));
    }
    if raw.is_infinite() {
        return Err(ApiError::Processing("cannot convert float infinity to integer".to_string()));
    }
    let rounded = raw.round_ties_even();
    if (I64_LOWER..I64_UPPER).contains(&rounded) {
        return Ok(Number::from(rounded as i64));
    }
    Number::from_f64(rounded)
        .ok_or_else(|| ApiError::Processing(format!("cannot represent {rounded} as a JSON number")))
}

/// Name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
