use axum::{Json, Router, body::Bytes, debug_handler, extract::State, routing::get, routing::post};
use serde_json::{Map, Value, json};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::car::{PredictionRequest, PredictionResponse, json_kind, round_price};
use crate::error::ApiError;
use crate::model::SharedModel;

#[debug_handler]
pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Car Price Prediction API is Running!" }))
}

// Body is read as raw bytes so a missing or wrong Content-Type still gets parsed as JSON
#[debug_handler]
pub async fn predict(
    State(model): State<SharedModel>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let data = read_input(&body)?;
    debug!(%request_id, fields = data.len(), "Prediction request received");

    let row = PredictionRequest::from_object(&data).into_row();
    let raw = model
        .predict(std::slice::from_ref(&row))?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Processing("model returned no prediction".to_string()))?;
    let predicted_price = round_price(raw)?;

    info!(%request_id, %predicted_price, "Prediction served");
    Ok(Json(PredictionResponse {
        predicted_price,
        car_details: data,
    }))
}

/// Parse the body into a JSON object.
///
/// A blank body and the empty JSON values (`null`, `false`, `0`, `""`, `[]`)
/// count as no input. An object is always input, even `{}`: unlike the other
/// empty values it is let through and reaches the model as an all-null row.
fn read_input(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::NoInput);
    }
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(data) => Ok(data),
        other if is_empty_value(&other) => Err(ApiError::NoInput),
        other => Err(ApiError::Processing(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

pub fn create_app(model: SharedModel) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(model)
}
