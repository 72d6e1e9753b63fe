//! Route Handlers
//!
//! One module per surface: operator parameter updates, dashboard
//! telemetry reads, history export, the device endpoints, and the thin
//! login wrapper.

pub mod device;
pub mod export;
pub mod params;
pub mod session;
pub mod telemetry;

use serde::Serialize;
use serde_json::Value;
use storage::ValidationError;

/// Simple `{message}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Pull a numeric field out of a JSON body, accepting either a number or
/// a numeric string. The dashboard form posts strings; the device posts
/// numbers. Anything else is a validation error, reported per field.
pub(crate) fn numeric_field(body: &Value, field: &'static str) -> Result<f64, ValidationError> {
    let value = body.get(field).ok_or(ValidationError::Missing { field })?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or(ValidationError::NotNumeric { field })
}
