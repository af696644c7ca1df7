//! Client-side request validation, run before any network call.

use crate::error::DeckError;

/// A create or update payload that can be checked locally.
pub trait Validate {
    fn validate(&self) -> Result<(), DeckError>;
}

/// Reject a missing or whitespace-only required field.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), DeckError> {
    if value.trim().is_empty() {
        return Err(DeckError::validation(field, "is required"));
    }
    Ok(())
}

/// Reject a present-but-blank optional field (a partial update may omit it).
pub fn reject_blank(field: &str, value: Option<&str>) -> Result<(), DeckError> {
    match value {
        Some(v) => require_non_blank(field, v),
        None => Ok(()),
    }
}

/// Sampling temperature must lie in `0.0..=2.0`.
pub fn check_temperature(value: Option<f64>) -> Result<(), DeckError> {
    match value {
        Some(t) if !(0.0..=2.0).contains(&t) => Err(DeckError::validation(
            "temperature",
            format!("must be between 0 and 2, got {t}"),
        )),
        _ => Ok(()),
    }
}

/// A tool parameter schema must be a JSON object, and an object schema when
/// it declares a type.
pub fn check_parameter_schema(schema: Option<&serde_json::Value>) -> Result<(), DeckError> {
    let Some(schema) = schema else {
        return Ok(());
    };
    let Some(obj) = schema.as_object() else {
        return Err(DeckError::validation("parameters", "must be a JSON object"));
    };
    match obj.get("type").and_then(|t| t.as_str()) {
        Some("object") | None => Ok(()),
        Some(other) => Err(DeckError::validation(
            "parameters",
            format!("schema type must be 'object', got '{other}'"),
        )),
    }
}
