use crate::api::error::AppError;
use uuid::Uuid;

/// Validates a record id taken from a path or query parameter.
///
/// Ids are UUID strings; anything else is rejected before touching the
/// database. `what` names the record in the error message ("video", ...).
pub fn parse_id(raw: &str, what: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::InvalidArgument(format!("Invalid {} ID", what)))
}

/// Generates a new time-ordered record id.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Trims required free-text input, rejecting empty strings.
pub fn require_text(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::InvalidArgument(format!("{} is required", field))),
    }
}

/// Canonical form of a username or email, as stored and looked up.
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}
