use serde_json::Value;

/// Picks the most useful message out of an error response body.
///
/// Understands `{"error": ...}`, `{"message": ...}` and `{"detail": ...}`
/// bodies, where `detail` may be a string or a list of `{"msg": ...}`
/// validation items. Falls back to a message for the status code.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = message_from_json(&value) {
            return message;
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }

    default_message(status).to_string()
}

fn message_from_json(value: &Value) -> Option<String> {
    for field in ["error", "message"] {
        if let Some(text) = value.get(field).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    match value.get("detail")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

pub fn default_message(status: u16) -> &'static str {
    match status {
        400 => "The request was invalid",
        401 => "Your session has expired. Please sign in again",
        403 => "You do not have permission to perform this action",
        404 => "The requested resource was not found",
        408 => "The request timed out",
        409 => "The request conflicts with existing data",
        422 => "Some fields are invalid",
        500..=599 => "The server encountered an error. Please try again later",
        _ => "An unexpected error occurred",
    }
}
