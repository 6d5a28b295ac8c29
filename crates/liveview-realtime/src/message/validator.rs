//! Message validation rules.

use liveview_core::error::AppError;

/// Maximum allowed inbound message size in bytes.
///
/// The only meaningful inbound message is a ping, so this is small.
pub const MAX_MESSAGE_SIZE: usize = 4_096;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {MAX_MESSAGE_SIZE} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}
