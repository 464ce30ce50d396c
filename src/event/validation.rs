use super::EventType;
use std::fmt;

/// Validation errors for EventType
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingId,
    InvalidId(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingId => write!(f, "event type id is required"),
            ValidationError::InvalidId(id) => {
                write!(f, "invalid event type id '{}': must be a dotted class name", id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates an event type before it is registered.
///
/// The id names a server-side event class, so it must be non-empty and made
/// of dot-separated identifier segments (letters, digits, `_`, `$`).
/// Params are not checked; the server matches them against constructor
/// parameter names.
pub fn validate_event_type(event_type: &EventType) -> Result<(), ValidationError> {
    if event_type.id.is_empty() {
        return Err(ValidationError::MissingId);
    }

    if !is_valid_class_name(&event_type.id) {
        return Err(ValidationError::InvalidId(event_type.id.clone()));
    }

    Ok(())
}

fn is_valid_class_name(id: &str) -> bool {
    id.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            }
            _ => false,
        }
    })
}
