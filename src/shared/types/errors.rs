use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Any business-rule violation raised by the core.
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Event handler for {event_type} failed: {message}")]
    EventHandler {
        event_type: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// The rejection produced both by the overlap rule and by a store that
    /// refuses a conflicting insert.
    pub fn overlap(vehicle_id: impl std::fmt::Display) -> Self {
        Self::Validation(format!(
            "overlap: vehicle {} is already booked for the requested time range",
            vehicle_id
        ))
    }

    pub fn is_overlap(&self) -> bool {
        matches!(self, Self::Validation(msg) if msg.starts_with("overlap"))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this error is likely transient (e.g. the store was briefly
    /// unreachable) and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
