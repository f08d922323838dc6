//! Handler Errors

use crate::domain::OutboundEvent;

/// Outcome of one handler: the event to publish, if any
pub type HandlerResult = Result<Option<OutboundEvent>, HandlerError>;

/// Errors that stop a handler before it reaches the store
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The payload lacks a field the handler needs
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The payload does not have the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
