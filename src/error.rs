//! # Herald Event System Errors
//!
//! Defines error types specific to the event system.
//!
//! [`EventSystemError`] covers failures surfaced by individual listeners
//! during dispatch (which are logged, never propagated to the dispatch
//! caller) and configuration parsing problems.
use crate::EventId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventSystemError {
    #[error("Listener {id} failed while handling '{event_name}': {reason}")]
    ListenerFailed {
        event_name: String,
        id: EventId,
        reason: String,
    },

    #[error("Listener {id} panicked while handling '{event_name}'")]
    ListenerPanicked { event_name: String, id: EventId },

    #[cfg(feature = "toml-config")]
    #[error("Failed to parse dispatcher configuration: {details}")]
    ConfigFormat { details: String },
}
