pub mod config;
pub mod dispatcher;
pub mod error;
pub mod pattern;
pub mod types;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

/// Type for listener registration identifiers
pub type EventId = u64;

/// Error a listener body may surface; routed to the logger, never to the dispatch caller
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one listener invocation
pub type ListenerOutput = Result<Option<serde_json::Value>, ListenerError>;

/// This type represents an owned future that returns ListenerOutput
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ListenerOutput> + Send + 'a>>;

/// Core event trait
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Get the name of this event
    fn name(&self) -> &str;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Cast to mutable Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Asynchronous listener trait
#[async_trait]
pub trait AsyncListener: Send + Sync {
    async fn invoke(&self, event: &dyn Event) -> ListenerOutput;
}

/// Re-export important types
pub use config::{DispatchOrdering, DispatcherConfig};
pub use dispatcher::{
    EventDispatcher, SharedEventDispatcher, async_listener, create_dispatcher, sync_listener,
};
pub use error::EventSystemError;
pub use pattern::WildcardPattern;
pub use types::{ListenerInfo, NamedEvent};

// Test module declaration
#[cfg(test)]
mod tests;
