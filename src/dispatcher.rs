use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::config::{DispatchOrdering, DispatcherConfig};
use crate::error::EventSystemError;
use crate::pattern::WildcardPattern;
use crate::types::{ListenerInfo, NamedEvent};
use crate::{AsyncListener, BoxFuture, Event, EventId, ListenerOutput};

//--------------------------------------------------
// Listener storage
//--------------------------------------------------

/// Listener backed by a boxed closure (Internal Helper)
struct FnListener {
    handler: Box<dyn for<'a> Fn(&'a dyn Event) -> BoxFuture<'a> + Send + Sync>,
}
impl fmt::Debug for FnListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").finish_non_exhaustive()
    }
}
#[async_trait]
impl AsyncListener for FnListener {
    async fn invoke(&self, event: &dyn Event) -> ListenerOutput {
        (self.handler)(event).await
    }
}

/// One registration: identity, ordering data and the listener itself.
struct ListenerEntry {
    id: EventId,
    priority: i32,
    once: bool,
    fired: AtomicBool,
    listener: Box<dyn AsyncListener>,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("once", &self.once)
            .field("fired", &self.fired.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ListenerEntry {
    fn consumed(&self) -> bool {
        self.once && self.fired.load(Ordering::SeqCst)
    }
}

/// Insert preserving descending priority, registration order within ties.
fn insert_sorted(bucket: &mut Vec<Arc<ListenerEntry>>, entry: Arc<ListenerEntry>) {
    let pos = bucket.partition_point(|e| e.priority >= entry.priority);
    bucket.insert(pos, entry);
}

//--------------------------------------------------
// EventDispatcher (Internal, wrapped by SharedEventDispatcher)
//--------------------------------------------------

/// Event dispatcher registry (Internal Implementation)
pub struct EventDispatcher {
    exact: HashMap<String, Vec<Arc<ListenerEntry>>>,
    // Pattern registration order matters for the two-pass dispatch mode.
    wildcard: Vec<(WildcardPattern, Vec<Arc<ListenerEntry>>)>,
    next_id: EventId,
    config: DispatcherConfig,
}

// Manual Debug implementation for EventDispatcher
impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exact_count: usize = self.exact.values().map(|v| v.len()).sum();
        let wildcard_count: usize = self.wildcard.iter().map(|(_, v)| v.len()).sum();
        f.debug_struct("EventDispatcher")
            .field("exact_listeners_count", &exact_count)
            .field("wildcard_listeners_count", &wildcard_count)
            .field("next_id", &self.next_id)
            .field("ordering", &self.config.ordering)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            exact: HashMap::new(),
            wildcard: Vec::new(),
            next_id: 1,
            config,
        }
    }

    /// Register a listener under an exact event name or a `*` pattern.
    /// Returns the registration id accepted by [`remove_listener`](Self::remove_listener).
    pub fn listen(
        &mut self,
        name_or_pattern: &str,
        listener: Box<dyn AsyncListener>,
        priority: i32,
    ) -> EventId {
        self.register(name_or_pattern, listener, priority, false)
    }

    /// Like [`listen`](Self::listen), but the listener is invoked at most once
    /// in total and then removed from the registry.
    pub fn listen_once(
        &mut self,
        name_or_pattern: &str,
        listener: Box<dyn AsyncListener>,
        priority: i32,
    ) -> EventId {
        self.register(name_or_pattern, listener, priority, true)
    }

    fn register(
        &mut self,
        name_or_pattern: &str,
        listener: Box<dyn AsyncListener>,
        priority: i32,
        once: bool,
    ) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        let entry = Arc::new(ListenerEntry {
            id,
            priority,
            once,
            fired: AtomicBool::new(false),
            listener,
        });
        if WildcardPattern::is_pattern(name_or_pattern) {
            match self
                .wildcard
                .iter_mut()
                .find(|(p, _)| p.text() == name_or_pattern)
            {
                Some((_, bucket)) => insert_sorted(bucket, entry),
                None => {
                    let pattern = WildcardPattern::compile(name_or_pattern);
                    self.wildcard.push((pattern, vec![entry]));
                }
            }
        } else {
            insert_sorted(
                self.exact.entry(name_or_pattern.to_string()).or_default(),
                entry,
            );
        }
        id
    }

    /// Remove a registration by id; returns whether anything was removed.
    pub fn remove_listener(&mut self, id: EventId) -> bool {
        let mut found = false;
        self.exact.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|e| e.id != id);
            found |= bucket.len() < before;
            !bucket.is_empty()
        });
        self.wildcard.retain_mut(|(_, bucket)| {
            let before = bucket.len();
            bucket.retain(|e| e.id != id);
            found |= bucket.len() < before;
            !bucket.is_empty()
        });
        found
    }

    /// Clear the whole registry, or everything reachable from one name.
    ///
    /// With `Some(name)`: drops the exact bucket for `name`, any wildcard
    /// pattern with that exact text, and any wildcard pattern whose match-set
    /// includes `name`. Removing `"foo.bar"` therefore also drops a listener
    /// registered on `"foo.*"`.
    pub fn remove_all_listeners(&mut self, name_or_pattern: Option<&str>) {
        match name_or_pattern {
            None => {
                self.exact.clear();
                self.wildcard.clear();
            }
            Some(name) => {
                self.exact.remove(name);
                self.wildcard
                    .retain(|(p, _)| p.text() != name && !p.matches(name));
            }
        }
    }

    /// Snapshot the listeners that would run for `name`, in invocation order.
    fn matching(&self, name: &str) -> Vec<Arc<ListenerEntry>> {
        let mut snapshot: Vec<Arc<ListenerEntry>> = Vec::new();
        if let Some(bucket) = self.exact.get(name) {
            snapshot.extend(bucket.iter().cloned());
        }
        for (pattern, bucket) in &self.wildcard {
            if pattern.matches(name) {
                snapshot.extend(bucket.iter().cloned());
            }
        }
        if self.config.ordering == DispatchOrdering::GlobalPriority {
            // Ids are monotonic, so they double as the registration-order tiebreak.
            snapshot.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        }
        snapshot
    }

    /// Drop once-listeners that have already fired.
    fn prune_fired(&mut self) {
        self.exact.retain(|_, bucket| {
            bucket.retain(|e| !e.consumed());
            !bucket.is_empty()
        });
        self.wildcard.retain_mut(|(_, bucket)| {
            bucket.retain(|e| !e.consumed());
            !bucket.is_empty()
        });
    }

    /// Dispatch an event to all matching listeners and collect their
    /// successful non-empty outputs in execution order. Null, false, zero,
    /// empty strings and empty collections are dropped from the aggregate.
    pub async fn dispatch(&mut self, event: &dyn Event) -> Vec<Value> {
        let snapshot = self.matching(event.name());
        let results = run_listeners(event, &snapshot).await;
        self.prune_fired();
        results
    }

    /// Dispatch by string name with positional arguments.
    pub async fn dispatch_named(&mut self, name: &str, args: Vec<Value>) -> Vec<Value> {
        let event = NamedEvent::new(name, args);
        self.dispatch(&event).await
    }

    /// Introspect registrations: those applicable to `name`, or the whole
    /// registry (ordered by registration id) when no name is given.
    pub fn get_listeners(&self, name: Option<&str>) -> Vec<ListenerInfo> {
        let mut infos = Vec::new();
        match name {
            Some(name) => {
                if let Some(bucket) = self.exact.get(name) {
                    infos.extend(bucket.iter().map(|e| info_for(e, name, false)));
                }
                for (pattern, bucket) in &self.wildcard {
                    if pattern.matches(name) {
                        infos.extend(bucket.iter().map(|e| info_for(e, pattern.text(), true)));
                    }
                }
            }
            None => {
                for (key, bucket) in &self.exact {
                    infos.extend(bucket.iter().map(|e| info_for(e, key, false)));
                }
                for (pattern, bucket) in &self.wildcard {
                    infos.extend(bucket.iter().map(|e| info_for(e, pattern.text(), true)));
                }
                infos.sort_by_key(|i| i.id);
            }
        }
        infos
    }

    /// True if any exact or matching-wildcard listener is registered for `name`.
    pub fn has_listeners(&self, name: &str) -> bool {
        self.exact.get(name).is_some_and(|b| !b.is_empty())
            || self
                .wildcard
                .iter()
                .any(|(p, b)| !b.is_empty() && p.matches(name))
    }

    pub fn set_config(&mut self, key: impl Into<String>, value: Value) {
        self.config.set(key, value);
    }

    pub fn get_config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    pub fn ordering(&self) -> DispatchOrdering {
        self.config.ordering
    }

    pub fn set_ordering(&mut self, ordering: DispatchOrdering) {
        self.config.ordering = ordering;
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn info_for(entry: &ListenerEntry, key: &str, wildcard: bool) -> ListenerInfo {
    ListenerInfo {
        id: entry.id,
        key: key.to_string(),
        priority: entry.priority,
        once: entry.once,
        wildcard,
    }
}

/// True for values that contribute nothing to the dispatch aggregate:
/// null, false, zero, empty strings and empty collections.
fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Invoke a snapshot of listeners, isolating each failure.
///
/// A listener returning `Err` or panicking is logged and skipped; remaining
/// listeners still run. Once-listeners that lose the atomic fired race are
/// skipped without invocation.
async fn run_listeners(event: &dyn Event, snapshot: &[Arc<ListenerEntry>]) -> Vec<Value> {
    let mut results = Vec::new();
    for entry in snapshot {
        if entry.once && entry.fired.swap(true, Ordering::SeqCst) {
            continue;
        }
        let outcome = AssertUnwindSafe(entry.listener.invoke(event))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(Some(value))) if !is_empty_result(&value) => results.push(value),
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                let err = EventSystemError::ListenerFailed {
                    event_name: event.name().to_string(),
                    id: entry.id,
                    reason: err.to_string(),
                };
                log::error!("{err}");
            }
            Err(_) => {
                let err = EventSystemError::ListenerPanicked {
                    event_name: event.name().to_string(),
                    id: entry.id,
                };
                log::error!("{err}");
            }
        }
    }
    results
}

//--------------------------------------------------
// SharedEventDispatcher (Public API)
//--------------------------------------------------

/// Thread-safe shared event dispatcher using Tokio Mutex
#[derive(Clone)]
pub struct SharedEventDispatcher {
    dispatcher: Arc<Mutex<EventDispatcher>>,
}

// Manual Debug impl for SharedEventDispatcher
impl fmt::Debug for SharedEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEventDispatcher").finish_non_exhaustive()
    }
}

impl SharedEventDispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            dispatcher: Arc::new(Mutex::new(EventDispatcher::with_config(config))),
        }
    }

    pub fn clone_dispatcher(&self) -> Arc<Mutex<EventDispatcher>> {
        self.dispatcher.clone()
    }

    pub async fn listen(
        &self,
        name_or_pattern: &str,
        listener: Box<dyn AsyncListener>,
        priority: i32,
    ) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.listen(name_or_pattern, listener, priority)
    }

    pub async fn listen_once(
        &self,
        name_or_pattern: &str,
        listener: Box<dyn AsyncListener>,
        priority: i32,
    ) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.listen_once(name_or_pattern, listener, priority)
    }

    pub async fn remove_listener(&self, id: EventId) -> bool {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.remove_listener(id)
    }

    pub async fn remove_all_listeners(&self, name_or_pattern: Option<&str>) {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.remove_all_listeners(name_or_pattern);
    }

    /// Dispatch an event. The matching listener list is captured under the
    /// lock and invoked after releasing it, so listeners may register or
    /// remove listeners on this same dispatcher without deadlocking; such
    /// mutations do not affect the in-flight dispatch.
    pub async fn dispatch(&self, event: &dyn Event) -> Vec<Value> {
        let snapshot = {
            let dispatcher = self.dispatcher.lock().await;
            dispatcher.matching(event.name())
        };
        let results = run_listeners(event, &snapshot).await;
        if snapshot.iter().any(|e| e.consumed()) {
            let mut dispatcher = self.dispatcher.lock().await;
            dispatcher.prune_fired();
        }
        results
    }

    /// Dispatch by string name with positional arguments.
    pub async fn dispatch_named(&self, name: &str, args: Vec<Value>) -> Vec<Value> {
        let event = NamedEvent::new(name, args);
        self.dispatch(&event).await
    }

    pub async fn get_listeners(&self, name: Option<&str>) -> Vec<ListenerInfo> {
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.get_listeners(name)
    }

    pub async fn has_listeners(&self, name: &str) -> bool {
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.has_listeners(name)
    }

    pub async fn set_config(&self, key: impl Into<String>, value: Value) {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.set_config(key, value);
    }

    pub async fn get_config(&self, key: &str) -> Option<Value> {
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.get_config(key).cloned()
    }

    pub async fn ordering(&self) -> DispatchOrdering {
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.ordering()
    }

    pub async fn set_ordering(&self, ordering: DispatchOrdering) {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.set_ordering(ordering);
    }
}

impl Default for SharedEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------
// Helper Functions
//--------------------------------------------------

/// Create a new event dispatcher instance
pub fn create_dispatcher() -> SharedEventDispatcher {
    SharedEventDispatcher::new()
}

/// Helper function to adapt synchronous listeners to the async system
pub fn sync_listener<F>(f: F) -> Box<dyn AsyncListener>
where
    F: Fn(&dyn Event) -> ListenerOutput + Send + Sync + 'static,
{
    async_listener(Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    }))
}

/// Helper function to wrap an already-boxed future-returning closure as a listener
pub fn async_listener(
    handler: Box<dyn for<'a> Fn(&'a dyn Event) -> BoxFuture<'a> + Send + Sync>,
) -> Box<dyn AsyncListener> {
    Box::new(FnListener { handler })
}
