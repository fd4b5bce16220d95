//! Event bus for dispatching domain events to subscribed handlers
//!
//! Handlers are registered per event type and kept in registration order.
//! `publish` runs every handler for the event concurrently, waits for all
//! of them, and reports the first failure. A failed handler never undoes the
//! state change that produced the event.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{DomainEvent, DomainResult};
use crate::shared::DomainError;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Side-effect subscriber (notification, e-mail, audit).
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

pub type SharedEventHandler = Arc<dyn EventHandler>;

/// Adapter turning an async closure into an [`EventHandler`].
pub struct FnHandler<F>(F);

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> SharedEventHandler
where
    F: Fn(DomainEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(DomainEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        (self.0)(event.clone()).await
    }
}

/// Explicitly constructed, injected event bus
#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<String, Vec<SharedEventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event_type: &str, handler: SharedEventHandler) {
        let mut entry = self.handlers.entry(event_type.to_string()).or_default();
        entry.push(handler);
        info!(event_type, total = entry.len(), "Event handler registered");
    }

    /// Register one handler for several event types.
    pub fn subscribe_many(&self, event_types: &[&str], handler: SharedEventHandler) {
        for event_type in event_types {
            self.subscribe(event_type, handler.clone());
        }
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map(|h| h.len()).unwrap_or(0)
    }

    pub async fn publish(&self, event: &DomainEvent) -> DomainResult<()> {
        let event_type = event.event_type();
        // Clone the list so no map guard is held across an await.
        let handlers: Vec<SharedEventHandler> = self
            .handlers
            .get(event_type)
            .map(|h| h.value().clone())
            .unwrap_or_default();

        if handlers.is_empty() {
            debug!(
                event_type,
                reservation_id = %event.reservation_id(),
                "Event published (no handlers)"
            );
            return Ok(());
        }

        let results = join_all(handlers.iter().map(|handler| handler.handle(event))).await;

        let mut first_error = None;
        let mut failed = 0usize;
        for result in results {
            if let Err(e) = result {
                failed += 1;
                warn!(
                    event_type,
                    reservation_id = %event.reservation_id(),
                    error = %e,
                    "Event handler failed"
                );
                first_error.get_or_insert_with(|| DomainError::EventHandler {
                    event_type,
                    message: e.to_string(),
                });
            }
        }

        metrics::counter!("domain_events_published_total", "event_type" => event_type).increment(1);
        debug!(
            event_type,
            reservation_id = %event.reservation_id(),
            handlers = handlers.len(),
            failed,
            "Event published"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Publish events in order. Every event is published even if an earlier
    /// one failed; the first failure is returned.
    pub async fn publish_all(&self, events: Vec<DomainEvent>) -> DomainResult<()> {
        let mut first_error = None;
        for event in &events {
            if let Err(e) = self.publish(event).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Shared event bus type
pub type SharedEventBus = Arc<EventBus>;

/// Create a shared event bus
pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
