//! Event handlers that deliver reservation notifications

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::events::{EventHandler, HandlerError};
use crate::domain::{DomainEvent, EventMessage};

/// Writes a structured log line per event; stands in for e-mail delivery.
#[derive(Default)]
pub struct LoggingNotifier;

#[async_trait]
impl EventHandler for LoggingNotifier {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::ReservationCreated(e) => info!(
                reservation_id = %e.reservation_id,
                user_id = %e.user_id,
                vehicle_id = %e.vehicle_id,
                amount = %e.amount,
                start = %e.start_time,
                end = %e.end_time,
                "Notify: reservation received"
            ),
            DomainEvent::ReservationConfirmed(e) => info!(
                reservation_id = %e.reservation_id,
                user_id = %e.user_id,
                amount = %e.amount,
                "Notify: reservation confirmed"
            ),
            DomainEvent::ReservationCanceled(e) => info!(
                reservation_id = %e.reservation_id,
                user_id = %e.user_id,
                reason = e.reason.as_deref().unwrap_or("-"),
                was_confirmed = e.was_confirmed,
                "Notify: reservation canceled"
            ),
            DomainEvent::ReservationCompleted(e) => info!(
                reservation_id = %e.reservation_id,
                user_id = %e.user_id,
                "Notify: reservation completed"
            ),
        }
        Ok(())
    }
}

/// Keeps every received event as a JSON envelope (audit trail).
#[derive(Default)]
pub struct EventJournal {
    entries: Mutex<Vec<String>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialised [`EventMessage`]s in arrival order.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventHandler for EventJournal {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let message = EventMessage::new(event.clone());
        let json = serde_json::to_string(&message)?;
        debug!(event_type = event.event_type(), payload = %json, "Event journaled");
        self.entries
            .lock()
            .map_err(|_| "event journal lock poisoned")?
            .push(json);
        Ok(())
    }
}
