//! Reservation domain events
//!
//! Immutable facts recorded by the reservation aggregate and published to
//! subscribers once the change has been persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{ReservationId, UserId, VehicleId};
use crate::domain::value_objects::Money;

pub const RESERVATION_CREATED: &str = "reservation_created";
pub const RESERVATION_CONFIRMED: &str = "reservation_confirmed";
pub const RESERVATION_CANCELED: &str = "reservation_canceled";
pub const RESERVATION_COMPLETED: &str = "reservation_completed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DomainEvent {
    ReservationCreated(ReservationCreatedEvent),
    ReservationConfirmed(ReservationConfirmedEvent),
    ReservationCanceled(ReservationCanceledEvent),
    ReservationCompleted(ReservationCompletedEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ReservationCreated(_) => RESERVATION_CREATED,
            DomainEvent::ReservationConfirmed(_) => RESERVATION_CONFIRMED,
            DomainEvent::ReservationCanceled(_) => RESERVATION_CANCELED,
            DomainEvent::ReservationCompleted(_) => RESERVATION_COMPLETED,
        }
    }

    pub fn reservation_id(&self) -> &ReservationId {
        match self {
            DomainEvent::ReservationCreated(e) => &e.reservation_id,
            DomainEvent::ReservationConfirmed(e) => &e.reservation_id,
            DomainEvent::ReservationCanceled(e) => &e.reservation_id,
            DomainEvent::ReservationCompleted(e) => &e.reservation_id,
        }
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            DomainEvent::ReservationCreated(e) => &e.vehicle_id,
            DomainEvent::ReservationConfirmed(e) => &e.vehicle_id,
            DomainEvent::ReservationCanceled(e) => &e.vehicle_id,
            DomainEvent::ReservationCompleted(e) => &e.vehicle_id,
        }
    }

    pub fn user_id(&self) -> &UserId {
        match self {
            DomainEvent::ReservationCreated(e) => &e.user_id,
            DomainEvent::ReservationConfirmed(e) => &e.user_id,
            DomainEvent::ReservationCanceled(e) => &e.user_id,
            DomainEvent::ReservationCompleted(e) => &e.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: ReservationId,
    pub vehicle_id: VehicleId,
    pub user_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationConfirmedEvent {
    pub reservation_id: ReservationId,
    pub vehicle_id: VehicleId,
    pub user_id: UserId,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationCanceledEvent {
    pub reservation_id: ReservationId,
    pub vehicle_id: VehicleId,
    pub user_id: UserId,
    pub reason: Option<String>,
    /// Whether the reservation had been paid for.
    pub was_confirmed: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationCompletedEvent {
    pub reservation_id: ReservationId,
    pub vehicle_id: VehicleId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DomainEvent,
}

impl EventMessage {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canceled() -> DomainEvent {
        DomainEvent::ReservationCanceled(ReservationCanceledEvent {
            reservation_id: ReservationId::new("R1"),
            vehicle_id: VehicleId::new("V1"),
            user_id: UserId::new("U1"),
            reason: Some("flight delayed".into()),
            was_confirmed: true,
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn accessors_expose_common_payload() {
        let event = canceled();
        assert_eq!(event.event_type(), RESERVATION_CANCELED);
        assert_eq!(event.reservation_id().as_str(), "R1");
        assert_eq!(event.vehicle_id().as_str(), "V1");
        assert_eq!(event.user_id().as_str(), "U1");
    }

    #[test]
    fn message_serializes_with_type_tag() {
        let json = serde_json::to_value(EventMessage::new(canceled())).unwrap();
        assert_eq!(json["type"], "ReservationCanceled");
        assert_eq!(json["data"]["reason"], "flight delayed");
        assert!(json["id"].is_string());
    }
}
