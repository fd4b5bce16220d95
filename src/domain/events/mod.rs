//! Domain events
//!
//! Event types that represent facts about what happened to a reservation.
//! The `EventBus` implementation lives in `application::events`.

pub mod types;

pub use types::{
    DomainEvent, EventMessage, ReservationCanceledEvent, ReservationCompletedEvent,
    ReservationConfirmedEvent, ReservationCreatedEvent, RESERVATION_CANCELED,
    RESERVATION_COMPLETED, RESERVATION_CONFIRMED, RESERVATION_CREATED,
};
