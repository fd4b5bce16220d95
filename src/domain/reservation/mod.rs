//! Reservation aggregate
//!
//! Contains the Reservation entity, the aggregate that composes it with a
//! vehicle and a user, the reservation rules, and the repository interface.

pub mod aggregate;
pub mod model;
pub mod repository;
pub mod service;

pub use aggregate::ReservationAggregate;
pub use model::{Reservation, ReservationSnapshot, ReservationStatus};
pub use repository::ReservationRepository;
pub use service::{OverlapPolicy, PricingPolicy, ReservationDomainService};
