//! # Fleet Booking
//!
//! Vehicle reservation core: value objects, entities, reservation rules,
//! the reservation aggregate, and an injected domain event bus.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Entities, value objects, business rules, repository ports
//! - **application**: Use cases, event bus, outbound ports
//! - **infrastructure**: In-memory store, simulated payments, notification handlers
//! - **shared**: Errors, retry, shutdown
//! - **config**: TOML configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{
    create_event_bus, BookingSettings, CreateReservation, EventBus, FleetService,
    ReservationService, SharedEventBus,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::InMemoryRepositories;
