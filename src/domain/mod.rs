pub mod entity;
pub mod events;
pub mod repositories;
pub mod reservation;
pub mod user;
pub mod value_objects;
pub mod vehicle;

// Re-export commonly used types
pub use entity::{Entity, ReservationId, UserId, ValueObject, VehicleId};
pub use events::{DomainEvent, EventMessage};
pub use repositories::{CommitMode, DomainResult, RepositoryProvider};
pub use reservation::{
    OverlapPolicy, PricingPolicy, Reservation, ReservationAggregate, ReservationDomainService,
    ReservationRepository, ReservationSnapshot, ReservationStatus,
};
pub use user::{
    User, UserDomainService, UserRepository, UserRole, UserSnapshot, UserStatus,
};
pub use value_objects::{Email, Money, Password, TimeRange, VehicleClassification};
pub use vehicle::{
    Vehicle, VehicleDomainService, VehicleRepository, VehicleSnapshot, VehicleStatus,
};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
