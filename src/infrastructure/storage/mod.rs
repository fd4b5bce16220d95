//! Storage implementations of the domain repository ports

mod memory;

pub use memory::{
    InMemoryRepositories, InMemoryReservationRepository, InMemoryUserRepository,
    InMemoryVehicleRepository,
};
