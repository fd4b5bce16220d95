//! Vehicle entity, status guards and repository interface

pub mod model;
pub mod repository;
pub mod service;

pub use model::{Vehicle, VehicleSnapshot, VehicleStatus};
pub use repository::VehicleRepository;
pub use service::VehicleDomainService;
