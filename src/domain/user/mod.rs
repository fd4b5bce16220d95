//! User entity, status guards and repository interface

pub mod model;
pub mod repository;
pub mod service;

pub use model::{User, UserRole, UserSnapshot, UserStatus};
pub use repository::UserRepository;
pub use service::UserDomainService;
