//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-entity repositories,
//!   plus the unit-of-work commit for a reservation aggregate
//! - `DomainResult`: standard result type for domain operations

use async_trait::async_trait;

use super::reservation::{OverlapPolicy, ReservationAggregate, ReservationRepository};
use super::user::UserRepository;
use super::vehicle::VehicleRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// How an aggregate's reservation reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// First save of a freshly created reservation; the store enforces the
    /// overlap exclusion under `OverlapPolicy`.
    Create(OverlapPolicy),
    /// Lifecycle change of an already stored reservation.
    Update,
}

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let vehicle = repos.vehicles().find_by_id(&vehicle_id).await?;
///     let clashes = repos.reservations().find_overlapping(&vehicle_id, &range).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn vehicles(&self) -> &dyn VehicleRepository;
    fn users(&self) -> &dyn UserRepository;
    fn reservations(&self) -> &dyn ReservationRepository;

    /// Persist the reservation, vehicle and user held by `aggregate` as one
    /// unit: either all three are written or none is.
    async fn commit(&self, aggregate: &ReservationAggregate, mode: CommitMode) -> DomainResult<()>;
}
