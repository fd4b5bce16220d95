//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::Reservation;
use super::service::OverlapPolicy;
use crate::domain::entity::{ReservationId, UserId, VehicleId};
use crate::domain::value_objects::TimeRange;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation.
    ///
    /// Implementations must check for overlapping blocking reservations of
    /// the same vehicle and insert in one atomic step (serializable
    /// transaction or exclusion constraint), rejecting the loser with
    /// [`DomainError::overlap`](crate::shared::DomainError::overlap).
    async fn save(&self, reservation: Reservation, policy: OverlapPolicy) -> DomainResult<()>;

    async fn find_by_id(&self, id: &ReservationId) -> DomainResult<Option<Reservation>>;

    /// Replace an existing reservation.
    async fn update(&self, reservation: Reservation) -> DomainResult<()>;

    /// Active (PENDING or CONFIRMED) reservations of a vehicle whose range
    /// overlaps `range`.
    async fn find_overlapping(
        &self,
        vehicle_id: &VehicleId,
        range: &TimeRange,
    ) -> DomainResult<Vec<Reservation>>;

    async fn find_for_user(&self, user_id: &UserId) -> DomainResult<Vec<Reservation>>;

    /// PENDING reservations created before `cutoff` (stale holds).
    async fn find_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>>;
}
