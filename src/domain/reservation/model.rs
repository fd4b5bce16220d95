//! Reservation domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, ReservationId, UserId, VehicleId};
use crate::domain::value_objects::{Money, TimeRange};
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Created, awaiting payment/confirmation
    Pending,
    /// Paid and holding the vehicle
    Confirmed,
    /// Canceled by the user, an admin, or hold expiry
    Canceled,
    /// Rental finished
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Canceled => "CANCELED",
            Self::Completed => "COMPLETED",
        }
    }

    /// PENDING or CONFIRMED.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Lifecycle table: PENDING → CONFIRMED → COMPLETED, and
    /// PENDING|CONFIRMED → CANCELED.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Canceled)
                | (Self::Confirmed, Self::Canceled)
                | (Self::Confirmed, Self::Completed)
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELED" | "CANCELLED" => Ok(Self::Canceled),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(DomainError::validation(format!(
                "unknown reservation status '{}'",
                other
            ))),
        }
    }
}

/// Stored form of a reservation, used to rebuild the entity without
/// re-running creation-time rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    pub id: ReservationId,
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub total_amount: Money,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking of one vehicle by one user for one time range
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    id: ReservationId,
    user_id: UserId,
    vehicle_id: VehicleId,
    time_range: TimeRange,
    status: ReservationStatus,
    total_amount: Money,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &ReservationId {
        &self.id
    }
}

impl Reservation {
    /// A new PENDING reservation. Business rules are applied by the
    /// aggregate and `ReservationDomainService`, not here.
    pub fn new(
        user_id: UserId,
        vehicle_id: VehicleId,
        time_range: TimeRange,
        total_amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReservationId::generate(),
            user_id,
            vehicle_id,
            time_range,
            status: ReservationStatus::Pending,
            total_amount,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Trusted reconstruction from storage. Past ranges are allowed.
    pub fn restore(snapshot: ReservationSnapshot) -> DomainResult<Self> {
        let time_range = TimeRange::restore(snapshot.start_time, snapshot.end_time)?;
        Ok(Self {
            id: snapshot.id,
            user_id: snapshot.user_id,
            vehicle_id: snapshot.vehicle_id,
            time_range,
            status: snapshot.status,
            total_amount: snapshot.total_amount,
            cancellation_reason: snapshot.cancellation_reason,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        })
    }

    pub fn snapshot(&self) -> ReservationSnapshot {
        ReservationSnapshot {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            vehicle_id: self.vehicle_id.clone(),
            start_time: self.time_range.start_time(),
            end_time: self.time_range.end_time(),
            status: self.status,
            total_amount: self.total_amount.clone(),
            cancellation_reason: self.cancellation_reason.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn total_amount(&self) -> &Money {
        &self.total_amount
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn overlaps(&self, other: &Reservation) -> bool {
        self.vehicle_id == other.vehicle_id && self.time_range.overlaps(&other.time_range)
    }

    pub(crate) fn confirm(&mut self, amount: Money) -> DomainResult<()> {
        self.transition(ReservationStatus::Confirmed)?;
        self.total_amount = amount;
        Ok(())
    }

    pub(crate) fn cancel(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.transition(ReservationStatus::Canceled)?;
        let reason = reason.into();
        self.cancellation_reason = Some(reason).filter(|r| !r.trim().is_empty());
        Ok(())
    }

    pub(crate) fn complete_at(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.time_range.has_ended_at(now) {
            return Err(DomainError::validation(format!(
                "reservation {} cannot be completed before its end time",
                self.id
            )));
        }
        self.transition(ReservationStatus::Completed)
    }

    fn transition(&mut self, next: ReservationStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "reservation {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────
