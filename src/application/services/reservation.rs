//! Reservation use cases
//!
//! Orchestrates the reservation aggregate: load entities, check overlaps
//! against the store, run the aggregate operation, commit, then publish the
//! recorded events. Writes for one vehicle are serialised by
//! [`BookingLocks`]; the store enforces the overlap exclusion once more on
//! insert.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::locks::{BookingGuard, BookingLocks, SharedBookingLocks};
use crate::application::events::SharedEventBus;
use crate::application::ports::SharedPaymentGateway;
use crate::config::AppConfig;
use crate::domain::entity::Entity;
use crate::domain::{
    CommitMode, DomainError, DomainEvent, DomainResult, Money, OverlapPolicy, PricingPolicy,
    RepositoryProvider, Reservation, ReservationAggregate, ReservationDomainService,
    ReservationId, ReservationStatus, TimeRange, User, UserId, Vehicle, VehicleId,
};
use crate::shared::{retry_transient, RetryConfig};

pub const HOLD_EXPIRED_REASON: &str = "hold expired";

/// Booking parameters shared by all reservation use cases.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    /// Hourly rate before classification pricing.
    pub base_rate: Money,
    pub overlap_policy: OverlapPolicy,
    pub pricing: PricingPolicy,
    /// PENDING reservations older than this are canceled by the expiry sweep.
    pub hold_timeout: chrono::Duration,
    pub retry: RetryConfig,
}

impl BookingSettings {
    pub fn new(base_rate: Money) -> Self {
        Self {
            base_rate,
            overlap_policy: OverlapPolicy::default(),
            pricing: PricingPolicy::default(),
            hold_timeout: chrono::Duration::minutes(15),
            retry: RetryConfig::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> DomainResult<Self> {
        Ok(Self {
            base_rate: config.pricing.base_rate()?,
            overlap_policy: config.booking.overlap_policy,
            pricing: config.pricing.policy(),
            hold_timeout: config
                .booking
                .hold_timeout()
                .map_err(|e| DomainError::validation(e.to_string()))?,
            retry: RetryConfig::from(&config.retry),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
    payments: SharedPaymentGateway,
    settings: BookingSettings,
    locks: SharedBookingLocks,
}

impl ReservationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        event_bus: SharedEventBus,
        payments: SharedPaymentGateway,
        settings: BookingSettings,
    ) -> Self {
        Self {
            repos,
            event_bus,
            payments,
            settings,
            locks: BookingLocks::shared(),
        }
    }

    /// Share the lock registry with other services writing vehicles or users.
    pub fn with_locks(mut self, locks: SharedBookingLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> SharedBookingLocks {
        self.locks.clone()
    }

    pub fn settings(&self) -> &BookingSettings {
        &self.settings
    }

    pub async fn create_reservation(&self, cmd: CreateReservation) -> DomainResult<Reservation> {
        let _guard = self.locks.acquire(&cmd.vehicle_id, &cmd.user_id).await;

        let time_range = TimeRange::new(cmd.start_time, cmd.end_time)?;
        let vehicle = self.load_vehicle(&cmd.vehicle_id).await?;
        let user = self.load_user(&cmd.user_id).await?;

        let existing = self
            .repos
            .reservations()
            .find_overlapping(&cmd.vehicle_id, &time_range)
            .await?;

        let result = ReservationAggregate::create(
            vehicle,
            user,
            time_range,
            &self.settings.base_rate,
            self.settings.pricing,
        )
        .and_then(|aggregate| {
            ReservationDomainService::validate_overlap(
                aggregate.reservation(),
                &existing,
                self.settings.overlap_policy,
            )?;
            Ok(aggregate)
        });
        let mut aggregate = match result {
            Ok(aggregate) => aggregate,
            Err(e) => {
                record_rejection(&e);
                return Err(e);
            }
        };

        if let Err(e) = self
            .repos
            .commit(&aggregate, CommitMode::Create(self.settings.overlap_policy))
            .await
        {
            record_rejection(&e);
            return Err(e);
        }

        let reservation = aggregate.reservation().clone();
        metrics::counter!("reservations_created_total").increment(1);
        info!(
            reservation_id = %reservation.id(),
            vehicle_id = %reservation.vehicle_id(),
            user_id = %reservation.user_id(),
            range = %reservation.time_range(),
            amount = %reservation.total_amount(),
            "Reservation created"
        );

        self.publish(aggregate.take_events()).await;
        Ok(reservation)
    }

    /// Charge the reservation amount and confirm. A declined payment leaves
    /// the reservation PENDING. Every check that can reject the confirmation
    /// runs before the charge; a charge whose confirmation still fails to
    /// commit is refunded.
    pub async fn confirm_reservation(
        &self,
        id: &ReservationId,
        payment_method_id: &str,
    ) -> DomainResult<Reservation> {
        let (_guard, mut aggregate) = self.lock_aggregate(id).await?;

        // Applied in memory only; nothing is committed unless the charge succeeds.
        let amount = aggregate.reservation().total_amount().clone();
        aggregate.confirm(amount.clone())?;

        let reservation = aggregate.reservation();
        let neighbours = self
            .repos
            .reservations()
            .find_overlapping(reservation.vehicle_id(), reservation.time_range())
            .await?;
        let cleared =
            ReservationDomainService::validate_confirmation_overlap(reservation, &neighbours);
        if let Err(e) = cleared {
            record_rejection(&e);
            return Err(e);
        }

        let payment = self
            .payments
            .process_payment(aggregate.user().id(), &amount, payment_method_id)
            .await?;
        if !payment.success {
            metrics::counter!("payments_declined_total").increment(1);
            let reason = payment.error.unwrap_or_else(|| "payment declined".to_string());
            warn!(
                reservation_id = %id,
                reason = %reason,
                "Payment declined, reservation stays PENDING"
            );
            return Err(DomainError::validation(format!("payment declined: {}", reason)));
        }

        if let Err(e) = self.repos.commit(&aggregate, CommitMode::Update).await {
            return Err(self
                .refund_unsaved_charge(id, payment.transaction_id.as_deref(), e)
                .await);
        }

        metrics::counter!("reservations_confirmed_total").increment(1);
        info!(
            reservation_id = %id,
            transaction_id = payment.transaction_id.as_deref().unwrap_or("-"),
            remaining_quota = aggregate.user().reservation_quota(),
            "Reservation confirmed"
        );

        let reservation = aggregate.reservation().clone();
        self.publish(aggregate.take_events()).await;
        Ok(reservation)
    }

    pub async fn cancel_reservation(
        &self,
        id: &ReservationId,
        reason: &str,
    ) -> DomainResult<Reservation> {
        let (_guard, mut aggregate) = self.lock_aggregate(id).await?;
        self.cancel_locked(&mut aggregate, reason).await
    }

    pub async fn complete_reservation(&self, id: &ReservationId) -> DomainResult<Reservation> {
        let (_guard, mut aggregate) = self.lock_aggregate(id).await?;

        aggregate.complete()?;
        self.repos.commit(&aggregate, CommitMode::Update).await?;

        metrics::counter!("reservations_completed_total").increment(1);
        info!(reservation_id = %id, "Reservation completed");

        let reservation = aggregate.reservation().clone();
        self.publish(aggregate.take_events()).await;
        Ok(reservation)
    }

    /// Cancel PENDING reservations older than the hold timeout. Returns the
    /// number of holds canceled; a failure on one hold does not stop the sweep.
    pub async fn expire_stale_holds(&self) -> DomainResult<usize> {
        let cutoff = Utc::now()
            .checked_sub_signed(self.settings.hold_timeout)
            .ok_or_else(|| DomainError::validation("hold timeout is out of range"))?;
        let stale = self
            .repos
            .reservations()
            .find_pending_created_before(cutoff)
            .await?;
        if stale.is_empty() {
            return Ok(0);
        }

        debug!(count = stale.len(), %cutoff, "Expiring stale holds");
        let mut expired = 0;
        for candidate in stale {
            let id = candidate.id().clone();
            match self.expire_hold(&id, cutoff).await {
                Ok(true) => expired += 1,
                Ok(false) => debug!(reservation_id = %id, "Hold changed before expiry, skipped"),
                Err(e) => warn!(reservation_id = %id, error = %e, "Failed to expire hold"),
            }
        }

        if expired > 0 {
            metrics::counter!("reservation_holds_expired_total").increment(expired as u64);
            info!(expired, "Stale holds expired");
        }
        Ok(expired)
    }

    pub async fn get_reservation(&self, id: &ReservationId) -> DomainResult<Reservation> {
        self.load_reservation(id).await
    }

    pub async fn reservations_for_user(&self, user_id: &UserId) -> DomainResult<Vec<Reservation>> {
        self.repos.reservations().find_for_user(user_id).await
    }

    // ── internals ──────────────────────────────────────────────

    async fn expire_hold(&self, id: &ReservationId, cutoff: DateTime<Utc>) -> DomainResult<bool> {
        let (_guard, mut aggregate) = self.lock_aggregate(id).await?;
        let reservation = aggregate.reservation();
        // Re-check under the lock: the hold may have been confirmed meanwhile.
        let still_stale =
            reservation.status() == ReservationStatus::Pending && reservation.created_at() < cutoff;
        if !still_stale {
            return Ok(false);
        }
        self.cancel_locked(&mut aggregate, HOLD_EXPIRED_REASON).await?;
        Ok(true)
    }

    /// The charge went through but the confirmation did not commit. Refund
    /// it and hand back the commit error; if the refund fails as well, the
    /// returned error names the transaction left charged.
    async fn refund_unsaved_charge(
        &self,
        id: &ReservationId,
        transaction_id: Option<&str>,
        cause: DomainError,
    ) -> DomainError {
        let refund = match transaction_id {
            Some(txn) => self.payments.refund_payment(txn).await,
            None => Err(DomainError::validation("approved charge has no transaction id")),
        };
        let transaction_id = transaction_id.unwrap_or("-");
        match refund {
            Ok(()) => {
                metrics::counter!("payments_refunded_total").increment(1);
                warn!(
                    reservation_id = %id,
                    transaction_id,
                    error = %cause,
                    "Confirmation not stored, payment refunded"
                );
                cause
            }
            Err(refund_error) => {
                metrics::counter!("payments_orphaned_total").increment(1);
                error!(
                    reservation_id = %id,
                    transaction_id,
                    error = %cause,
                    refund_error = %refund_error,
                    "Confirmation not stored and payment could not be refunded"
                );
                DomainError::Persistence(format!(
                    "payment {} was captured for reservation {} but not refunded: {}",
                    transaction_id, id, cause
                ))
            }
        }
    }

    async fn cancel_locked(
        &self,
        aggregate: &mut ReservationAggregate,
        reason: &str,
    ) -> DomainResult<Reservation> {
        aggregate.cancel(reason)?;
        self.repos.commit(aggregate, CommitMode::Update).await?;

        let reservation = aggregate.reservation().clone();
        metrics::counter!("reservations_canceled_total").increment(1);
        info!(
            reservation_id = %reservation.id(),
            reason = reservation.cancellation_reason().unwrap_or("-"),
            "Reservation canceled"
        );

        self.publish(aggregate.take_events()).await;
        Ok(reservation)
    }

    /// Take the booking locks for a stored reservation and load its aggregate
    /// fresh under them.
    async fn lock_aggregate(
        &self,
        id: &ReservationId,
    ) -> DomainResult<(BookingGuard, ReservationAggregate)> {
        let peek = self.load_reservation(id).await?;
        let guard = self.locks.acquire(peek.vehicle_id(), peek.user_id()).await;

        let reservation = self.load_reservation(id).await?;
        let vehicle = self.load_vehicle(reservation.vehicle_id()).await?;
        let user = self.load_user(reservation.user_id()).await?;
        let aggregate = ReservationAggregate::load(vehicle, user, reservation)?;
        Ok((guard, aggregate))
    }

    async fn load_vehicle(&self, id: &VehicleId) -> DomainResult<Vehicle> {
        retry_transient(
            &self.settings.retry,
            || self.repos.vehicles().find_by_id(id),
            "load_vehicle",
        )
        .await?
        .ok_or_else(|| DomainError::not_found("Vehicle", "id", id))
    }

    async fn load_user(&self, id: &UserId) -> DomainResult<User> {
        retry_transient(
            &self.settings.retry,
            || self.repos.users().find_by_id(id),
            "load_user",
        )
        .await?
        .ok_or_else(|| DomainError::not_found("User", "id", id))
    }

    async fn load_reservation(&self, id: &ReservationId) -> DomainResult<Reservation> {
        retry_transient(
            &self.settings.retry,
            || self.repos.reservations().find_by_id(id),
            "load_reservation",
        )
        .await?
        .ok_or_else(|| DomainError::not_found("Reservation", "id", id))
    }

    /// Publish after commit. Handler failures are logged; the committed
    /// state stands.
    async fn publish(&self, events: Vec<DomainEvent>) {
        if let Err(e) = self.event_bus.publish_all(events).await {
            metrics::counter!("event_publish_failures_total").increment(1);
            warn!(error = %e, "Event handler failed after commit");
        }
    }
}

fn record_rejection(error: &DomainError) {
    let reason = if error.is_overlap() {
        "overlap"
    } else if error.is_validation() {
        "validation"
    } else {
        "error"
    };
    metrics::counter!("reservations_rejected_total", "reason" => reason).increment(1);
    warn!(reason, error = %error, "Reservation rejected");
}
