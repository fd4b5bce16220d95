//! Reservation aggregate
//!
//! Holds one vehicle, one user and one reservation for the duration of a
//! single use-case invocation. Every lifecycle operation validates first
//! and mutates only once all checks passed, so a failed call leaves the
//! three entities untouched. Events are recorded, not published: the caller
//! drains them with [`ReservationAggregate::take_events`] after the commit
//! succeeded.

use chrono::{DateTime, Utc};

use super::model::{Reservation, ReservationStatus};
use super::service::{PricingPolicy, ReservationDomainService};
use crate::domain::entity::Entity;
use crate::domain::events::{
    DomainEvent, ReservationCanceledEvent, ReservationCompletedEvent, ReservationConfirmedEvent,
    ReservationCreatedEvent,
};
use crate::domain::user::{User, UserDomainService};
use crate::domain::value_objects::{Money, TimeRange};
use crate::domain::vehicle::Vehicle;
use crate::domain::DomainResult;
use crate::shared::DomainError;

#[derive(Debug, Clone)]
pub struct ReservationAggregate {
    vehicle: Vehicle,
    user: User,
    reservation: Reservation,
    events: Vec<DomainEvent>,
}

impl ReservationAggregate {
    /// Build a PENDING reservation. Overlap is not checked here: the caller
    /// checks it against the store before calling and the store enforces it
    /// again on insert.
    pub fn create(
        vehicle: Vehicle,
        user: User,
        time_range: TimeRange,
        base_rate: &Money,
        pricing: PricingPolicy,
    ) -> DomainResult<Self> {
        if !vehicle.is_available() {
            return Err(DomainError::validation(format!(
                "vehicle {} is not available ({})",
                vehicle.plate(),
                vehicle.status()
            )));
        }
        UserDomainService::validate_can_reserve(&user)?;

        let amount = ReservationDomainService::calculate_reservation_amount(
            &vehicle,
            &time_range,
            base_rate,
            pricing,
        )?;
        let reservation =
            Reservation::new(user.id().clone(), vehicle.id().clone(), time_range, amount);
        ReservationDomainService::validate_reservation_creation(&reservation)?;

        let event = DomainEvent::ReservationCreated(ReservationCreatedEvent {
            reservation_id: reservation.id().clone(),
            vehicle_id: vehicle.id().clone(),
            user_id: user.id().clone(),
            start_time: time_range.start_time(),
            end_time: time_range.end_time(),
            amount: reservation.total_amount().clone(),
            timestamp: Utc::now(),
        });

        Ok(Self {
            vehicle,
            user,
            reservation,
            events: vec![event],
        })
    }

    /// Reassemble the aggregate around a stored reservation.
    pub fn load(vehicle: Vehicle, user: User, reservation: Reservation) -> DomainResult<Self> {
        if reservation.vehicle_id() != vehicle.id() {
            return Err(DomainError::validation(format!(
                "reservation {} belongs to vehicle {}, not {}",
                reservation.id(),
                reservation.vehicle_id(),
                vehicle.id()
            )));
        }
        if reservation.user_id() != user.id() {
            return Err(DomainError::validation(format!(
                "reservation {} belongs to user {}, not {}",
                reservation.id(),
                reservation.user_id(),
                user.id()
            )));
        }
        Ok(Self {
            vehicle,
            user,
            reservation,
            events: Vec::new(),
        })
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn reservation(&self) -> &Reservation {
        &self.reservation
    }

    pub fn into_parts(self) -> (Vehicle, User, Reservation) {
        (self.vehicle, self.user, self.reservation)
    }

    /// PENDING → CONFIRMED. `amount` is what was charged and must be in the
    /// reservation's currency.
    pub fn confirm(&mut self, amount: Money) -> DomainResult<()> {
        if self.reservation.status() != ReservationStatus::Pending {
            return Err(DomainError::validation(format!(
                "reservation {} is {} and cannot be confirmed",
                self.reservation.id(),
                self.reservation.status()
            )));
        }
        ReservationDomainService::validate_status_change(
            &self.reservation,
            ReservationStatus::Confirmed,
        )?;
        if amount.currency() != self.reservation.total_amount().currency() {
            return Err(DomainError::validation(format!(
                "confirmation amount {} does not match reservation currency {}",
                amount,
                self.reservation.total_amount().currency()
            )));
        }
        if !self.vehicle.is_available() {
            return Err(DomainError::validation(format!(
                "vehicle {} is no longer available ({})",
                self.vehicle.plate(),
                self.vehicle.status()
            )));
        }
        UserDomainService::validate_can_reserve(&self.user)?;

        self.reservation.confirm(amount.clone())?;
        self.user.consume_quota()?;
        self.vehicle.register_reservation();

        self.events
            .push(DomainEvent::ReservationConfirmed(ReservationConfirmedEvent {
                reservation_id: self.reservation.id().clone(),
                vehicle_id: self.vehicle.id().clone(),
                user_id: self.user.id().clone(),
                amount,
                timestamp: Utc::now(),
            }));
        Ok(())
    }

    /// PENDING|CONFIRMED → CANCELED. A confirmed reservation gives its slot
    /// back to the vehicle counter and the user quota.
    pub fn cancel(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let current = self.reservation.status();
        if !current.is_active() {
            return Err(DomainError::validation(format!(
                "reservation {} is {} and cannot be canceled",
                self.reservation.id(),
                current
            )));
        }
        ReservationDomainService::validate_status_change(
            &self.reservation,
            ReservationStatus::Canceled,
        )?;

        let was_confirmed = current == ReservationStatus::Confirmed;
        if was_confirmed {
            self.vehicle.release_reservation()?;
            self.user.restore_quota();
        }
        self.reservation.cancel(reason)?;

        self.events
            .push(DomainEvent::ReservationCanceled(ReservationCanceledEvent {
                reservation_id: self.reservation.id().clone(),
                vehicle_id: self.vehicle.id().clone(),
                user_id: self.user.id().clone(),
                reason: self.reservation.cancellation_reason().map(String::from),
                was_confirmed,
                timestamp: Utc::now(),
            }));
        Ok(())
    }

    /// CONFIRMED → COMPLETED once the booked window is over.
    pub fn complete(&mut self) -> DomainResult<()> {
        self.complete_at(Utc::now())
    }

    pub fn complete_at(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.reservation.status() == ReservationStatus::Completed {
            return Err(DomainError::validation(format!(
                "reservation {} is already completed",
                self.reservation.id()
            )));
        }
        ReservationDomainService::validate_status_change_at(
            &self.reservation,
            ReservationStatus::Completed,
            now,
        )?;

        self.vehicle.release_reservation()?;
        self.user.restore_quota();
        self.reservation.complete_at(now)?;

        self.events
            .push(DomainEvent::ReservationCompleted(ReservationCompletedEvent {
                reservation_id: self.reservation.id().clone(),
                vehicle_id: self.vehicle.id().clone(),
                user_id: self.user.id().clone(),
                timestamp: Utc::now(),
            }));
        Ok(())
    }

    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Drain recorded events. Call only after the aggregate was committed.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{RESERVATION_CANCELED, RESERVATION_CREATED};
    use crate::domain::user::{UserRole, UserStatus};
    use crate::domain::value_objects::{Email, Password, VehicleClassification};
    use crate::domain::vehicle::VehicleStatus;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, "USD").unwrap()
    }

    fn vehicle() -> Vehicle {
        Vehicle::new("Civic", "CIV1234", 2022, VehicleClassification::Compact).unwrap()
    }

    fn user(quota: u32) -> User {
        User::new(
            "Uma",
            Email::parse("uma@example.com").unwrap(),
            Password::from_hash("$2b$04$hash"),
            UserRole::User,
            quota,
        )
        .unwrap()
    }

    fn two_hours_from_now() -> TimeRange {
        let start = Utc::now() + Duration::hours(1);
        TimeRange::new(start, start + Duration::hours(2)).unwrap()
    }

    fn create(vehicle: Vehicle, user: User) -> DomainResult<ReservationAggregate> {
        ReservationAggregate::create(
            vehicle,
            user,
            two_hours_from_now(),
            &usd(5000),
            PricingPolicy::default(),
        )
    }

    /// Confirmed aggregate whose window lies in the past.
    fn finished_confirmed() -> ReservationAggregate {
        let mut agg = create(vehicle(), user(1)).unwrap();
        agg.confirm(usd(10_000)).unwrap();
        let (vehicle, user, reservation) = agg.into_parts();
        let mut snapshot = reservation.snapshot();
        snapshot.start_time = Utc::now() - Duration::hours(3);
        snapshot.end_time = Utc::now() - Duration::hours(1);
        ReservationAggregate::load(vehicle, user, Reservation::restore(snapshot).unwrap()).unwrap()
    }

    #[test]
    fn create_builds_pending_reservation_with_amount() {
        let agg = create(vehicle(), user(1)).unwrap();
        assert_eq!(agg.reservation().status(), ReservationStatus::Pending);
        assert_eq!(agg.reservation().total_amount(), &usd(10_000));
        assert_eq!(agg.reservation().total_amount().amount(), Decimal::from(100));
        assert_eq!(agg.pending_events().len(), 1);
        assert_eq!(agg.pending_events()[0].event_type(), RESERVATION_CREATED);
        // nothing is consumed until confirmation
        assert_eq!(agg.user().reservation_quota(), 1);
        assert_eq!(agg.vehicle().active_reservations(), 0);
    }

    #[test]
    fn create_rejects_unavailable_vehicle() {
        let mut v = vehicle();
        v.change_status(VehicleStatus::Maintenance);
        let err = create(v, user(1)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn create_rejects_inactive_user_or_no_quota() {
        let mut blocked = user(1);
        blocked.change_status(UserStatus::Blocked);
        assert!(create(vehicle(), blocked).is_err());
        assert!(create(vehicle(), user(0)).unwrap_err().to_string().contains("quota"));
    }

    #[test]
    fn confirm_consumes_quota_and_reserves_vehicle() {
        let mut agg = create(vehicle(), user(1)).unwrap();
        agg.take_events();
        agg.confirm(usd(10_000)).unwrap();

        assert_eq!(agg.reservation().status(), ReservationStatus::Confirmed);
        assert_eq!(agg.user().reservation_quota(), 0);
        assert_eq!(agg.vehicle().active_reservations(), 1);
        assert_eq!(agg.vehicle().status(), VehicleStatus::Reserved);
        assert_eq!(agg.take_events().len(), 1);
    }

    #[test]
    fn confirm_only_from_pending() {
        let mut agg = create(vehicle(), user(2)).unwrap();
        agg.cancel("no longer needed").unwrap();
        assert!(agg.confirm(usd(10_000)).is_err());
    }

    #[test]
    fn confirm_with_wrong_currency_leaves_state_untouched() {
        let mut agg = create(vehicle(), user(1)).unwrap();
        let err = agg.confirm(Money::from_cents(10_000, "EUR").unwrap()).unwrap_err();
        assert!(err.to_string().contains("currency"));
        assert_eq!(agg.reservation().status(), ReservationStatus::Pending);
        assert_eq!(agg.user().reservation_quota(), 1);
    }

    #[test]
    fn cancel_pending_does_not_touch_counters() {
        let mut agg = create(vehicle(), user(1)).unwrap();
        agg.take_events();
        agg.cancel("changed plans").unwrap();
        assert_eq!(agg.reservation().status(), ReservationStatus::Canceled);
        assert_eq!(agg.user().reservation_quota(), 1);
        assert_eq!(agg.vehicle().active_reservations(), 0);

        let events = agg.take_events();
        assert_eq!(events[0].event_type(), RESERVATION_CANCELED);
        match &events[0] {
            DomainEvent::ReservationCanceled(e) => {
                assert_eq!(e.reason.as_deref(), Some("changed plans"));
                assert!(!e.was_confirmed);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn cancel_confirmed_restores_quota_and_vehicle() {
        let mut agg = create(vehicle(), user(1)).unwrap();
        agg.confirm(usd(10_000)).unwrap();
        agg.cancel("sick").unwrap();
        assert_eq!(agg.user().reservation_quota(), 1);
        assert_eq!(agg.vehicle().active_reservations(), 0);
        assert_eq!(agg.vehicle().status(), VehicleStatus::Available);
    }

    #[test]
    fn cancel_terminal_reservation_fails() {
        let mut agg = create(vehicle(), user(1)).unwrap();
        agg.cancel("first").unwrap();
        assert!(agg.cancel("second").unwrap_err().is_validation());

        let mut done = finished_confirmed();
        done.complete().unwrap();
        assert!(done.cancel("too late").is_err());
    }

    #[test]
    fn complete_requires_end_time_passed() {
        let mut agg = create(vehicle(), user(1)).unwrap();
        agg.confirm(usd(10_000)).unwrap();
        let err = agg.complete().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(agg.reservation().status(), ReservationStatus::Confirmed);
        assert_eq!(agg.vehicle().active_reservations(), 1);
    }

    #[test]
    fn complete_after_end_releases_vehicle() {
        let mut agg = finished_confirmed();
        agg.complete().unwrap();
        assert_eq!(agg.reservation().status(), ReservationStatus::Completed);
        assert_eq!(agg.vehicle().active_reservations(), 0);
        assert_eq!(agg.user().reservation_quota(), 1);
        assert!(agg.complete().is_err());
    }

    #[test]
    fn load_rejects_mismatched_entities() {
        let agg = create(vehicle(), user(1)).unwrap();
        let (_, u, reservation) = agg.into_parts();
        assert!(ReservationAggregate::load(vehicle(), u, reservation).is_err());
    }
}
