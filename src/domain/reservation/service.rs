//! Reservation business rules that span more than one entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Reservation, ReservationStatus};
use crate::domain::entity::Entity;
use crate::domain::value_objects::{Money, TimeRange};
use crate::domain::vehicle::Vehicle;
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Which existing reservations block a new booking of the same vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Only CONFIRMED reservations block. Two overlapping PENDING holds can
    /// coexist; confirming the second one is rejected by
    /// [`ReservationDomainService::validate_confirmation_overlap`].
    ConfirmedOnly,
    /// PENDING holds block as well, so overlapping holds never coexist.
    #[default]
    IncludePending,
}

impl OverlapPolicy {
    pub fn blocks(&self, status: ReservationStatus) -> bool {
        match self {
            Self::ConfirmedOnly => status == ReservationStatus::Confirmed,
            Self::IncludePending => status.is_active(),
        }
    }
}

/// Optional pricing extensions on top of rate × hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Multiply the base rate by the vehicle classification's multiplier.
    #[serde(default)]
    pub classification_multiplier: bool,
}

/// Stateless reservation rule checks. No I/O.
pub struct ReservationDomainService;

impl ReservationDomainService {
    pub fn validate_reservation_creation(reservation: &Reservation) -> DomainResult<()> {
        Self::validate_reservation_creation_at(reservation, Utc::now())
    }

    pub fn validate_reservation_creation_at(
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if reservation.user_id().is_blank() {
            return Err(DomainError::validation("reservation requires a user id"));
        }
        if reservation.vehicle_id().is_blank() {
            return Err(DomainError::validation("reservation requires a vehicle id"));
        }
        if reservation.time_range().start_time() < now {
            return Err(DomainError::validation("reservation start time is in the past"));
        }
        Ok(())
    }

    /// Fails if any other blocking reservation of the same vehicle overlaps
    /// the candidate.
    pub fn validate_overlap(
        candidate: &Reservation,
        existing: &[Reservation],
        policy: OverlapPolicy,
    ) -> DomainResult<()> {
        let clash = existing.iter().any(|other| {
            !other.same_identity(candidate)
                && policy.blocks(other.status())
                && other.overlaps(candidate)
        });
        if clash {
            return Err(DomainError::overlap(candidate.vehicle_id()));
        }
        Ok(())
    }

    /// Confirmed reservations never overlap, whatever policy admitted the
    /// holds.
    pub fn validate_confirmation_overlap(
        candidate: &Reservation,
        existing: &[Reservation],
    ) -> DomainResult<()> {
        Self::validate_overlap(candidate, existing, OverlapPolicy::ConfirmedOnly)
    }

    pub fn validate_status_change(
        reservation: &Reservation,
        new_status: ReservationStatus,
    ) -> DomainResult<()> {
        Self::validate_status_change_at(reservation, new_status, Utc::now())
    }

    pub fn validate_status_change_at(
        reservation: &Reservation,
        new_status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let current = reservation.status();
        if current == new_status {
            return Ok(());
        }
        match new_status {
            ReservationStatus::Canceled if !current.is_active() => Err(DomainError::validation(
                format!("only active reservations can be canceled, status is {}", current),
            )),
            ReservationStatus::Completed if current != ReservationStatus::Confirmed => {
                Err(DomainError::validation(format!(
                    "only confirmed reservations can be completed, status is {}",
                    current
                )))
            }
            ReservationStatus::Completed if !reservation.time_range().has_ended_at(now) => {
                Err(DomainError::validation(
                    "reservation cannot be completed before its end time",
                ))
            }
            ReservationStatus::Confirmed if current != ReservationStatus::Pending => {
                Err(DomainError::validation(format!(
                    "only pending reservations can be confirmed, status is {}",
                    current
                )))
            }
            ReservationStatus::Pending => Err(DomainError::validation(format!(
                "reservation cannot return to PENDING from {}",
                current
            ))),
            _ => Ok(()),
        }
    }

    /// `base_rate × duration_in_hours`, with the classification multiplier
    /// when enabled.
    pub fn calculate_reservation_amount(
        vehicle: &Vehicle,
        time_range: &TimeRange,
        base_rate: &Money,
        pricing: PricingPolicy,
    ) -> DomainResult<Money> {
        let rate = if pricing.classification_multiplier {
            base_rate.multiply(vehicle.classification().rate_multiplier())?
        } else {
            base_rate.clone()
        };
        rate.multiply(time_range.duration_in_hours())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{UserId, VehicleId};
    use crate::domain::reservation::ReservationSnapshot;
    use crate::domain::value_objects::VehicleClassification;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, hour, 0, 0).unwrap()
    }

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, "USD").unwrap()
    }

    fn booking(vehicle: &str, from: u32, to: u32, status: ReservationStatus) -> Reservation {
        let seed = Reservation::new(
            UserId::new("U1"),
            VehicleId::new(vehicle),
            TimeRange::restore(at(from), at(to)).unwrap(),
            usd(0),
        );
        let mut snapshot = seed.snapshot();
        snapshot.status = status;
        Reservation::restore(snapshot).unwrap()
    }

    fn overlap(candidate: &Reservation, existing: &[Reservation], policy: OverlapPolicy) -> bool {
        ReservationDomainService::validate_overlap(candidate, existing, policy).is_err()
    }

    fn transition(
        reservation: &Reservation,
        to: ReservationStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        ReservationDomainService::validate_status_change_at(reservation, to, now)
    }

    #[test]
    fn creation_requires_ids_and_future_start() {
        let ok = booking("V1", 10, 12, ReservationStatus::Pending);
        assert!(ReservationDomainService::validate_reservation_creation_at(&ok, at(9)).is_ok());
        assert!(ReservationDomainService::validate_reservation_creation_at(&ok, at(11)).is_err());

        let mut snapshot: ReservationSnapshot = ok.snapshot();
        snapshot.user_id = UserId::new("");
        let no_user = Reservation::restore(snapshot).unwrap();
        let err = ReservationDomainService::validate_reservation_creation_at(&no_user, at(9))
            .unwrap_err();
        assert!(err.to_string().contains("user id"));
    }

    #[test]
    fn confirmed_overlap_is_rejected() {
        let existing = vec![booking("V1", 10, 12, ReservationStatus::Confirmed)];
        let candidate = booking("V1", 11, 13, ReservationStatus::Pending);
        let err = ReservationDomainService::validate_overlap(
            &candidate,
            &existing,
            OverlapPolicy::default(),
        )
        .unwrap_err();
        assert!(err.is_overlap());
    }

    #[test]
    fn touching_booking_is_allowed() {
        let existing = vec![booking("V1", 10, 12, ReservationStatus::Confirmed)];
        let candidate = booking("V1", 12, 14, ReservationStatus::Pending);
        assert!(!overlap(&candidate, &existing, OverlapPolicy::default()));
    }

    #[test]
    fn terminal_and_foreign_reservations_do_not_block() {
        let existing = vec![
            booking("V1", 10, 12, ReservationStatus::Canceled),
            booking("V1", 10, 12, ReservationStatus::Completed),
            booking("V2", 10, 12, ReservationStatus::Confirmed),
        ];
        let candidate = booking("V1", 11, 13, ReservationStatus::Pending);
        assert!(!overlap(&candidate, &existing, OverlapPolicy::IncludePending));
    }

    #[test]
    fn pending_blocks_only_under_include_pending() {
        let existing = vec![booking("V1", 10, 12, ReservationStatus::Pending)];
        let candidate = booking("V1", 11, 13, ReservationStatus::Pending);
        assert!(overlap(&candidate, &existing, OverlapPolicy::IncludePending));
        assert!(!overlap(&candidate, &existing, OverlapPolicy::ConfirmedOnly));
    }

    #[test]
    fn confirmation_is_blocked_only_by_confirmed_neighbours() {
        let candidate = booking("V1", 11, 13, ReservationStatus::Confirmed);
        let held = vec![booking("V1", 10, 12, ReservationStatus::Pending)];
        assert!(ReservationDomainService::validate_confirmation_overlap(&candidate, &held).is_ok());

        let taken = vec![booking("V1", 10, 12, ReservationStatus::Confirmed)];
        let err = ReservationDomainService::validate_confirmation_overlap(&candidate, &taken)
            .unwrap_err();
        assert!(err.is_overlap());
    }

    #[test]
    fn candidate_does_not_clash_with_itself() {
        let candidate = booking("V1", 10, 12, ReservationStatus::Confirmed);
        let existing = vec![candidate.clone()];
        assert!(!overlap(&candidate, &existing, OverlapPolicy::default()));
    }

    #[test]
    fn status_change_rules() {
        use ReservationStatus::*;
        let pending = booking("V1", 10, 12, Pending);
        let confirmed = booking("V1", 10, 12, Confirmed);
        let canceled = booking("V1", 10, 12, Canceled);
        let completed = booking("V1", 10, 12, Completed);
        let during = at(11);
        let after = at(12) + Duration::minutes(1);

        assert!(transition(&pending, Pending, during).is_ok());
        assert!(transition(&pending, Canceled, during).is_ok());
        assert!(transition(&confirmed, Canceled, during).is_ok());
        assert!(transition(&canceled, Canceled, during).is_ok());
        assert!(transition(&completed, Canceled, during).is_err());
        assert!(transition(&pending, Completed, after).is_err());
        assert!(transition(&confirmed, Completed, during).is_err());
        assert!(transition(&confirmed, Completed, after).is_ok());
        assert!(transition(&confirmed, Pending, during).is_err());
        assert!(transition(&canceled, Confirmed, during).is_err());
    }

    #[test]
    fn amount_is_rate_times_hours() {
        let vehicle = Vehicle::new("A8", "LUX0001", 2023, VehicleClassification::Luxury).unwrap();
        let range = TimeRange::restore(at(10), at(12)).unwrap();
        let rate = usd(5000);

        let flat = ReservationDomainService::calculate_reservation_amount(
            &vehicle,
            &range,
            &rate,
            PricingPolicy::default(),
        )
        .unwrap();
        assert_eq!(flat, usd(10_000));

        let classed = ReservationDomainService::calculate_reservation_amount(
            &vehicle,
            &range,
            &rate,
            PricingPolicy { classification_multiplier: true },
        )
        .unwrap();
        assert_eq!(classed.amount(), Decimal::from(200));
    }
}
