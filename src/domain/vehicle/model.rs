//! Vehicle domain entity

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, VehicleId};
use crate::domain::value_objects::VehicleClassification;
use crate::domain::DomainResult;
use crate::shared::DomainError;

pub const PLATE_LENGTH: usize = 7;
pub const MIN_YEAR: i32 = 1900;

/// Vehicle operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    /// Bookable, no confirmed reservations
    Available,
    /// Bookable, holds at least one confirmed reservation
    Reserved,
    /// Temporarily out of the fleet
    Maintenance,
    /// Permanently out of the fleet
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Maintenance => "MAINTENANCE",
            Self::Retired => "RETIRED",
        }
    }
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VehicleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(Self::Available),
            "RESERVED" => Ok(Self::Reserved),
            "MAINTENANCE" => Ok(Self::Maintenance),
            "RETIRED" => Ok(Self::Retired),
            other => Err(DomainError::validation(format!("unknown vehicle status '{}'", other))),
        }
    }
}

/// Stored form of a vehicle. Restoring it keeps the status and the
/// reservation counter instead of starting from AVAILABLE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub model: String,
    pub plate: String,
    pub year: i32,
    pub status: VehicleStatus,
    pub classification: VehicleClassification,
    pub active_reservations: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rental vehicle
#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    id: VehicleId,
    model: String,
    plate: String,
    year: i32,
    status: VehicleStatus,
    classification: VehicleClassification,
    /// Confirmed, not yet finished reservations. Maintained by the
    /// reservation aggregate only.
    active_reservations: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entity for Vehicle {
    type Id = VehicleId;

    fn id(&self) -> &VehicleId {
        &self.id
    }
}

impl Vehicle {
    pub fn new(
        model: impl Into<String>,
        plate: &str,
        year: i32,
        classification: VehicleClassification,
    ) -> DomainResult<Self> {
        Self::with_id(VehicleId::generate(), model, plate, year, classification)
    }

    pub fn with_id(
        id: VehicleId,
        model: impl Into<String>,
        plate: &str,
        year: i32,
        classification: VehicleClassification,
    ) -> DomainResult<Self> {
        if id.is_blank() {
            return Err(DomainError::validation("vehicle id must not be empty"));
        }
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(DomainError::validation("vehicle model must not be empty"));
        }
        let plate = normalize_plate(plate)?;
        validate_year(year, Utc::now().year())?;

        let now = Utc::now();
        Ok(Self {
            id,
            model,
            plate,
            year,
            status: VehicleStatus::Available,
            classification,
            active_reservations: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Trusted reconstruction from storage. The registration-year window is
    /// not re-checked; RESERVED must agree with the reservation counter.
    pub fn restore(snapshot: VehicleSnapshot) -> DomainResult<Self> {
        if snapshot.id.is_blank() {
            return Err(DomainError::validation("vehicle id must not be empty"));
        }
        let plate = normalize_plate(&snapshot.plate)?;
        let reserved = snapshot.status == VehicleStatus::Reserved;
        let available = snapshot.status == VehicleStatus::Available;
        if (reserved && snapshot.active_reservations == 0)
            || (available && snapshot.active_reservations > 0)
        {
            return Err(DomainError::validation(format!(
                "vehicle {} is {} with {} active reservation(s)",
                snapshot.id, snapshot.status, snapshot.active_reservations
            )));
        }
        Ok(Self {
            id: snapshot.id,
            model: snapshot.model,
            plate,
            year: snapshot.year,
            status: snapshot.status,
            classification: snapshot.classification,
            active_reservations: snapshot.active_reservations,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        })
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id.clone(),
            model: self.model.clone(),
            plate: self.plate.clone(),
            year: self.year,
            status: self.status,
            classification: self.classification,
            active_reservations: self.active_reservations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn classification(&self) -> VehicleClassification {
        self.classification
    }

    pub fn active_reservations(&self) -> u32 {
        self.active_reservations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the vehicle accepts new bookings.
    pub fn is_available(&self) -> bool {
        matches!(self.status, VehicleStatus::Available | VehicleStatus::Reserved)
    }

    pub fn has_active_reservations(&self) -> bool {
        self.active_reservations > 0
    }

    /// Apply a status already cleared by `VehicleDomainService`.
    pub fn change_status(&mut self, status: VehicleStatus) {
        if self.status != status {
            self.status = status;
            self.touch();
        }
    }

    pub fn change_classification(&mut self, classification: VehicleClassification) {
        if self.classification != classification {
            self.classification = classification;
            self.touch();
        }
    }

    pub(crate) fn register_reservation(&mut self) {
        self.active_reservations += 1;
        if self.status == VehicleStatus::Available {
            self.status = VehicleStatus::Reserved;
        }
        self.touch();
    }

    pub(crate) fn release_reservation(&mut self) -> DomainResult<()> {
        if self.active_reservations == 0 {
            return Err(DomainError::validation(format!(
                "vehicle {} has no active reservation to release",
                self.id
            )));
        }
        self.active_reservations -= 1;
        if self.active_reservations == 0 && self.status == VehicleStatus::Reserved {
            self.status = VehicleStatus::Available;
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Plates are exactly seven ASCII letters or digits, stored upper-case.
fn normalize_plate(raw: &str) -> DomainResult<String> {
    let plate = raw.trim().to_ascii_uppercase();
    if plate.len() != PLATE_LENGTH || !plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::validation(format!(
            "invalid plate '{}': expected {} alphanumeric characters",
            raw.trim(),
            PLATE_LENGTH
        )));
    }
    Ok(plate)
}

fn validate_year(year: i32, current_year: i32) -> DomainResult<()> {
    if year < MIN_YEAR || year > current_year + 1 {
        return Err(DomainError::validation(format!(
            "invalid year {}: must be between {} and {}",
            year,
            MIN_YEAR,
            current_year + 1
        )));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vehicle() -> Vehicle {
        Vehicle::new("Corolla", "abc1234", 2022, VehicleClassification::Economy).unwrap()
    }

    #[test]
    fn new_vehicle_is_available() {
        let v = sample_vehicle();
        assert_eq!(v.status(), VehicleStatus::Available);
        assert_eq!(v.plate(), "ABC1234");
        assert!(v.is_available());
        assert_eq!(v.active_reservations(), 0);
    }

    #[test]
    fn plate_format_is_enforced() {
        for bad in ["ABC123", "ABC12345", "ABC-123", "ÄBC1234", ""] {
            assert!(
                Vehicle::new("Corolla", bad, 2022, VehicleClassification::Economy).is_err(),
                "accepted plate {:?}",
                bad
            );
        }
    }

    #[test]
    fn year_bounds() {
        let next_year = Utc::now().year() + 1;
        assert!(Vehicle::new("Model T", "FORD001", 1900, VehicleClassification::Economy).is_ok());
        assert!(Vehicle::new("Model T", "FORD001", 1899, VehicleClassification::Economy).is_err());
        let future = |year| Vehicle::new("Future", "NEXT001", year, VehicleClassification::Economy);
        assert!(future(next_year).is_ok());
        assert!(future(next_year + 1).is_err());
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(Vehicle::new("  ", "ABC1234", 2022, VehicleClassification::Economy).is_err());
    }

    #[test]
    fn reservation_counter_drives_reserved_status() {
        let mut v = sample_vehicle();
        v.register_reservation();
        v.register_reservation();
        assert_eq!(v.status(), VehicleStatus::Reserved);
        assert!(v.is_available());

        v.release_reservation().unwrap();
        assert_eq!(v.status(), VehicleStatus::Reserved);
        v.release_reservation().unwrap();
        assert_eq!(v.status(), VehicleStatus::Available);
        assert!(v.release_reservation().is_err());
    }

    #[test]
    fn maintenance_vehicle_is_not_available() {
        let mut v = sample_vehicle();
        v.change_status(VehicleStatus::Maintenance);
        assert!(!v.is_available());
        v.change_status(VehicleStatus::Retired);
        assert!(!v.is_available());
    }

    #[test]
    fn identity_survives_state_changes() {
        let v = sample_vehicle();
        let mut changed = v.clone();
        changed.change_classification(VehicleClassification::Luxury);
        assert!(v.same_identity(&changed));
        assert!(!v.same_identity(&sample_vehicle()));
    }

    #[test]
    fn snapshot_restores_reserved_vehicle_with_its_counter() {
        let mut v = sample_vehicle();
        v.register_reservation();
        v.register_reservation();

        let restored = Vehicle::restore(v.snapshot()).unwrap();
        assert!(restored.same_identity(&v));
        assert_eq!(restored.status(), VehicleStatus::Reserved);
        assert_eq!(restored.active_reservations(), 2);
        assert_eq!(restored.created_at(), v.created_at());
        assert_eq!(restored.snapshot(), v.snapshot());

        let mut restored = restored;
        restored.release_reservation().unwrap();
        restored.release_reservation().unwrap();
        assert_eq!(restored.status(), VehicleStatus::Available);
    }

    #[test]
    fn restore_keeps_out_of_range_year_but_rejects_bad_state() {
        let mut snapshot = sample_vehicle().snapshot();
        snapshot.year = 1850;
        snapshot.status = VehicleStatus::Retired;
        assert_eq!(Vehicle::restore(snapshot.clone()).unwrap().year(), 1850);

        snapshot.status = VehicleStatus::Reserved;
        assert!(Vehicle::restore(snapshot.clone()).is_err());

        snapshot.status = VehicleStatus::Available;
        snapshot.plate = "bad".into();
        assert!(Vehicle::restore(snapshot).is_err());
    }

    #[test]
    fn status_parses_from_name() {
        assert_eq!("maintenance".parse::<VehicleStatus>().unwrap(), VehicleStatus::Maintenance);
        assert!("broken".parse::<VehicleStatus>().is_err());
    }
}
