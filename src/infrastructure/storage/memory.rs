//! In-memory storage implementation
//!
//! Reservations are sharded by vehicle: the overlap check and the insert of
//! a new reservation run under the same `DashMap` entry guard, so two
//! concurrent saves for one vehicle cannot both pass the check.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{
    CommitMode, DomainError, DomainResult, Email, Entity, OverlapPolicy, RepositoryProvider,
    Reservation, ReservationAggregate, ReservationDomainService, ReservationId,
    ReservationRepository, ReservationStatus, TimeRange, User, UserId, UserRepository, Vehicle,
    VehicleId, VehicleRepository,
};

// ── Vehicles ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: DashMap<VehicleId, Vehicle>,
    plates: DashMap<String, VehicleId>,
    /// Reads left to fail with a persistence error.
    failing_reads: AtomicU32,
}

impl InMemoryVehicleRepository {
    /// Make the next `count` reads fail with [`DomainError::Persistence`].
    pub fn fail_next_reads(&self, count: u32) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    fn check_read(&self) -> DomainResult<()> {
        let injected = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(DomainError::Persistence("vehicle store unavailable".into()));
        }
        Ok(())
    }

    fn replace(&self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id().clone(), vehicle);
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn save(&self, vehicle: Vehicle) -> DomainResult<()> {
        if self.vehicles.contains_key(vehicle.id()) {
            return Err(DomainError::validation(format!(
                "vehicle {} already exists",
                vehicle.id()
            )));
        }
        match self.plates.entry(vehicle.plate().to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(DomainError::validation(format!(
                    "plate {} is already registered",
                    vehicle.plate()
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(vehicle.id().clone());
            }
        }
        self.vehicles.insert(vehicle.id().clone(), vehicle);
        Ok(())
    }

    async fn find_by_id(&self, id: &VehicleId) -> DomainResult<Option<Vehicle>> {
        self.check_read()?;
        Ok(self.vehicles.get(id).map(|v| v.clone()))
    }

    async fn find_by_plate(&self, plate: &str) -> DomainResult<Option<Vehicle>> {
        self.check_read()?;
        let id = match self.plates.get(&plate.to_uppercase()) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        Ok(self.vehicles.get(&id).map(|v| v.clone()))
    }

    async fn update(&self, vehicle: Vehicle) -> DomainResult<()> {
        if !self.vehicles.contains_key(vehicle.id()) {
            return Err(DomainError::not_found("Vehicle", "id", vehicle.id()));
        }
        self.replace(vehicle);
        Ok(())
    }

    async fn delete(&self, id: &VehicleId) -> DomainResult<()> {
        let (_, vehicle) = self
            .vehicles
            .remove(id)
            .ok_or_else(|| DomainError::not_found("Vehicle", "id", id))?;
        self.plates.remove(vehicle.plate());
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<Vehicle>> {
        self.check_read()?;
        let mut vehicles: Vec<Vehicle> = self.vehicles.iter().map(|e| e.value().clone()).collect();
        vehicles.sort_by(|a, b| a.plate().cmp(b.plate()));
        Ok(vehicles)
    }
}

// ── Users ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
}

impl InMemoryUserRepository {
    fn replace(&self, user: User) {
        self.users.insert(user.id().clone(), user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: User) -> DomainResult<()> {
        if self.users.contains_key(user.id()) {
            return Err(DomainError::validation(format!("user {} already exists", user.id())));
        }
        match self.emails.entry(user.email().as_str().to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(DomainError::validation(format!(
                    "email {} is already registered",
                    user.email()
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.id().clone());
            }
        }
        self.users.insert(user.id().clone(), user);
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> DomainResult<Option<User>> {
        let id = match self.emails.get(email.as_str()) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn update(&self, user: User) -> DomainResult<()> {
        if !self.users.contains_key(user.id()) {
            return Err(DomainError::not_found("User", "id", user.id()));
        }
        self.replace(user);
        Ok(())
    }
}

// ── Reservations ───────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryReservationRepository {
    /// Reservations grouped by vehicle; the entry guard is the per-vehicle lock.
    by_vehicle: DashMap<VehicleId, Vec<Reservation>>,
    /// Reservation id → owning vehicle. Never held while locking `by_vehicle`.
    index: DashMap<ReservationId, VehicleId>,
}

impl InMemoryReservationRepository {
    fn insert_checked(&self, reservation: Reservation, policy: OverlapPolicy) -> DomainResult<()> {
        if self.index.contains_key(reservation.id()) {
            return Err(DomainError::validation(format!(
                "reservation {} already exists",
                reservation.id()
            )));
        }

        let vehicle_id = reservation.vehicle_id().clone();
        let mut slot = self.by_vehicle.entry(vehicle_id.clone()).or_default();
        ReservationDomainService::validate_overlap(&reservation, slot.as_slice(), policy)?;

        debug!(
            reservation_id = %reservation.id(),
            vehicle_id = %vehicle_id,
            "Reservation stored"
        );
        self.index.insert(reservation.id().clone(), vehicle_id);
        slot.push(reservation);
        Ok(())
    }

    fn owner_of(&self, id: &ReservationId) -> Option<VehicleId> {
        self.index.get(id).map(|v| v.clone())
    }

    fn replace(&self, reservation: Reservation) -> DomainResult<()> {
        let vehicle_id = self
            .owner_of(reservation.id())
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation.id()))?;
        if &vehicle_id != reservation.vehicle_id() {
            return Err(DomainError::validation(format!(
                "reservation {} cannot move from vehicle {} to {}",
                reservation.id(),
                vehicle_id,
                reservation.vehicle_id()
            )));
        }
        let mut slot = self
            .by_vehicle
            .get_mut(&vehicle_id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation.id()))?;
        // A confirmation must not land on a slot another confirmed
        // reservation already holds. Checked under the same shard guard.
        if reservation.status() == ReservationStatus::Confirmed {
            ReservationDomainService::validate_confirmation_overlap(&reservation, slot.as_slice())?;
        }
        let stored = slot
            .iter_mut()
            .find(|r| r.same_identity(&reservation))
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation.id()))?;
        *stored = reservation;
        Ok(())
    }

    fn collect(&self, predicate: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        let mut found: Vec<Reservation> = self
            .by_vehicle
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|r| predicate(r))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        found.sort_by_key(|r| r.time_range().start_time());
        found
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn save(&self, reservation: Reservation, policy: OverlapPolicy) -> DomainResult<()> {
        self.insert_checked(reservation, policy)
    }

    async fn find_by_id(&self, id: &ReservationId) -> DomainResult<Option<Reservation>> {
        let Some(vehicle_id) = self.owner_of(id) else {
            return Ok(None);
        };
        Ok(self
            .by_vehicle
            .get(&vehicle_id)
            .and_then(|slot| slot.iter().find(|r| r.id() == id).cloned()))
    }

    async fn update(&self, reservation: Reservation) -> DomainResult<()> {
        self.replace(reservation)
    }

    async fn find_overlapping(
        &self,
        vehicle_id: &VehicleId,
        range: &TimeRange,
    ) -> DomainResult<Vec<Reservation>> {
        Ok(self
            .by_vehicle
            .get(vehicle_id)
            .map(|slot| {
                slot.iter()
                    .filter(|r| r.is_active() && r.time_range().overlaps(range))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_for_user(&self, user_id: &UserId) -> DomainResult<Vec<Reservation>> {
        Ok(self.collect(|r| r.user_id() == user_id))
    }

    async fn find_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DomainResult<Vec<Reservation>> {
        Ok(self.collect(|r| r.status() == ReservationStatus::Pending && r.created_at() < cutoff))
    }
}

// ── Provider ───────────────────────────────────────────────────

/// In-memory store for development and testing
#[derive(Default)]
pub struct InMemoryRepositories {
    vehicles: InMemoryVehicleRepository,
    users: InMemoryUserRepository,
    reservations: InMemoryReservationRepository,
    /// Serialises aggregate commits so a commit is never observed half-written.
    commit_lock: Mutex<()>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vehicle_store(&self) -> &InMemoryVehicleRepository {
        &self.vehicles
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositories {
    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    async fn commit(&self, aggregate: &ReservationAggregate, mode: CommitMode) -> DomainResult<()> {
        let _guard = self.commit_lock.lock().await;

        let vehicle = aggregate.vehicle();
        let user = aggregate.user();
        let reservation = aggregate.reservation();

        if !self.vehicles.vehicles.contains_key(vehicle.id()) {
            return Err(DomainError::not_found("Vehicle", "id", vehicle.id()));
        }
        if !self.users.users.contains_key(user.id()) {
            return Err(DomainError::not_found("User", "id", user.id()));
        }

        match mode {
            CommitMode::Create(policy) => {
                self.reservations.insert_checked(reservation.clone(), policy)?;
            }
            CommitMode::Update => {
                self.reservations.replace(reservation.clone())?;
            }
        }
        self.vehicles.replace(vehicle.clone());
        self.users.replace(user.clone());

        debug!(
            reservation_id = %reservation.id(),
            status = %reservation.status(),
            ?mode,
            "Aggregate committed"
        );
        Ok(())
    }
}
