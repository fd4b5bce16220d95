//! Vehicle and user administration
//!
//! Status changes go through the domain services' guards and take the same
//! per-vehicle / per-user locks as the reservation use cases, so an admin
//! change cannot interleave with a booking of the same vehicle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::locks::{BookingLocks, SharedBookingLocks};
use crate::domain::entity::Entity;
use crate::domain::{
    DomainError, DomainResult, Email, Password, RepositoryProvider, TimeRange, User,
    UserDomainService, UserId, UserRole, UserStatus, Vehicle, VehicleClassification,
    VehicleDomainService, VehicleId, VehicleStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterVehicle {
    pub model: String,
    pub plate: String,
    pub year: i32,
    pub classification: VehicleClassification,
}

#[derive(Clone, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub reservation_quota: u32,
}

pub struct FleetService {
    repos: Arc<dyn RepositoryProvider>,
    locks: SharedBookingLocks,
    password_cost: u32,
}

impl FleetService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            repos,
            locks: BookingLocks::shared(),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_locks(mut self, locks: SharedBookingLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    // ── Vehicles ───────────────────────────────────────────────

    pub async fn register_vehicle(&self, cmd: RegisterVehicle) -> DomainResult<Vehicle> {
        let vehicle = Vehicle::new(cmd.model, &cmd.plate, cmd.year, cmd.classification)?;
        if self.repos.vehicles().find_by_plate(vehicle.plate()).await?.is_some() {
            return Err(DomainError::validation(format!(
                "plate {} is already registered",
                vehicle.plate()
            )));
        }
        self.repos.vehicles().save(vehicle.clone()).await?;

        metrics::counter!("vehicles_registered_total").increment(1);
        info!(
            vehicle_id = %vehicle.id(),
            plate = vehicle.plate(),
            classification = %vehicle.classification(),
            "Vehicle registered"
        );
        Ok(vehicle)
    }

    pub async fn change_vehicle_status(
        &self,
        id: &VehicleId,
        status: VehicleStatus,
    ) -> DomainResult<Vehicle> {
        let _guard = self.locks.acquire_vehicle(id).await;
        let mut vehicle = self.load_vehicle(id).await?;

        VehicleDomainService::validate_status_change(&vehicle, status)?;
        let previous = vehicle.status();
        vehicle.change_status(status);
        self.repos.vehicles().update(vehicle.clone()).await?;

        info!(vehicle_id = %id, from = %previous, to = %status, "Vehicle status changed");
        Ok(vehicle)
    }

    pub async fn change_vehicle_classification(
        &self,
        id: &VehicleId,
        classification: VehicleClassification,
    ) -> DomainResult<Vehicle> {
        let _guard = self.locks.acquire_vehicle(id).await;
        let mut vehicle = self.load_vehicle(id).await?;

        vehicle.change_classification(classification);
        self.repos.vehicles().update(vehicle.clone()).await?;

        info!(vehicle_id = %id, classification = %classification, "Vehicle reclassified");
        Ok(vehicle)
    }

    /// Deletes a vehicle with no confirmed reservations and no open holds.
    pub async fn delete_vehicle(&self, id: &VehicleId) -> DomainResult<()> {
        let _guard = self.locks.acquire_vehicle(id).await;
        let vehicle = self.load_vehicle(id).await?;
        VehicleDomainService::validate_deletion(&vehicle)?;

        let all_time = TimeRange::restore(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)?;
        let open = self
            .repos
            .reservations()
            .find_overlapping(id, &all_time)
            .await?;
        if !open.is_empty() {
            return Err(DomainError::validation(format!(
                "vehicle {} has {} open reservation(s) and cannot be deleted",
                vehicle.plate(),
                open.len()
            )));
        }

        self.repos.vehicles().delete(id).await?;
        info!(vehicle_id = %id, plate = vehicle.plate(), "Vehicle deleted");
        Ok(())
    }

    pub async fn list_vehicles(&self) -> DomainResult<Vec<Vehicle>> {
        self.repos.vehicles().list().await
    }

    // ── Users ──────────────────────────────────────────────────

    pub async fn register_user(&self, cmd: RegisterUser) -> DomainResult<User> {
        let email = Email::parse(&cmd.email)?;
        if self.repos.users().find_by_email(&email).await?.is_some() {
            return Err(DomainError::validation(format!(
                "email {} is already registered",
                email
            )));
        }

        // bcrypt is CPU-bound; keep it off the async workers.
        let cost = self.password_cost;
        let plain = cmd.password;
        let hashed =
            tokio::task::spawn_blocking(move || Password::from_plain_with_cost(&plain, cost)).await;
        let password = hashed.map_err(|e| {
            DomainError::Persistence(format!("password hashing task failed: {}", e))
        })??;

        let user = User::new(cmd.name, email, password, cmd.role, cmd.reservation_quota)?;
        self.repos.users().save(user.clone()).await?;

        metrics::counter!("users_registered_total").increment(1);
        info!(user_id = %user.id(), email = %user.email(), role = %user.role(), "User registered");
        Ok(user)
    }

    /// `actor_id` performs the change on `target_id`.
    pub async fn change_user_status(
        &self,
        actor_id: &UserId,
        target_id: &UserId,
        status: UserStatus,
    ) -> DomainResult<User> {
        let _guard = self.locks.acquire_user(target_id).await;
        let mut target = self.load_user(target_id).await?;
        let actor = if actor_id == target_id {
            target.clone()
        } else {
            self.load_user(actor_id).await?
        };

        UserDomainService::validate_status_change(&actor, &target, status)?;
        let previous = target.status();
        target.change_status(status);
        self.repos.users().update(target.clone()).await?;

        info!(
            actor_id = %actor_id,
            user_id = %target_id,
            from = %previous,
            to = %status,
            "User status changed"
        );
        Ok(target)
    }

    /// Look up a user by e-mail and check the password.
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<User> {
        let invalid = || DomainError::validation("invalid email or password");
        let email = Email::parse(email).map_err(|_| invalid())?;
        let user = self.repos.users().find_by_email(&email).await?.ok_or_else(invalid)?;
        if !user.verify_password(password) {
            return Err(invalid());
        }
        if !user.is_active() {
            return Err(DomainError::validation(format!("user {} is {}", user.id(), user.status())));
        }
        Ok(user)
    }

    async fn load_vehicle(&self, id: &VehicleId) -> DomainResult<Vehicle> {
        self.repos
            .vehicles()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "id", id))
    }

    async fn load_user(&self, id: &UserId) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }
}
