//! Per-vehicle and per-user write locks
//!
//! Every write that touches a vehicle (and optionally a user) runs while
//! holding that vehicle's lock, then the user's. The order is fixed, so two
//! use cases can never wait on each other in reverse.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{UserId, VehicleId};

type Registry<K> = Arc<DashMap<K, Arc<Mutex<()>>>>;

#[derive(Default)]
pub struct BookingLocks {
    vehicles: Registry<VehicleId>,
    users: Registry<UserId>,
}

/// Held for the duration of one write use case.
pub struct BookingGuard {
    _vehicle: Option<HeldLock<VehicleId>>,
    _user: Option<HeldLock<UserId>>,
}

/// One locked registry entry. Dropping the last handle to a mutex removes
/// its entry, so the registries only hold ids with a write in flight.
struct HeldLock<K: Eq + Hash> {
    registry: Registry<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for HeldLock<K> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone of the Arc, so the count stays above one
        // until the last of them is done.
        self.registry
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

pub type SharedBookingLocks = Arc<BookingLocks>;

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedBookingLocks {
        Arc::new(Self::new())
    }

    /// Lock the vehicle, then the user.
    pub async fn acquire(&self, vehicle_id: &VehicleId, user_id: &UserId) -> BookingGuard {
        let vehicle = lock(&self.vehicles, vehicle_id).await;
        let user = lock(&self.users, user_id).await;
        BookingGuard {
            _vehicle: Some(vehicle),
            _user: Some(user),
        }
    }

    pub async fn acquire_vehicle(&self, vehicle_id: &VehicleId) -> BookingGuard {
        BookingGuard {
            _vehicle: Some(lock(&self.vehicles, vehicle_id).await),
            _user: None,
        }
    }

    pub async fn acquire_user(&self, user_id: &UserId) -> BookingGuard {
        BookingGuard {
            _vehicle: None,
            _user: Some(lock(&self.users, user_id).await),
        }
    }

    /// Number of vehicle and user entries currently registered.
    pub fn tracked(&self) -> usize {
        self.vehicles.len() + self.users.len()
    }
}

async fn lock<K: Eq + Hash + Clone>(registry: &Registry<K>, key: &K) -> HeldLock<K> {
    let mutex = registry.entry(key.clone()).or_default().clone();
    let guard = mutex.lock_owned().await;
    HeldLock {
        registry: registry.clone(),
        key: key.clone(),
        guard: Some(guard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_vehicle_is_exclusive() {
        let locks = BookingLocks::shared();
        let vehicle = VehicleId::new("V1");
        let guard = locks.acquire(&vehicle, &UserId::new("U1")).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(20),
            locks.acquire(&vehicle, &UserId::new("U2")),
        )
        .await;
        assert!(blocked.is_err());

        drop(guard);
        let _again = locks.acquire_vehicle(&vehicle).await;
    }

    #[tokio::test]
    async fn released_entries_are_removed() {
        let locks = BookingLocks::shared();
        for i in 0..10 {
            let _guard = locks
                .acquire(&VehicleId::new(format!("V{}", i)), &UserId::new("U1"))
                .await;
            assert_eq!(locks.tracked(), 2);
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = BookingLocks::shared();
        let vehicle = VehicleId::new("V1");
        let guard = locks.acquire_vehicle(&vehicle).await;

        let waiter = {
            let locks = locks.clone();
            let vehicle = vehicle.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire_vehicle(&vehicle).await;
                locks.tracked()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        // the waiter locked the same entry rather than a fresh one
        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn different_vehicles_do_not_contend() {
        let locks = BookingLocks::new();
        let _a = locks.acquire_vehicle(&VehicleId::new("V1")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(20),
            locks.acquire_vehicle(&VehicleId::new("V2")),
        )
        .await;
        assert!(b.is_ok());
    }
}
