use async_trait::async_trait;

use super::model::Vehicle;
use crate::domain::entity::VehicleId;
use crate::domain::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert a new vehicle. Duplicate ids or plates are rejected.
    async fn save(&self, vehicle: Vehicle) -> DomainResult<()>;

    async fn find_by_id(&self, id: &VehicleId) -> DomainResult<Option<Vehicle>>;

    async fn find_by_plate(&self, plate: &str) -> DomainResult<Option<Vehicle>>;

    async fn update(&self, vehicle: Vehicle) -> DomainResult<()>;

    async fn delete(&self, id: &VehicleId) -> DomainResult<()>;

    async fn list(&self) -> DomainResult<Vec<Vehicle>>;
}
