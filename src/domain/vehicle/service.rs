use super::model::{Vehicle, VehicleStatus};
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Pre-condition guards for administrative vehicle changes.
pub struct VehicleDomainService;

impl VehicleDomainService {
    pub fn validate_status_change(
        vehicle: &Vehicle,
        new_status: VehicleStatus,
    ) -> DomainResult<()> {
        let current = vehicle.status();
        if current == new_status {
            return Ok(());
        }
        if current == VehicleStatus::Retired {
            return Err(DomainError::validation(format!(
                "vehicle {} is retired and cannot change status",
                vehicle.plate()
            )));
        }

        let reserved = current == VehicleStatus::Reserved || vehicle.has_active_reservations();
        match new_status {
            VehicleStatus::Maintenance | VehicleStatus::Retired if reserved => {
                Err(DomainError::validation(format!(
                    "vehicle {} has active reservations and cannot move to {}",
                    vehicle.plate(),
                    new_status
                )))
            }
            VehicleStatus::Available if vehicle.has_active_reservations() => {
                Err(DomainError::validation(format!(
                    "vehicle {} has active reservations and stays RESERVED",
                    vehicle.plate()
                )))
            }
            VehicleStatus::Reserved => Err(DomainError::validation(
                "RESERVED is set by confirmed reservations, not by hand",
            )),
            _ => Ok(()),
        }
    }

    pub fn validate_deletion(vehicle: &Vehicle) -> DomainResult<()> {
        if vehicle.has_active_reservations() || vehicle.status() == VehicleStatus::Reserved {
            return Err(DomainError::validation(format!(
                "vehicle {} has {} active reservation(s) and cannot be deleted",
                vehicle.plate(),
                vehicle.active_reservations()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::VehicleClassification;

    fn vehicle() -> Vehicle {
        Vehicle::new("Golf", "GOLF001", 2021, VehicleClassification::Compact).unwrap()
    }

    fn reserved_vehicle() -> Vehicle {
        let mut v = vehicle();
        v.register_reservation();
        v
    }

    fn allowed(vehicle: &Vehicle, to: VehicleStatus) -> bool {
        VehicleDomainService::validate_status_change(vehicle, to).is_ok()
    }

    #[test]
    fn maintenance_and_retirement_blocked_while_reserved() {
        let v = reserved_vehicle();
        assert!(!allowed(&v, VehicleStatus::Maintenance));
        assert!(!allowed(&v, VehicleStatus::Retired));
        assert!(!allowed(&v, VehicleStatus::Available));
    }

    #[test]
    fn free_vehicle_can_go_to_maintenance_and_back() {
        let mut v = vehicle();
        VehicleDomainService::validate_status_change(&v, VehicleStatus::Maintenance).unwrap();
        v.change_status(VehicleStatus::Maintenance);
        VehicleDomainService::validate_status_change(&v, VehicleStatus::Available).unwrap();
    }

    #[test]
    fn retired_is_terminal() {
        let mut v = vehicle();
        v.change_status(VehicleStatus::Retired);
        assert!(!allowed(&v, VehicleStatus::Available));
        assert!(allowed(&v, VehicleStatus::Retired));
    }

    #[test]
    fn reserved_cannot_be_set_manually() {
        assert!(!allowed(&vehicle(), VehicleStatus::Reserved));
    }

    #[test]
    fn deletion_requires_no_active_reservations() {
        assert!(VehicleDomainService::validate_deletion(&vehicle()).is_ok());
        assert!(VehicleDomainService::validate_deletion(&reserved_vehicle()).is_err());
    }
}
