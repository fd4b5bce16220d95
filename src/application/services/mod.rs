//! Application services (use cases)

mod fleet;
mod hold_expiry;
mod locks;
pub(crate) mod reservation;

pub use fleet::{FleetService, RegisterUser, RegisterVehicle};
pub use hold_expiry::start_hold_expiry_task;
pub use locks::{BookingGuard, BookingLocks, SharedBookingLocks};
pub use reservation::{BookingSettings, CreateReservation, ReservationService, HOLD_EXPIRED_REASON};
