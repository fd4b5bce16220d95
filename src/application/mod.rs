pub mod events;
pub mod ports;
pub mod services;

// Re-export key types for convenience
pub use events::{create_event_bus, EventBus, EventHandler, SharedEventBus};
pub use ports::{PaymentGateway, PaymentResult, SharedPaymentGateway};
pub use services::{
    start_hold_expiry_task, BookingLocks, BookingSettings, CreateReservation, FleetService,
    RegisterUser, RegisterVehicle, ReservationService,
};
