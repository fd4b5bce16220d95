//! Application ports (hexagonal architecture boundaries)
//!
//! Repository ports are defined in `domain::repositories`. Outbound ports
//! to external systems live here.

pub mod outbound;

pub use outbound::{PaymentGateway, PaymentResult, SharedPaymentGateway};
