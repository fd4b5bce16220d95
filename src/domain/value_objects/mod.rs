//! Immutable, self-validating domain primitives

pub mod classification;
pub mod email;
pub mod money;
pub mod password;
pub mod time_range;

pub use classification::VehicleClassification;
pub use email::Email;
pub use money::Money;
pub use password::Password;
pub use time_range::TimeRange;
