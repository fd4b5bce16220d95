//! Infrastructure layer - external concerns

pub mod notifications;
pub mod payment;
pub mod storage;

pub use notifications::{EventJournal, LoggingNotifier};
pub use payment::SimulatedPaymentGateway;
pub use storage::InMemoryRepositories;
