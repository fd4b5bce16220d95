//! Application events (pub/sub)
//!
//! Event types are defined in `domain::events`. The `EventBus` that
//! dispatches them to handlers lives here in the application layer.

pub mod event_bus;

pub use crate::domain::events::types::*;

pub use event_bus::{
    create_event_bus, handler_fn, EventBus, EventHandler, FnHandler, HandlerError,
    SharedEventBus, SharedEventHandler,
};
