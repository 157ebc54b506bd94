//! Sale lifecycle hooks.
//!
//! Interested parties register async closures in [`EventHooks`]. [`EventHandlers`] turns them into channel-backed
//! handlers, and the engine APIs publish through the matching [`EventProducers`].
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
