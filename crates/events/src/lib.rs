//! Change notifications for roles and user-role assignments.
//!
//! Storage stays the source of truth; these events only tell interested
//! consumers (SSE relays, caches) that something changed.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod sink;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::RbacEvent;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use sink::{EventSink, NoopSink};
