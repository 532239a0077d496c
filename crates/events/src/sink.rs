//! Fire-and-forget emit seam used by the authorization layer.

use crate::bus::EventBus;
use crate::envelope::EventEnvelope;
use crate::event::RbacEvent;

/// Receives RBAC change events after a successful write.
///
/// `emit` never fails: a write that already reached storage must not be
/// reported as failed because nobody could be told about it.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RbacEvent);
}

impl<B> EventSink for B
where
    B: EventBus<EventEnvelope<RbacEvent>>,
{
    fn emit(&self, event: RbacEvent) {
        let event_type = event.event_type();
        if let Err(e) = self.publish(EventEnvelope::now(event)) {
            tracing::warn!(event_type, error = ?e, "rbac event publish failed");
        }
    }
}

/// Sink that drops everything (no subscribers configured).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: RbacEvent) {}
}
