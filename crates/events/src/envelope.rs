use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a published event.
///
/// `event_id` is UUIDv7 so envelopes sort by publication time even when
/// `occurred_at` values collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, occurred_at: DateTime<Utc>, payload: E) -> Self {
        Self {
            event_id,
            occurred_at,
            payload,
        }
    }

    /// Wrap a payload with a fresh id and the current time.
    pub fn now(payload: E) -> Self {
        Self::new(Uuid::now_v7(), Utc::now(), payload)
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
