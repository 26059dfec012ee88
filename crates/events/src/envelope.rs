use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Event;

/// Envelope for an event: delivery identity around an immutable payload.
///
/// The `event_id` identifies one *publication*, not the business fact —
/// handlers deduplicate on business keys (invoice voucher, movement
/// reference), never on the envelope id, since a redelivery after a crash
/// carries a fresh envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    pub fn wrap(payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, payload: E) -> Self {
        Self { event_id, payload }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
