//! Outbound notifications (low stock, order completed, return requested, ...).
//!
//! Services call [`NotificationEmitter::emit`] after every committed state
//! transition. Emission is fire-and-forget: it never fails the operation and
//! never feeds back into control flow.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use outletops_core::OutletId;

use crate::{Event, EventBus};

/// A committed fact, shaped for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: Uuid,
    /// Stable type identifier (e.g. "inventory.stock.low").
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: String,
    /// Outlet the fact concerns; `None` for catalog-wide facts.
    pub outlet_id: Option<OutletId>,
    pub occurred_at: DateTime<Utc>,
    pub payload: JsonValue,
}

impl Notification {
    pub fn new(
        event_type: impl Into<String>,
        aggregate_type: impl Into<String>,
        aggregate_id: impl ToString,
        outlet_id: Option<OutletId>,
        payload: JsonValue,
    ) -> Self {
        Self {
            notification_id: Uuid::now_v7(),
            event_type: event_type.into(),
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.to_string(),
            outlet_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Wrap a domain event; its serialized form becomes the payload.
    pub fn from_event<E>(
        event: &E,
        aggregate_type: impl Into<String>,
        aggregate_id: impl ToString,
        outlet_id: Option<OutletId>,
    ) -> Self
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event).unwrap_or_else(|e| {
            tracing::warn!(event_type = event.event_type(), "failed to serialize event payload: {e}");
            JsonValue::Null
        });

        Self {
            occurred_at: event.occurred_at(),
            ..Self::new(event.event_type(), aggregate_type, aggregate_id, outlet_id, payload)
        }
    }
}

/// External collaborator informed of state changes.
pub trait NotificationEmitter: Send + Sync {
    fn emit(&self, notification: Notification);
}

impl<T> NotificationEmitter for Arc<T>
where
    T: NotificationEmitter + ?Sized,
{
    fn emit(&self, notification: Notification) {
        (**self).emit(notification)
    }
}

/// Emitter that publishes onto an [`EventBus`]; publish failures are logged.
#[derive(Debug)]
pub struct BusNotificationEmitter<B> {
    bus: B,
}

impl<B> BusNotificationEmitter<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> NotificationEmitter for BusNotificationEmitter<B>
where
    B: EventBus<Notification>,
{
    fn emit(&self, notification: Notification) {
        let event_type = notification.event_type.clone();
        if let Err(e) = self.bus.publish(notification) {
            tracing::warn!(event_type, "notification publish failed: {e:?}");
        }
    }
}

/// Emitter that keeps everything it was given (tests/dev).
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    inner: Mutex<Vec<Notification>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.inner.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.all().into_iter().map(|n| n.event_type).collect()
    }
}

impl NotificationEmitter for RecordingEmitter {
    fn emit(&self, notification: Notification) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryEventBus;

    #[derive(Debug, Clone, Serialize)]
    struct Ping {
        at: DateTime<Utc>,
    }

    impl Event for Ping {
        fn event_type(&self) -> &'static str {
            "test.ping"
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn from_event_keeps_type_time_and_payload() {
        let at = Utc::now();
        let outlet = OutletId::new();
        let n = Notification::from_event(&Ping { at }, "test", "agg-1", Some(outlet));

        assert_eq!(n.event_type, "test.ping");
        assert_eq!(n.occurred_at, at);
        assert_eq!(n.outlet_id, Some(outlet));
        assert_eq!(n.aggregate_id, "agg-1");
        assert!(n.payload.get("at").is_some());
    }

    #[test]
    fn bus_emitter_publishes_to_subscribers() {
        let bus: Arc<InMemoryEventBus<Notification>> = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let emitter = BusNotificationEmitter::new(bus.clone());

        emitter.emit(Notification::new("x.y", "x", "1", None, JsonValue::Null));

        assert_eq!(sub.try_recv().unwrap().event_type, "x.y");
    }
}
