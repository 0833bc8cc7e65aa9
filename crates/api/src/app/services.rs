//! Service wiring for the API process and the realtime notification bridge.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use outletops_auth::{Action, Actor, RoleGate};
use outletops_events::{BusNotificationEmitter, EventBus, InMemoryEventBus, Notification};
use outletops_infra::config::AppConfig;
use outletops_infra::services::ServiceRegistry;

type NotificationBus = Arc<InMemoryEventBus<Notification>>;

pub struct AppServices {
    pub registry: ServiceRegistry,
    realtime_tx: broadcast::Sender<Notification>,
    gate: RoleGate,
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<Notification> {
        &self.realtime_tx
    }

    /// Notifications without an outlet are catalog-wide and visible to everyone.
    pub fn is_visible(&self, actor: &Actor, notification: &Notification) -> bool {
        notification
            .outlet_id
            .is_none_or(|outlet| self.gate.can_view(actor, Action::ViewOrders, outlet))
    }
}

/// In-memory services publishing onto a bus that is bridged into a tokio
/// broadcast channel for SSE subscribers.
pub fn build_services(config: &AppConfig) -> AppServices {
    let bus: NotificationBus = Arc::new(InMemoryEventBus::new());
    let (realtime_tx, _realtime_rx) = broadcast::channel::<Notification>(config.notification_buffer);

    spawn_bridge(bus.clone(), realtime_tx.clone());

    let emitter = Arc::new(BusNotificationEmitter::new(bus));
    AppServices {
        registry: ServiceRegistry::in_memory(emitter, config.low_stock_threshold),
        realtime_tx,
        gate: RoleGate::new(),
    }
}

/// Forward bus messages into the broadcast channel. The thread ends once the
/// bus (owned by the emitter) is dropped.
fn spawn_bridge(bus: NotificationBus, realtime_tx: broadcast::Sender<Notification>) {
    let sub = bus.subscribe();
    drop(bus);

    let spawned = std::thread::Builder::new()
        .name("notification-bridge".to_string())
        .spawn(move || {
            while let Ok(notification) = sub.recv() {
                // No receivers is fine: nobody is streaming right now.
                let _ = realtime_tx.send(notification);
            }
            tracing::debug!("notification bridge stopped");
        });

    if let Err(e) = spawned {
        tracing::error!("failed to start notification bridge: {e}");
    }
}

/// SSE stream of the notifications the actor is allowed to see (used by `/stream`).
pub fn actor_sse_stream(
    services: Arc<AppServices>,
    actor: Actor,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(n) if services.is_visible(&actor, &n) => {
            let data = serde_json::to_string(&n).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(n.event_type).data(data)))
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("sse subscriber lagged: {e}");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
