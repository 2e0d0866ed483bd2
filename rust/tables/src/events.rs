use crate::errors::ErrorResponse;
use crate::settings::TableSettings;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tonk_engine::logger::SettlementRecord;
use tonk_engine::player::{PlayerId, TableId};
use tonk_engine::snapshot::StateSnapshot;

// Bounded per subscriber; a subscriber whose buffer is full is dropped (backpressure)
pub const DEFAULT_EVENT_BUFFER: usize = 256;

pub type EventSender = mpsc::Sender<TableEvent>;
pub type EventReceiver = mpsc::Receiver<TableEvent>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    PlayerJoined {
        player_id: PlayerId,
        snapshot: StateSnapshot,
    },
    PlayerLeft {
        player_id: PlayerId,
        snapshot: StateSnapshot,
    },
    GameStarted {
        snapshot: StateSnapshot,
    },
    StateUpdated {
        snapshot: StateSnapshot,
    },
    GameEnded {
        snapshot: StateSnapshot,
        settlement: SettlementRecord,
    },
    /// The table hit a consistency violation and stopped
    Aborted {
        table_id: TableId,
        version: u64,
        reason: String,
    },
    /// Delivered only to the player whose action was refused
    Rejected {
        table_id: TableId,
        player_id: PlayerId,
        error: ErrorResponse,
    },
}

impl TableEvent {
    /// State version this event reflects; `None` for events that carry no table state.
    pub fn version(&self) -> Option<u64> {
        match self {
            TableEvent::PlayerJoined { snapshot, .. }
            | TableEvent::PlayerLeft { snapshot, .. }
            | TableEvent::GameStarted { snapshot }
            | TableEvent::StateUpdated { snapshot }
            | TableEvent::GameEnded { snapshot, .. } => Some(snapshot.version),
            TableEvent::Aborted { version, .. } => Some(*version),
            TableEvent::Rejected { .. } => None,
        }
    }

    pub fn snapshot(&self) -> Option<&StateSnapshot> {
        match self {
            TableEvent::PlayerJoined { snapshot, .. }
            | TableEvent::PlayerLeft { snapshot, .. }
            | TableEvent::GameStarted { snapshot }
            | TableEvent::StateUpdated { snapshot }
            | TableEvent::GameEnded { snapshot, .. } => Some(snapshot),
            TableEvent::Aborted { .. } | TableEvent::Rejected { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            TableEvent::PlayerJoined { .. } => "player_joined",
            TableEvent::PlayerLeft { .. } => "player_left",
            TableEvent::GameStarted { .. } => "game_started",
            TableEvent::StateUpdated { .. } => "state_updated",
            TableEvent::GameEnded { .. } => "game_ended",
            TableEvent::Aborted { .. } => "aborted",
            TableEvent::Rejected { .. } => "rejected",
        }
    }
}

pub struct EventSubscription {
    bus: EventBus,
    table_id: TableId,
    subscriber_id: usize,
    last_version: Option<u64>,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }

    /// Next event in delivery order. `None` once the table is closed and drained.
    pub async fn next(&mut self) -> Option<TableEvent> {
        self.receiver.recv().await
    }

    /// Like [`next`](Self::next), but skips events whose version is not newer
    /// than the last one returned. Events without a version always pass.
    pub async fn next_fresh(&mut self) -> Option<TableEvent> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accept(&event) {
                return Some(event);
            }
        }
    }

    /// Non-blocking [`next_fresh`](Self::next_fresh).
    pub fn try_next_fresh(&mut self) -> Option<TableEvent> {
        while let Ok(event) = self.receiver.try_recv() {
            if self.accept(&event) {
                return Some(event);
            }
        }
        None
    }

    fn accept(&mut self, event: &TableEvent) -> bool {
        match (event.version(), self.last_version) {
            (Some(v), Some(last)) if v <= last => false,
            (Some(v), _) => {
                self.last_version = Some(v);
                true
            }
            (None, _) => true,
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.table_id, self.subscriber_id);
    }
}

#[derive(Debug)]
struct Subscriber {
    id: usize,
    viewer: Option<PlayerId>,
    sender: EventSender,
}

/// In-process [`Transport`]: one bounded channel per subscription.
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<TableId, Vec<Arc<Subscriber>>>>,
    next_id: AtomicUsize,
    buffer: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }

    /// A bus whose subscribers buffer `settings.event_buffer` events each.
    pub fn from_settings(settings: &TableSettings) -> Self {
        Self::with_buffer(settings.event_buffer)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                buffer: buffer.max(1),
                ..EventBusInner::default()
            }),
        }
    }

    /// Subscribes to a table's events as `viewer` (`None` for a spectator).
    pub fn subscribe(&self, table_id: TableId, viewer: Option<PlayerId>) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(table_id.clone(), viewer);
        EventSubscription {
            bus: self.clone(),
            table_id,
            subscriber_id,
            last_version: None,
            receiver,
        }
    }

    fn subscribe_raw(&self, table_id: TableId, viewer: Option<PlayerId>) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        guard.entry(table_id.clone()).or_default().push(Arc::new(Subscriber {
            id,
            viewer: viewer.clone(),
            sender: tx,
        }));

        tracing::info!(
            table_id = %table_id,
            subscriber_id = id,
            viewer = ?viewer,
            "client subscribed to table events"
        );

        (id, rx)
    }

    pub fn unsubscribe(&self, table_id: &TableId, subscriber_id: usize) {
        self.remove_subscribers(table_id, &[subscriber_id]);
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .expect("subscriber lock poisoned");
        guard.values().map(|list| list.len()).sum()
    }

    fn subscribers_of(&self, table_id: &TableId) -> Option<Vec<Arc<Subscriber>>> {
        let guard = self
            .inner
            .subscribers
            .read()
            .expect("subscriber lock poisoned");
        guard.get(table_id).cloned()
    }

    fn deliver(&self, table_id: &TableId, targets: Vec<(Arc<Subscriber>, TableEvent)>) {
        let mut failed = Vec::new();
        for (subscriber, event) in targets {
            // try_send never blocks the table task; a full or closed channel drops the subscriber
            if let Err(e) = subscriber.sender.try_send(event) {
                tracing::warn!(
                    table_id = %table_id,
                    subscriber_id = subscriber.id,
                    error = %e,
                    "failed to send event to subscriber"
                );
                failed.push(subscriber.id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(table_id, &failed);
        }
    }

    fn remove_subscribers(&self, table_id: &TableId, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        if let Some(list) = guard.get_mut(table_id) {
            list.retain(|s| !ids.contains(&s.id));
            if list.is_empty() {
                guard.remove(table_id);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for EventBus {
    fn broadcast(&self, table_id: &TableId, render: &dyn Fn(Option<&PlayerId>) -> TableEvent) {
        let Some(list) = self.subscribers_of(table_id) else {
            tracing::trace!(table_id = %table_id, "no subscribers for table");
            return;
        };

        let mut rendered: HashMap<Option<PlayerId>, TableEvent> = HashMap::new();
        let mut targets = Vec::with_capacity(list.len());
        for subscriber in list {
            let event = rendered
                .entry(subscriber.viewer.clone())
                .or_insert_with(|| render(subscriber.viewer.as_ref()))
                .clone();
            targets.push((subscriber, event));
        }
        if let Some((_, first)) = targets.first() {
            tracing::debug!(
                table_id = %table_id,
                event = first.kind(),
                version = ?first.version(),
                subscriber_count = targets.len(),
                "broadcasting table event"
            );
        }
        self.deliver(table_id, targets);
    }

    fn send_to(&self, table_id: &TableId, player_id: &PlayerId, event: TableEvent) {
        let targets: Vec<_> = self
            .subscribers_of(table_id)
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.viewer.as_ref() == Some(player_id))
            .map(|s| (s, event.clone()))
            .collect();
        self.deliver(table_id, targets);
    }

    fn close(&self, table_id: &TableId) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        guard.remove(table_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonk_engine::player::PlayerProfile;
    use tonk_engine::session::TableSession;

    fn table() -> TableSession {
        let mut t = TableSession::new("t", 1);
        t.join(PlayerProfile::new("a", "A")).unwrap();
        t.join(PlayerProfile::new("b", "B")).unwrap();
        t.start(1).unwrap();
        t
    }

    fn updated(session: &TableSession, viewer: Option<&PlayerId>) -> TableEvent {
        TableEvent::StateUpdated {
            snapshot: session.snapshot(viewer.map(String::as_str)),
        }
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe("t".to_string(), None);
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn each_viewer_sees_only_their_hand() {
        let bus = EventBus::new();
        let session = table();
        let mut a = bus.subscribe("t".to_string(), Some("a".to_string()));
        let mut spectator = bus.subscribe("t".to_string(), None);

        bus.broadcast(&"t".to_string(), &|v| updated(&session, v));

        let ev = a.receiver.try_recv().expect("a event");
        let snap = ev.snapshot().unwrap();
        assert!(snap.player("a").unwrap().cards.is_some());
        assert!(snap.player("b").unwrap().cards.is_none());

        let ev = spectator.receiver.try_recv().expect("spectator event");
        assert!(ev.snapshot().unwrap().players.iter().all(|p| p.cards.is_none()));
    }

    #[test]
    fn send_to_reaches_only_that_player() {
        let bus = EventBus::new();
        let mut a = bus.subscribe("t".to_string(), Some("a".to_string()));
        let mut b = bus.subscribe("t".to_string(), Some("b".to_string()));
        bus.send_to(
            &"t".to_string(),
            &"a".to_string(),
            TableEvent::Rejected {
                table_id: "t".into(),
                player_id: "a".into(),
                error: ErrorResponse::new("invalid_move", "nope"),
            },
        );
        assert!(matches!(
            a.receiver.try_recv(),
            Ok(TableEvent::Rejected { .. })
        ));
        assert!(b.receiver.try_recv().is_err());
    }

    #[test]
    fn stale_receiver_is_pruned() {
        let bus = EventBus::new();
        let session = table();
        let (id, rx) = bus.subscribe_raw("t".to_string(), None);
        drop(rx);
        bus.broadcast(&"t".to_string(), &|v| updated(&session, v));
        assert_eq!(bus.subscriber_count(), 0);
        bus.unsubscribe(&"t".to_string(), id);
    }

    #[test]
    fn slow_subscriber_is_dropped_when_full() {
        let settings = TableSettings {
            event_buffer: 1,
            ..TableSettings::default()
        };
        let bus = EventBus::from_settings(&settings);
        let session = table();
        let _slow = bus.subscribe("t".to_string(), None);
        bus.broadcast(&"t".to_string(), &|v| updated(&session, v));
        assert_eq!(bus.subscriber_count(), 1);
        bus.broadcast(&"t".to_string(), &|v| updated(&session, v));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn fresh_reads_skip_stale_versions() {
        let bus = EventBus::new();
        let session = table();
        let mut sub = bus.subscribe("t".to_string(), None);
        let t = "t".to_string();
        bus.broadcast(&t, &|v| updated(&session, v));
        bus.broadcast(&t, &|v| updated(&session, v));
        bus.send_to(
            &t,
            &"x".to_string(),
            TableEvent::Rejected {
                table_id: t.clone(),
                player_id: "x".into(),
                error: ErrorResponse::new("e", "m"),
            },
        );

        let first = sub.try_next_fresh().expect("first copy");
        assert_eq!(first.version(), Some(session.version()));
        assert!(sub.try_next_fresh().is_none(), "duplicate version is skipped");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let session = table();
        let ev = updated(&session, None);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "state_updated");
        assert_eq!(json["snapshot"]["tableId"], "t");
    }
}
