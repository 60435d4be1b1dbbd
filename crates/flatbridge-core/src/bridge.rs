// ── Notification bridge ──
//
// Republishes tree changes to remote observers. A background task drains
// the service's change-event channel, read-coerces each new value,
// rewrites slider-internal paths to the slider's own path, and fans the
// result out to every registered observer in registration order.
//
// Dispatch runs outside the write lock that produced the change; a slow
// or failing observer never holds up a mutation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde::Serialize;
use serde_json::Value as Json;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::coerce;
use crate::path::AccessPath;
use crate::resolve;
use crate::service::{ChangeEvent, DataService};

// ── Notification ────────────────────────────────────────────────────

/// What observers receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Notification {
    /// `{"name": <flat path>, "value": <wire value>}`.
    Change { name: String, value: Json },
    /// Free-form text pushed with `emit`.
    Message(String),
}

// ── Observer ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
#[error("Observer failed: {0}")]
pub struct ObserverError(pub String);

impl ObserverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A remote subscriber. `notify` must not block; errors and panics are
/// logged and do not affect other observers.
pub trait Observer: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), ObserverError>;
}

impl<F> Observer for F
where
    F: Fn(&Notification) -> Result<(), ObserverError> + Send + Sync,
{
    fn notify(&self, notification: &Notification) -> Result<(), ObserverError> {
        self(notification)
    }
}

/// Observer that forwards into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Observer for ChannelObserver {
    fn notify(&self, notification: &Notification) -> Result<(), ObserverError> {
        self.tx
            .send(notification.clone())
            .map_err(|_| ObserverError::new("receiver dropped"))
    }
}

/// Handle returned by [`NotificationBridge::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Clone)]
struct Registered {
    id: ObserverId,
    observer: Arc<dyn Observer>,
}

// ── BridgeState ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum BridgeState {
    #[default]
    Idle,
    Dispatching,
}

// ── NotificationBridge ──────────────────────────────────────────────

/// Fan-out of tree changes to observers.
///
/// Cheaply cloneable. Call [`start`](Self::start) from within a Tokio
/// runtime to begin forwarding, and [`shutdown`](Self::shutdown) to stop.
#[derive(Clone)]
pub struct NotificationBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    service: Arc<DataService>,
    observers: ArcSwap<Vec<Registered>>,
    next_id: AtomicU64,
    state: watch::Sender<BridgeState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationBridge {
    pub fn new(service: Arc<DataService>) -> Self {
        let (state, _) = watch::channel(BridgeState::Idle);
        Self {
            inner: Arc::new(BridgeInner {
                service,
                observers: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(0),
                state,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn service(&self) -> &Arc<DataService> {
        &self.inner.service
    }

    /// Add an observer after all existing ones.
    pub fn register(&self, observer: impl Observer + 'static) -> ObserverId {
        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Arc<dyn Observer> = Arc::new(observer);
        self.inner.observers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Registered {
                id,
                observer: Arc::clone(&observer),
            });
            next
        });
        debug!(observer = id.0, "observer registered");
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let previous = self.inner.observers.rcu(|current| {
            current
                .iter()
                .filter(|r| r.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|r| r.id == id)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.load().len()
    }

    /// Watch the dispatch state.
    pub fn state(&self) -> watch::Receiver<BridgeState> {
        self.inner.state.subscribe()
    }

    /// Spawn the forwarding task. Changes made after this call are
    /// delivered; calling it again is a no-op.
    pub fn start(&self) {
        let mut task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        // Subscribe before spawning so nothing slips through while the
        // task is being scheduled.
        let mut rx = self.inner.service.subscribe();
        let inner = Arc::clone(&self.inner);
        let cancel = self.inner.cancel.clone();

        *task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = rx.recv() => {
                        match result {
                            Ok(event) => inner.dispatch(&event),
                            Err(RecvError::Lagged(n)) => {
                                warn!(skipped = n, "notification bridge: receiver lagged");
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                }
            }
            debug!("notification bridge stopped");
        }));
    }

    /// Stop the forwarding task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "notification bridge task failed");
            }
        }
    }

    /// Deliver a notification to every observer, in registration order.
    pub fn publish(&self, notification: &Notification) {
        self.inner.publish(notification);
    }

    /// Push a free-form message to every observer.
    pub fn emit(&self, message: impl Into<String>) {
        self.publish(&Notification::Message(message.into()));
    }

    /// The notification a change event turns into.
    pub fn translate(&self, event: &ChangeEvent) -> Notification {
        self.inner.translate(event)
    }
}

impl BridgeInner {
    fn dispatch(&self, event: &ChangeEvent) {
        self.state.send_replace(BridgeState::Dispatching);
        let notification = self.translate(event);
        self.publish(&notification);
        self.state.send_replace(BridgeState::Idle);
    }

    fn translate(&self, event: &ChangeEvent) -> Notification {
        let name = self.outward_path(&event.path).to_string();
        let value = coerce::notification_value(&event.value, event.previous.as_ref());
        Notification::Change { name, value }
    }

    /// `<slider>.value` is reported at `<slider>`.
    fn outward_path(&self, path: &AccessPath) -> AccessPath {
        let Some(parent) = path.parent().filter(|_| path.ends_with_attribute("value")) else {
            return path.clone();
        };
        let parent_is_slider = self.service.read(|root| {
            resolve::resolve_parent(root, path)
                .is_ok_and(|(p, _)| p.type_tag().is_composite_widget())
        });
        if parent_is_slider { parent } else { path.clone() }
    }

    fn publish(&self, notification: &Notification) {
        let observers = self.observers.load();
        for registered in observers.iter() {
            let observer = &registered.observer;
            match panic::catch_unwind(AssertUnwindSafe(|| observer.notify(notification))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(observer = registered.id.0, error = %e, "observer failed, continuing");
                }
                Err(_) => {
                    warn!(observer = registered.id.0, "observer panicked, continuing");
                }
            }
        }
    }
}

impl std::fmt::Debug for NotificationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBridge")
            .field("observers", &self.observer_count())
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
