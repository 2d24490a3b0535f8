//! The event bus proper: source-filtered subscriptions, bounded queues,
//! redelivery with exponential backoff, dead-letter diversion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use casebridge_core::config::BusSettings;
use casebridge_core::{EventSource, SyncEvent};

use crate::dead_letter::{DeadLetter, DeadLetterSink};
use crate::handler::EventHandler;

/// Default invocation attempts before dead-lettering.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default first redelivery delay; doubles per attempt.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Default per-subscription queue depth before publish backpressure.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Redelivery tuning for the bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl From<&BusSettings> for BusConfig {
    fn from(settings: &BusSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_backoff: Duration::from_millis(settings.base_backoff_ms),
            queue_capacity: settings.queue_capacity.max(1),
        }
    }
}

/// Errors surfaced to publishers.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A subscription's worker stopped and its queue is gone.
    #[error("subscriber '{handler}' is no longer receiving events")]
    SubscriberGone { handler: &'static str },
}

struct Subscription {
    source: EventSource,
    handler_name: &'static str,
    tx: mpsc::Sender<SyncEvent>,
}

/// Publish/subscribe channel decoupling event producers from consumers.
///
/// Subscriptions are registered at startup; `publish` fans an event out to
/// every subscription whose source filter matches. Each subscription is
/// serviced by its own worker task, so a slow handler only backs up its own
/// queue.
pub struct EventBus {
    config: BusConfig,
    sink: Arc<dyn DeadLetterSink>,
    subscriptions: RwLock<Vec<Subscription>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    events_published: AtomicU64,
}

impl EventBus {
    pub fn new(config: BusConfig, sink: Arc<dyn DeadLetterSink>) -> Self {
        Self {
            config,
            sink,
            subscriptions: RwLock::new(Vec::new()),
            workers: Mutex::new(Vec::new()),
            events_published: AtomicU64::new(0),
        }
    }

    /// Register a handler for all events from the given source.
    pub fn subscribe(&self, source: EventSource, handler: Arc<dyn EventHandler>) {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let handler_name = handler.name();

        let worker = tokio::spawn(deliver_loop(
            rx,
            handler,
            self.config.clone(),
            Arc::clone(&self.sink),
        ));

        if let Ok(mut subs) = self.subscriptions.write() {
            subs.push(Subscription {
                source,
                handler_name,
                tx,
            });
        }
        if let Ok(mut workers) = self.workers.lock() {
            workers.push(worker);
        }

        debug!(source = %source, handler = handler_name, "Subscription registered");
    }

    /// Publish an event to every matching subscription.
    ///
    /// Returns the number of subscriptions the event was queued to. Zero
    /// matches is not an error -- it means no consumer cares about this
    /// source, which is logged for visibility.
    pub async fn publish(&self, event: &SyncEvent) -> Result<usize, PublishError> {
        let targets: Vec<(&'static str, mpsc::Sender<SyncEvent>)> = self
            .subscriptions
            .read()
            .map(|subs| {
                subs.iter()
                    .filter(|s| s.source == event.source())
                    .map(|s| (s.handler_name, s.tx.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if targets.is_empty() {
            warn!(
                source = %event.source(),
                kind = event.kind(),
                "Event published with no matching subscription"
            );
            return Ok(0);
        }

        self.events_published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0usize;
        for (handler, tx) in targets {
            tx.send(event.clone())
                .await
                .map_err(|_| PublishError::SubscriberGone { handler })?;
            delivered += 1;
        }

        debug!(
            source = %event.source(),
            kind = event.kind(),
            native_id = event.native_id(),
            delivered,
            "Event published"
        );

        Ok(delivered)
    }

    /// Total events accepted by `publish` with at least one subscriber.
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Close all queues and wait for workers to drain in-flight events.
    ///
    /// Used for graceful shutdown and for deterministic assertions in tests.
    pub async fn shutdown(&self) {
        if let Ok(mut subs) = self.subscriptions.write() {
            subs.clear();
        }

        let workers = self
            .workers
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default();
        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Bus worker terminated abnormally");
            }
        }
    }
}

async fn deliver_loop(
    mut rx: mpsc::Receiver<SyncEvent>,
    handler: Arc<dyn EventHandler>,
    config: BusConfig,
    sink: Arc<dyn DeadLetterSink>,
) {
    while let Some(event) = rx.recv().await {
        deliver(handler.as_ref(), &event, &config, sink.as_ref()).await;
    }
}

/// Invoke the handler for one event, redelivering with exponential backoff
/// until success or the attempt cap; exhaustion records a dead letter.
///
/// Permanent failures are not fast-pathed: they repeat the same outcome
/// until the cap is hit, favoring one simple path over an early exit.
async fn deliver(
    handler: &dyn EventHandler,
    event: &SyncEvent,
    config: &BusConfig,
    sink: &dyn DeadLetterSink,
) {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match handler.handle(event).await {
            Ok(()) => {
                debug!(
                    handler = handler.name(),
                    kind = event.kind(),
                    native_id = event.native_id(),
                    attempt,
                    "Event handled"
                );
                return;
            }
            Err(err) => {
                warn!(
                    handler = handler.name(),
                    kind = event.kind(),
                    native_id = event.native_id(),
                    attempt,
                    classification = err.classification(),
                    error = %err,
                    "Handler invocation failed"
                );

                if attempt >= config.max_attempts {
                    error!(
                        handler = handler.name(),
                        kind = event.kind(),
                        native_id = event.native_id(),
                        attempts = attempt,
                        "Retry budget exhausted, diverting event to dead-letter sink"
                    );
                    let dead = DeadLetter::new(handler.name(), event.clone(), attempt, &err);
                    if let Err(sink_err) = sink.record(dead).await {
                        error!(error = %sink_err, "Failed to record dead letter");
                    }
                    return;
                }

                let backoff = config.base_backoff * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
