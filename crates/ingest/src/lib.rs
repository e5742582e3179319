//! Per-user serialized ingest pipeline.
//!
//! The engine's transition paths read-then-write a user's fence
//! non-atomically, so messages for one user must be processed in arrival
//! order, one at a time. The router gives every user a bounded queue and a
//! dedicated worker task; queues for different users drain in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use waypost_engine::Engine;
use waypost_model::{Topic, TopicError};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error("ingest worker for `{0}` is gone")]
    WorkerGone(String),
}

/// Queue sizing for per-user workers.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Publishes buffered per user before backpressure (or drops) kick in.
    pub queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

struct Inbound {
    topic: String,
    payload: String,
}

struct Worker {
    tx: mpsc::Sender<Inbound>,
    handle: JoinHandle<()>,
}

/// Routes raw publishes to per-user worker tasks.
pub struct MessageRouter {
    engine: Arc<Engine>,
    config: IngestConfig,
    workers: Mutex<HashMap<String, Worker>>,
    dropped: AtomicU64,
}

impl MessageRouter {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self::with_config(engine, IngestConfig::default())
    }

    pub fn with_config(engine: Arc<Engine>, config: IngestConfig) -> Self {
        Self {
            engine,
            config,
            workers: Mutex::new(HashMap::new()),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Enqueue a publish, waiting while the user's queue is full.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), IngestError> {
        let user_id = Topic::parse(topic)?.user_id;
        let tx = self.sender_for(&user_id);
        tx.send(Inbound {
            topic: topic.to_string(),
            payload: payload.to_string(),
        })
        .await
        .map_err(|_| IngestError::WorkerGone(user_id))
    }

    /// Enqueue a publish without waiting, dropping it when the user's queue
    /// is full. Returns whether the message was accepted.
    pub fn try_publish(&self, topic: &str, payload: &str) -> Result<bool, IngestError> {
        let user_id = Topic::parse(topic)?.user_id;
        let tx = self.sender_for(&user_id);
        match tx.try_send(Inbound {
            topic: topic.to_string(),
            payload: payload.to_string(),
        }) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                // Rate-limit logging: only log every 10th drop to avoid spam
                if dropped % 10 == 1 {
                    warn!(user = %user_id, dropped, "ingest queue full, dropping publish");
                }
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(IngestError::WorkerGone(user_id)),
        }
    }

    /// Publishes dropped by `try_publish` since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close every queue and wait for the workers to drain.
    pub async fn shutdown(self) {
        let workers: Vec<Worker> = {
            let mut map = self.workers.lock().expect("worker map mutex poisoned");
            map.drain().map(|(_, worker)| worker).collect()
        };
        for worker in workers {
            drop(worker.tx);
            if worker.handle.await.is_err() {
                warn!("ingest worker terminated abnormally");
            }
        }
    }

    fn sender_for(&self, user_id: &str) -> mpsc::Sender<Inbound> {
        let mut workers = self.workers.lock().expect("worker map mutex poisoned");
        if let Some(worker) = workers.get(user_id) {
            // A worker only disappears if its task died; replace it.
            if !worker.tx.is_closed() {
                return worker.tx.clone();
            }
        }
        let worker = self.spawn_worker(user_id);
        let tx = worker.tx.clone();
        workers.insert(user_id.to_string(), worker);
        tx
    }

    fn spawn_worker(&self, user_id: &str) -> Worker {
        let (tx, mut rx) = mpsc::channel::<Inbound>(self.config.queue_capacity);
        let engine = Arc::clone(&self.engine);
        let user = user_id.to_string();
        debug!(user = %user, "spawning ingest worker");
        let handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                // Classification failures were already logged by the engine;
                // the worker only has to keep going.
                if let Err(e) = engine.handle_message(&msg.topic, &msg.payload).await {
                    warn!(user = %user, "publish dropped: {e}");
                }
            }
            debug!(user = %user, "ingest worker stopped");
        });
        Worker { tx, handle }
    }
}

/// Install the process-wide tracing subscriber.
///
/// Honors `RUST_LOG`; defaults to info with engine debug output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,waypost=debug")),
        )
        .init();
}
