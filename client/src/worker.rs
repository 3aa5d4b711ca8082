//! Worker pool & dispatch, and per-worker connection manager & reschedule
//! queue. A fixed-size pool of workers, each with its own transport session
//! and a single-threaded cooperative execution model: one `tokio::task`
//! draining one `mpsc` channel, never more than one operation in flight.

use crate::sync;
use crate::transport::Transport;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const CONNECTION_RETRY_TIMEOUT: Duration = Duration::from_secs(2);
const RESCHEDULE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub enum WorkerOp {
    InitialSync,
    Added(String),
    Removed(String),
    Modified(String),
}

/// Hashes a path with the standard library's `DefaultHasher`, not `Path`'s
/// own `Hash` impl, for a partition that is stable across the process
/// lifetime and platforms.
fn partition_hash(path: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}

#[derive(Clone)]
pub struct WorkerPool {
    senders: Arc<Vec<mpsc::UnboundedSender<WorkerOp>>>,
    round_robin: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn spawn(
        root: PathBuf,
        host: String,
        port: u16,
        key: String,
        stopped: Arc<AtomicBool>,
    ) -> anyhow::Result<Self> {
        let worker_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(1);

        let mut senders = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let (tx, rx) = mpsc::unbounded_channel();
            let transport = Transport::new(&host, port, key.clone())?;
            let worker = Worker {
                id,
                root: root.clone(),
                transport,
                connected: Arc::new(AtomicBool::new(false)),
                reconnecting: Arc::new(AtomicBool::new(false)),
                stopped: stopped.clone(),
                self_tx: tx.clone(),
            };
            tokio::spawn(worker.run(rx));
            senders.push(tx);
        }

        Ok(Self {
            senders: Arc::new(senders),
            round_robin: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Routes `op` to a worker: path-bearing ops go to `hash(path) % N`;
    /// `InitialSync` round-robins across workers.
    pub fn dispatch(&self, op: WorkerOp) {
        let worker_count = self.senders.len();
        let index = match &op {
            WorkerOp::InitialSync => {
                self.round_robin.fetch_add(1, Ordering::Relaxed) % worker_count
            }
            WorkerOp::Added(path) | WorkerOp::Removed(path) | WorkerOp::Modified(path) => {
                (partition_hash(path) as usize) % worker_count
            }
        };

        if self.senders[index].send(op).is_err() {
            tracing::warn!(worker = index, "worker channel closed, dropping operation");
        }
    }
}

struct Worker {
    id: usize,
    root: PathBuf,
    transport: Transport,
    connected: Arc<AtomicBool>,
    reconnecting: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    self_tx: mpsc::UnboundedSender<WorkerOp>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<WorkerOp>) {
        self.ensure_reconnecting();

        while let Some(op) = rx.recv().await {
            if self.stopped.load(Ordering::Relaxed) {
                break;
            }

            if !self.connected.load(Ordering::Relaxed) {
                self.defer(op);
                continue;
            }

            self.execute(op).await;
        }

        tracing::debug!(worker = self.id, "worker task exiting");
    }

    /// Reschedule queue: re-posts `op` to this same worker after
    /// `RESCHEDULE_INTERVAL`. Not FIFO-safe against freshly arriving
    /// operations — tolerated, since reconciliation repairs any drift.
    fn defer(&self, op: WorkerOp) {
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESCHEDULE_INTERVAL).await;
            let _ = tx.send(op);
        });
    }

    /// Starts (if not already running) a reconnect loop that probes the
    /// server every `CONNECTION_RETRY_TIMEOUT` until it succeeds.
    fn ensure_reconnecting(&self) {
        if self.reconnecting.swap(true, Ordering::AcqRel) {
            return;
        }

        let transport = self.transport.clone();
        let connected = self.connected.clone();
        let reconnecting = self.reconnecting.clone();
        let stopped = self.stopped.clone();
        let id = self.id;

        tokio::spawn(async move {
            loop {
                if stopped.load(Ordering::Relaxed) {
                    break;
                }
                match transport.files_description().await {
                    Ok(_) => {
                        connected.store(true, Ordering::Relaxed);
                        tracing::debug!(worker = id, "connected");
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(worker = id, error = %err, "connection probe failed");
                        tokio::time::sleep(CONNECTION_RETRY_TIMEOUT).await;
                    }
                }
            }
            reconnecting.store(false, Ordering::Relaxed);
        });
    }

    async fn execute(&self, op: WorkerOp) {
        let result = match &op {
            WorkerOp::InitialSync => sync::run_full_reconcile(&self.transport, &self.root).await,
            WorkerOp::Added(path) => sync::handle_added(&self.transport, &self.root, path).await,
            WorkerOp::Removed(path) => sync::handle_removed(&self.transport, path).await,
            WorkerOp::Modified(path) => {
                sync::handle_modified(&self.transport, &self.root, path).await
            }
        };

        if let Err(err) = result {
            tracing::warn!(worker = self.id, ?op, error = %err, "operation failed");
            self.connected.store(false, Ordering::Relaxed);
            self.ensure_reconnecting();
        }
    }
}
