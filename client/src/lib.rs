//! Client side of the directory-synchronization service: a fixed-size worker
//! pool dispatches filesystem events to per-worker connection managers,
//! which drive the reconciliation and delta-patch engines over an HTTP/2
//! transport, debounced per path.

pub mod debounce;
pub mod sync;
pub mod transport;
pub mod watch;
pub mod worker;

pub use debounce::Debouncer;
pub use transport::Transport;
pub use watch::start_watcher;
pub use worker::{WorkerOp, WorkerPool};
