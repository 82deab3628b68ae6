//! # tidlog-core
//! Core of tidlog: per-identity sink registry, dispatch queue and the background worker.

mod config;
mod error;
mod format;
mod identity;
mod log_writer;
mod queue;
mod registry;
mod worker;

pub use config::{TIDLOG_CONFIG, TidlogConfig};
pub use error::{Error, ErrorObserver, default_observer, report_to_stderr};
pub use format::{format_line, timestamp};
pub use identity::Identity;
pub use log_writer::{LogCsv, LogFile, LogStdout, LogWriter, OutputKind, Sink};
pub use queue::{QueueEntry, SharedState, WorkerState, queue};
pub use registry::{Registry, SharedRegistry, lock};
pub use worker::{WORKER_THREAD_NAME, spawn_dispatch_thread};
