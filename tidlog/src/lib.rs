//! # tidlog
//! Asynchronous logger routing each thread's messages to its own outputs.
//!
//! Every producer (by default an OS thread, see [`Identity`]) registers one or
//! more outputs: the console, a text file or a CSV file. Messages are queued
//! without blocking on I/O and written by a single background thread, in
//! submission order, to every output of their producer.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! tidlog = "0.1.0"
//! ```
//!
//! ```rust
//! use tidlog::{Identity, OutputKind, logger_config};
//!
//! let logger = logger_config()
//!     .no_default_sinks()
//!     .start()
//!     .expect("Unable to start logger");
//! let me = Identity::current();
//! logger.add_output(me.clone(), OutputKind::Console, "", true).unwrap();
//! logger
//!     .add_output(me.clone(), OutputKind::TextFile, "/tmp/tidlog_usage.log", false)
//!     .unwrap();
//! assert!(logger.add_log(&me, "Hello, world!"));
//! drop(logger); // waits until every queued message is written
//! assert!(std::fs::read_to_string("/tmp/tidlog_usage.log").unwrap().ends_with("Hello, world!\n"));
//! ```
//!
//! ## Multi-threaded logging
//! Each thread registers its own outputs. Removing them is asynchronous: messages
//! queued before [`LogHandle::remove_thread_output`] are still written.
//!
//! ```rust
//! use tidlog::{Identity, OutputKind, logger_config};
//!
//! let logger = logger_config().no_default_sinks().start().unwrap();
//! std::thread::scope(|s| {
//!     for i in 0..5 {
//!         let logger = &logger;
//!         s.spawn(move || {
//!             let me = Identity::current();
//!             let path = format!("/tmp/tidlog_thread_{i}.csv");
//!             logger
//!                 .add_output(me.clone(), OutputKind::CsvFile, &path, false)
//!                 .unwrap();
//!             logger.add_log(&me, format!("Hello from thread {i}"));
//!             logger.remove_thread_output(&me);
//!         });
//!     }
//! });
//! ```
//!
//! ## Bridging the `log` crate
//! ```rust
//! use tidlog::{Identity, OutputKind, logger_config};
//!
//! let logger = logger_config().no_default_sinks().start().unwrap();
//! logger.install_log_bridge(log::LevelFilter::Info).unwrap();
//! logger.add_output(Identity::current(), OutputKind::Console, "", true).unwrap();
//! log::info!("written through tidlog");
//! ```

use std::{
    ops::Deref,
    sync::{Arc, Mutex, PoisonError},
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::Sender;
use log::{LevelFilter, Log};
use tidlog_core::{
    QueueEntry, SharedRegistry, SharedState, Sink, TIDLOG_CONFIG, default_observer, lock, queue,
    spawn_dispatch_thread,
};

pub use tidlog_core::{Error, ErrorObserver, Identity, OutputKind, WorkerState};

/// Producer side of a [`Logger`]. Cheap to clone and `'static`, so it can be
/// moved into spawned threads.
#[derive(Clone)]
pub struct LogHandle {
    registry: SharedRegistry,
    sender: Sender<QueueEntry>,
    observer: ErrorObserver,
    text_path: Arc<str>,
    csv_path: Arc<str>,
}

impl LogHandle {
    /// Registers an output for `identity`.
    ///
    /// An empty `path` selects the default file of the kind (`logs/log.txt`,
    /// `logs/log.csv`). `append` keeps existing file content, otherwise the file
    /// is truncated. Ignored by [`OutputKind::Console`].
    pub fn add_output(
        &self,
        identity: Identity,
        kind: OutputKind,
        path: &str,
        append: bool,
    ) -> Result<(), Error> {
        let sink = Sink::open_with_defaults(kind, path, append, &self.text_path, &self.csv_path)?;
        lock(&self.registry).add(identity, sink);
        Ok(())
    }

    /// Queues `message` for every output of `identity`.
    ///
    /// Returns `false` if `identity` has no output (the error observer is
    /// notified) or if the logger has shut down.
    pub fn add_log(&self, identity: &Identity, message: impl Into<String>) -> bool {
        match self.enqueue(identity, message.into()) {
            Ok(queued) => queued,
            Err(error) => {
                (self.observer)(&error);
                false
            }
        }
    }

    /// Same as [`add_log`](Self::add_log) without notifying the observer.
    fn try_log(&self, identity: &Identity, message: String) -> bool {
        self.enqueue(identity, message).unwrap_or(false)
    }

    // The membership check and the push happen under the registry lock, so a
    // removal processed by the worker or a shutdown cannot slip in between.
    fn enqueue(&self, identity: &Identity, message: String) -> Result<bool, Error> {
        let registry = lock(&self.registry);
        if registry.is_closed() {
            return Ok(false);
        }
        if !registry.contains(identity) {
            return Err(Error::UnregisteredIdentity(identity.clone()));
        }
        Ok(self
            .sender
            .send(QueueEntry::message(identity.clone(), message))
            .is_ok())
    }

    /// Requests removal of every output of `identity`.
    ///
    /// Outputs are closed by the background thread once it has written all
    /// messages queued before this call.
    pub fn remove_thread_output(&self, identity: &Identity) {
        self.sender.send(QueueEntry::Remove(identity.clone())).ok();
    }
}

/// The logger: owns the sink registry, the queue and the background thread.
///
/// Dropping it writes every pending message, closes all outputs and joins the
/// background thread. It dereferences to its [`LogHandle`].
pub struct Logger {
    handle: LogHandle,
    state: Arc<SharedState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Deref for Logger {
    type Target = LogHandle;
    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Logger {
    /// Starts a logger configured from the `TIDLOG_*` environment variables.
    pub fn new() -> Result<Self, Error> {
        logger_config().start()
    }

    pub fn handle(&self) -> LogHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Stops the background thread after it has drained the queue, and waits
    /// for it. From then on [`LogHandle::add_log`] returns `false` on every
    /// handle. Later calls do nothing.
    pub fn shutdown(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = worker.take() {
            {
                let mut registry = lock(&self.handle.registry);
                registry.close();
                self.handle
                    .sender
                    .send(QueueEntry::Stop(Identity::current()))
                    .ok();
            }
            if handle.join().is_err() {
                (self.handle.observer)(&Error::WorkerPanicked);
            }
        }
    }

    /// Routes records of the `log` crate macros to this logger, under the
    /// identity of the calling thread. Records of threads without outputs are
    /// ignored.
    pub fn install_log_bridge(&self, max_level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(LogBridge {
            handle: self.handle(),
        }))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// `log` facade implementation forwarding records to a [`LogHandle`].
struct LogBridge {
    handle: LogHandle,
}

impl Log for LogBridge {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.handle.try_log(&Identity::current(), record.args().to_string());
    }

    fn flush(&self) {}
}

/// Builder for configuring and starting a [`Logger`].
pub struct ConfigBuilder {
    default_sinks: bool,
    flush_interval: Duration,
    text_path: String,
    csv_path: String,
    observer: Option<ErrorObserver>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            default_sinks: TIDLOG_CONFIG.DEFAULT_SINKS,
            flush_interval: Duration::from_millis(TIDLOG_CONFIG.FLUSH_INTERVAL_MS),
            text_path: TIDLOG_CONFIG.TEXT_PATH.clone(),
            csv_path: TIDLOG_CONFIG.CSV_PATH.clone(),
            observer: None,
        }
    }
}

impl ConfigBuilder {
    /// Dynamically set whether the starting thread gets a console and a text output.
    pub fn with_default_sinks(self, yes: bool) -> Self {
        Self {
            default_sinks: yes,
            ..self
        }
    }
    /// Do not register outputs for the starting thread.
    pub fn no_default_sinks(self) -> Self {
        self.with_default_sinks(false)
    }
    /// Maximum delay before buffered file outputs are flushed under load.
    pub fn with_flush_interval(self, flush_interval: Duration) -> Self {
        Self {
            flush_interval,
            ..self
        }
    }
    /// Text file used when an output is added with an empty path.
    pub fn with_text_path(self, path: &str) -> Self {
        Self {
            text_path: path.into(),
            ..self
        }
    }
    /// CSV file used when an output is added with an empty path.
    pub fn with_csv_path(self, path: &str) -> Self {
        Self {
            csv_path: path.into(),
            ..self
        }
    }
    /// Receives every error the logger recovers from, instead of stderr.
    pub fn on_error<F: Fn(&Error) + Send + Sync + 'static>(self, observer: F) -> Self {
        Self {
            observer: Some(Arc::new(observer)),
            ..self
        }
    }

    /// Starts the background thread.
    ///
    /// With default outputs enabled, the calling thread is registered with a
    /// console output and a text output on the default path, and a
    /// `Logger_START` line is written to them.
    pub fn start(self) -> Result<Logger, Error> {
        let Self {
            default_sinks,
            flush_interval,
            text_path,
            csv_path,
            observer,
        } = self;
        let observer = observer.unwrap_or_else(default_observer);
        let identity = Identity::current();
        let registry = SharedRegistry::default();
        let (sender, receiver) = queue();
        let handle = LogHandle {
            registry: Arc::clone(&registry),
            sender,
            observer: Arc::clone(&observer),
            text_path: text_path.into(),
            csv_path: csv_path.into(),
        };
        if default_sinks {
            handle.add_output(identity.clone(), OutputKind::Console, "", true)?;
            handle.add_output(identity.clone(), OutputKind::TextFile, "", true)?;
        }
        handle.sender.send(QueueEntry::Start(identity)).ok();
        let state = Arc::new(SharedState::default());
        let worker = spawn_dispatch_thread(
            registry,
            receiver,
            Arc::clone(&state),
            Arc::clone(&observer),
            flush_interval,
        )?;
        Ok(Logger {
            handle,
            state,
            worker: Mutex::new(Some(worker)),
        })
    }
}

/// Returns a default ConfigBuilder for configuring the logger.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}
