use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::Receiver;

use crate::{
    error::{Error, ErrorObserver},
    format::{format_line, timestamp},
    log_writer::{LogWriter, Sink},
    queue::{QueueEntry, SharedState, WorkerState},
    registry::{Registry, SharedRegistry, lock},
};

pub const WORKER_THREAD_NAME: &str = "tidlog-dispatch";

fn report(observer: &ErrorObserver, errors: Vec<Error>) {
    for error in &errors {
        observer(error);
    }
}

fn close(sinks: Vec<Sink>) -> Vec<Error> {
    sinks
        .into_iter()
        .filter_map(|mut sink| sink.flush().err())
        .collect()
}

/// Dispatches one entry. Errors are collected while the registry is locked
/// and returned so they can be reported after unlocking.
fn process(registry: &Mutex<Registry>, entry: &QueueEntry) -> (Vec<Error>, ControlFlow<()>) {
    let line = format_line(&timestamp(), entry.identity(), entry.payload());
    let mut registry = lock(registry);
    let mut errors = match registry.dispatch(entry.identity(), &line) {
        Some(errors) => errors,
        // identity removed by an earlier entry
        None => match entry {
            QueueEntry::Message { identity, .. } => {
                vec![Error::UnregisteredIdentity(identity.clone())]
            }
            _ => Vec::new(),
        },
    };
    match entry {
        QueueEntry::Remove(identity) => {
            errors.extend(close(registry.remove(identity)));
            (errors, ControlFlow::Continue(()))
        }
        QueueEntry::Stop(_) => (errors, ControlFlow::Break(())),
        QueueEntry::Start(_) | QueueEntry::Message { .. } => (errors, ControlFlow::Continue(())),
    }
}

/// Spawns the thread draining `receiver` into the sinks of `registry`.
///
/// The thread runs until it pops a [`QueueEntry::Stop`] or every sender is
/// dropped. Buffered sinks are flushed whenever the queue runs empty, and at
/// least every `flush_interval` while it stays busy. On exit all sinks are
/// flushed and closed, messages left behind the stop entry are reported as
/// [`Error::LoggerStopped`] and `state` ends in [`WorkerState::Stopped`].
pub fn spawn_dispatch_thread(
    registry: SharedRegistry,
    receiver: Receiver<QueueEntry>,
    state: Arc<SharedState>,
    observer: ErrorObserver,
    flush_interval: Duration,
) -> Result<JoinHandle<()>, Error> {
    state.set(WorkerState::Running);
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.into())
        .spawn(move || {
            let mut last_flush = Instant::now();
            while let Ok(entry) = receiver.recv() {
                let (errors, flow) = process(&registry, &entry);
                report(&observer, errors);
                if flow.is_break() {
                    break;
                }
                if receiver.is_empty() || last_flush.elapsed() >= flush_interval {
                    let errors = lock(&registry).flush_all();
                    report(&observer, errors);
                    last_flush = Instant::now();
                }
            }
            state.set(WorkerState::Stopping);
            let sinks = lock(&registry).drain();
            report(&observer, close(sinks));
            let leftovers = receiver
                .try_iter()
                .filter_map(|entry| match entry {
                    QueueEntry::Message { identity, .. } => Some(Error::LoggerStopped(identity)),
                    _ => None,
                })
                .collect();
            report(&observer, leftovers);
            state.set(WorkerState::Stopped);
        })
        .map_err(Error::WorkerSpawn)
}
