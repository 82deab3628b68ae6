use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    error::Error,
    identity::Identity,
    log_writer::{LogWriter, Sink},
};

/// Sinks registered per identity, in registration order.
///
/// The registry is not synchronized itself; the logger keeps it behind a
/// single mutex shared by producers and the dispatch worker.
#[derive(Default)]
pub struct Registry {
    outputs: HashMap<Identity, Vec<Sink>>,
    closed: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, identity: Identity, sink: Sink) {
        self.outputs.entry(identity).or_default().push(sink);
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.outputs.contains_key(identity)
    }

    /// Marks the registry as closed: the stop entry has been queued and no
    /// message may follow it.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Writes `line` to every sink of `identity`.
    /// Returns `None` if the identity is unknown, otherwise the failed writes.
    pub fn dispatch(&mut self, identity: &Identity, line: &str) -> Option<Vec<Error>> {
        let sinks = self.outputs.get_mut(identity)?;
        Some(
            sinks
                .iter_mut()
                .filter_map(|sink| sink.write_line(line).err())
                .collect(),
        )
    }

    /// Detaches every sink of `identity`. Dropping them closes their files.
    pub fn remove(&mut self, identity: &Identity) -> Vec<Sink> {
        self.outputs.remove(identity).unwrap_or_default()
    }

    pub fn flush_all(&mut self) -> Vec<Error> {
        self.outputs
            .values_mut()
            .flatten()
            .filter_map(|sink| sink.flush().err())
            .collect()
    }

    /// Detaches all sinks of all identities.
    pub fn drain(&mut self) -> Vec<Sink> {
        self.outputs.drain().flat_map(|(_, sinks)| sinks).collect()
    }
}

/// Registry shared between the logger facade and the dispatch worker.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Locks the registry, ignoring poisoning: every registry operation leaves
/// the map consistent.
pub fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
