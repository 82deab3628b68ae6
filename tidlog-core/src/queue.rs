use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::identity::Identity;

/// Entry of the dispatch queue.
///
/// Control entries are distinct variants, so a user message never collides
/// with them. Their marker text is still written to the sinks of the
/// identity they carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    /// Logger started.
    Start(Identity),
    /// A user message.
    Message { identity: Identity, payload: String },
    /// Close and forget every sink of the identity.
    Remove(Identity),
    /// Stop the worker. Entries queued before it are still dispatched.
    Stop(Identity),
}

impl QueueEntry {
    pub const START_MARKER: &'static str = "Logger_START";
    pub const REMOVE_MARKER: &'static str = "Thread_RM";
    pub const STOP_MARKER: &'static str = "Logger_STOP";

    pub fn message(identity: Identity, payload: impl Into<String>) -> Self {
        QueueEntry::Message {
            identity,
            payload: payload.into(),
        }
    }

    pub fn identity(&self) -> &Identity {
        match self {
            QueueEntry::Start(identity)
            | QueueEntry::Message { identity, .. }
            | QueueEntry::Remove(identity)
            | QueueEntry::Stop(identity) => identity,
        }
    }

    /// Text written to the sinks for this entry.
    pub fn payload(&self) -> &str {
        match self {
            QueueEntry::Start(_) => Self::START_MARKER,
            QueueEntry::Message { payload, .. } => payload,
            QueueEntry::Remove(_) => Self::REMOVE_MARKER,
            QueueEntry::Stop(_) => Self::STOP_MARKER,
        }
    }
}

/// Unbounded FIFO queue feeding the dispatch worker.
pub fn queue() -> (Sender<QueueEntry>, Receiver<QueueEntry>) {
    unbounded()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

/// Worker state shared between the worker thread and the logger.
#[derive(Debug)]
pub struct SharedState(AtomicU8);

impl Default for SharedState {
    fn default() -> Self {
        Self(AtomicU8::new(WorkerState::Running as u8))
    }
}

impl SharedState {
    pub fn get(&self) -> WorkerState {
        match self.0.load(Ordering::Acquire) {
            0 => WorkerState::Running,
            1 => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }

    pub fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
