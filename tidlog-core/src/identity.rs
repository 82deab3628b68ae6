use std::{
    fmt,
    sync::Arc,
    thread::{self, ThreadId},
};

use crate::log_writer::LogCsv;

use uuid::Uuid;

/// Token identifying one logical log producer.
///
/// Sinks are registered against an identity and every queued message carries
/// the identity of its producer. Identities compare by value, so a registry
/// entry outlives the thread that created it until it is explicitly removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// An OS thread.
    Thread(ThreadId),
    /// A random token, for producers that are not threads (tasks, sessions...).
    Token(Uuid),
    /// A caller-chosen label.
    Named(Arc<str>),
}

impl Identity {
    /// Identity of the calling thread.
    pub fn current() -> Self {
        Identity::Thread(thread::current().id())
    }

    /// A fresh, unique token.
    pub fn token() -> Self {
        Identity::Token(Uuid::new_v4())
    }

    /// A caller-chosen label. `-` is displayed as `_`.
    pub fn named(name: &str) -> Self {
        Identity::Named(name.into())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // a delimiter in the header would shift the payload out of CSV rows
        match self {
            Identity::Thread(id) => write!(f, "{id:?}"),
            Identity::Token(id) => write!(f, "{}", id.simple()),
            Identity::Named(name) => f.write_str(&name.replace(LogCsv::DELIMITER, "_")),
        }
    }
}
