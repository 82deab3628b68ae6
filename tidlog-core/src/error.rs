use std::{fmt, io, path::PathBuf, sync::Arc};

use colored::Colorize;

use crate::identity::Identity;

#[derive(Debug)]
pub enum Error {
    /// A message was logged for an identity that has no registered sink.
    UnregisteredIdentity(Identity),
    /// A CSV sink received a line with fewer than three `-`-separated fields.
    MalformedLogMessage { line: String, fields: usize },
    /// A sink could not open, write or flush its output. `path` is `None` for stdout.
    Io {
        path: Option<PathBuf>,
        source: io::Error,
    },
    /// The dispatch thread could not be spawned.
    WorkerSpawn(io::Error),
    /// The dispatch thread panicked before it could be joined.
    WorkerPanicked,
    /// A message was still queued when the dispatch thread stopped.
    LoggerStopped(Identity),
}

impl Error {
    pub(crate) fn io(path: Option<&PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.cloned(),
            source,
        }
    }
}

/// Errors without a path come from stdout.
impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::Io { path: None, source }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnregisteredIdentity(identity) => write!(
                f,
                "Thread [{identity}] Error while trying to log message! Check if output method is registered or not."
            ),
            Error::MalformedLogMessage { line, fields } => write!(
                f,
                "CSV row needs 3 '-'-separated fields, got {fields}: {line:?}"
            ),
            Error::Io {
                path: Some(path),
                source,
            } => write!(f, "I/O error on {}: {source}", path.display()),
            Error::Io { path: None, source } => write!(f, "I/O error on stdout: {source}"),
            Error::WorkerSpawn(source) => write!(f, "Unable to spawn dispatch thread: {source}"),
            Error::WorkerPanicked => write!(f, "Dispatch thread panicked"),
            Error::LoggerStopped(identity) => write!(
                f,
                "Thread [{identity}] Message queued after the logger stopped, not written."
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } | Error::WorkerSpawn(source) => Some(source),
            Error::UnregisteredIdentity(_)
            | Error::MalformedLogMessage { .. }
            | Error::WorkerPanicked
            | Error::LoggerStopped(_) => None,
        }
    }
}

/// Callback receiving every error the logger recovers from.
pub type ErrorObserver = Arc<dyn Fn(&Error) + Send + Sync>;

/// Observer used when none is configured: prints the error to stderr.
pub fn report_to_stderr(error: &Error) {
    eprintln!("{} {error}", "tidlog:".red().bold());
}

pub fn default_observer() -> ErrorObserver {
    Arc::new(report_to_stderr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_and_source() {
        let err = Error::io(
            Some(&PathBuf::from("/tmp/x.log")),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on /tmp/x.log: denied");
        assert!(err.source().is_some());

        let err = Error::MalformedLogMessage {
            line: "a-b".into(),
            fields: 2,
        };
        assert!(err.to_string().contains("got 2"));
        assert!(err.source().is_none());

        let err = Error::UnregisteredIdentity(Identity::named("t1"));
        assert!(err.to_string().starts_with("Thread [t1]"));
    }

    #[test]
    fn test_from_io_error_is_stdout() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, Error::Io { path: None, .. }));
        assert_eq!(err.to_string(), "I/O error on stdout: closed");
    }
}
