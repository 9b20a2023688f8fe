//! Shared error taxonomy used by every crate in the workspace.
//!
//! Mirrors the five error kinds named in the wire-level error handling
//! design: connection failures, file I/O failures, protocol violations,
//! timeouts, and validation failures. Each carries enough context to be
//! logged uniformly by both the server and the client.

use std::fmt;
use std::time::SystemTime;

/// Broad category of an error, used for structured logging and for
/// picking a retry policy on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    FileIo,
    Protocol,
    Timeout,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "CONNECTION",
            ErrorKind::FileIo => "FILE_IO",
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Validation => "VALIDATION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported error: kind, human message, free-form context, the
/// time it happened, and whether the caller should consider retrying.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub context: String,
    pub timestamp: SystemTime,
    pub recoverable: bool,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: context.into(),
            timestamp: SystemTime::now(),
            recoverable: false,
        }
    }

    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Emit this error at the appropriate log level: `warn` when the
    /// caller marked it recoverable, `error` otherwise.
    pub fn log(&self) {
        if self.recoverable {
            log::warn!("[{}] {} - context: {}", self.kind, self.message, self.context);
        } else {
            log::error!("[{}] {} - context: {}", self.kind, self.message, self.context);
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ErrorInfo {{ kind: {}, message: '{}', context: '{}', recoverable: {} }}",
            self.kind, self.message, self.context, self.recoverable
        )
    }
}
