use stream_cache_api_types::{ErrorInfo, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("timed out waiting for a response")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

impl ClientError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ClientError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connection(_) => ErrorKind::Connection,
            ClientError::Timeout => ErrorKind::Timeout,
            ClientError::Protocol(_) => ErrorKind::Protocol,
            ClientError::Io { .. } => ErrorKind::FileIo,
            ClientError::Validation(_) => ErrorKind::Validation,
        }
    }

    pub fn into_error_info(self, context: impl Into<String>, recoverable: bool) -> ErrorInfo {
        let kind = self.kind();
        ErrorInfo::new(kind, self.to_string(), context).recoverable(recoverable)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
