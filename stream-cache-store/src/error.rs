use stream_cache_api_types::{ErrorInfo, ErrorKind};

/// Failure modes of the stream store. Mapped file I/O failures are
/// reported through this type rather than bubbling raw `io::Error` so
/// the registry can decide whether a failure marks a stream ERROR.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("stream '{0}' already exists")]
    AlreadyExists(String),

    #[error("stream '{0}' not found")]
    NotFound(String),

    #[error("stream '{0}' is not UPLOADING (current status does not permit this operation)")]
    NotUploading(String),

    #[error("partial write on stream '{0}': wrote {written} of {requested} bytes")]
    PartialWrite {
        stream_id: String,
        written: usize,
        requested: usize,
    },

    #[error("out-of-order write on stream '{stream_id}': offset {offset} != current_offset {current_offset}")]
    OutOfOrderWrite {
        stream_id: String,
        offset: u64,
        current_offset: u64,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this failure should mark the owning stream's status as
    /// ERROR. Validation-style failures (not found, already exists,
    /// wrong state) leave the stream alone; only failures rooted in
    /// the mapped file do not.
    pub fn marks_stream_error(&self) -> bool {
        matches!(
            self,
            StoreError::Io { .. } | StoreError::PartialWrite { .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::AlreadyExists(_) | StoreError::NotFound(_) => ErrorKind::Validation,
            StoreError::NotUploading(_) | StoreError::OutOfOrderWrite { .. } => {
                ErrorKind::Validation
            }
            StoreError::PartialWrite { .. } | StoreError::Io { .. } => ErrorKind::FileIo,
        }
    }

    pub fn into_error_info(self, context: impl Into<String>) -> ErrorInfo {
        let kind = self.kind();
        ErrorInfo::new(kind, self.to_string(), context).recoverable(!self.marks_stream_error())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
