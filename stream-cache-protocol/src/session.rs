//! Per-connection session state.
//!
//! Binary frames are routed by this piece of state, not by anything
//! grafted onto the transport primitive. Multiple concurrent streams
//! bound to one connection are deliberately out of scope.

pub struct Session {
    current_stream_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            current_stream_id: None,
        }
    }

    pub fn current_stream_id(&self) -> Option<&str> {
        self.current_stream_id.as_deref()
    }

    pub fn bind(&mut self, stream_id: impl Into<String>) {
        self.current_stream_id = Some(stream_id.into());
    }

    pub fn clear(&mut self) {
        self.current_stream_id = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
