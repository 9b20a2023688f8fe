//! Stream id generation and validation.
//!
//! A stream id is `<prefix>-<hex>`, where `prefix` matches
//! `[A-Za-z0-9_-]+` and `hex` is either a canonical dashed UUID (long
//! form) or 8 hex characters (short form). The store treats ids as
//! opaque; validation is the caller's concern.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

pub const DEFAULT_PREFIX: &str = "stream";

static LONG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+-[a-f0-9]{8}(-[a-f0-9]{4}){3}-[a-f0-9]{12}$").unwrap()
});

static SHORT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+-[a-f0-9]{8}$").unwrap());

/// Generates and validates stream ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamIdGenerator;

impl StreamIdGenerator {
    pub fn new() -> Self {
        Self
    }

    /// `stream-<uuid>`, long canonical form.
    pub fn generate(&self) -> String {
        self.generate_with_prefix(DEFAULT_PREFIX)
    }

    pub fn generate_with_prefix(&self, prefix: &str) -> String {
        let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
        format!("{prefix}-{}", Uuid::new_v4())
    }

    /// `stream-<8 hex chars>`, short form.
    pub fn generate_short(&self) -> String {
        self.generate_short_with_prefix(DEFAULT_PREFIX)
    }

    pub fn generate_short_with_prefix(&self, prefix: &str) -> String {
        let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
        let short = Uuid::new_v4().simple().to_string();
        format!("{prefix}-{}", &short[..8])
    }

    pub fn validate(&self, stream_id: &str) -> bool {
        !stream_id.is_empty() && LONG_PATTERN.is_match(stream_id)
    }

    pub fn validate_short(&self, stream_id: &str) -> bool {
        !stream_id.is_empty() && SHORT_PATTERN.is_match(stream_id)
    }

    pub fn extract_prefix<'a>(&self, stream_id: &'a str) -> Option<&'a str> {
        let dash = stream_id.find('-')?;
        if dash > 0 {
            Some(&stream_id[..dash])
        } else {
            None
        }
    }

    pub fn extract_uuid<'a>(&self, stream_id: &'a str) -> Option<&'a str> {
        let dash = stream_id.find('-')?;
        if dash > 0 && dash < stream_id.len() - 1 {
            Some(&stream_id[dash + 1..])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_form_round_trips_through_validate() {
        let gen = StreamIdGenerator::new();
        let id = gen.generate();
        assert!(gen.validate(&id));
        assert!(!gen.validate_short(&id));
    }

    #[test]
    fn short_form_round_trips_through_validate_short() {
        let gen = StreamIdGenerator::new();
        let id = gen.generate_short();
        assert!(gen.validate_short(&id));
        assert!(!gen.validate(&id));
    }

    #[test]
    fn custom_prefix_is_kept_and_extractable() {
        let gen = StreamIdGenerator::new();
        let id = gen.generate_short_with_prefix("upload");
        assert!(id.starts_with("upload-"));
        assert_eq!(gen.extract_prefix(&id), Some("upload"));
        assert_eq!(gen.extract_uuid(&id).map(str::len), Some(8));
    }

    #[test]
    fn empty_prefix_falls_back_to_default() {
        let gen = StreamIdGenerator::new();
        let id = gen.generate_with_prefix("");
        assert!(id.starts_with("stream-"));
    }

    #[test]
    fn rejects_garbage() {
        let gen = StreamIdGenerator::new();
        assert!(!gen.validate(""));
        assert!(!gen.validate("no-dash-here-at-all"));
        assert!(!gen.validate_short("missing-prefix-separator"));
    }
}
