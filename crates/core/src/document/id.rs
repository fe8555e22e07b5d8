/// Document id utilities.
///
/// Ids are opaque strings, unique within a collection. The store generates
/// UUIDv7 values in hyphenated form; an upsert may also materialise a
/// caller-chosen string id.
use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh, time-ordered id.
    pub fn generate() -> Self {
        DocumentId(Uuid::now_v7())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
