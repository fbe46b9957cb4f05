// Object store trait for reading minute-partitioned log blobs
//
// Implementations:
// - OpendalStore (blobtail-storage: S3, R2, filesystem, in-memory)
// - In-module mocks for pipeline tests

use anyhow::Result;
use async_trait::async_trait;

/// Suffix carried by every exported log object. Anything else under the
/// minute prefix (checkpoints, placeholders) is skipped during listing.
pub const LOG_OBJECT_SUFFIX: &str = "logs.v1.data";

/// What a listed entry is. Prefix entries show up in hierarchical listings
/// and are never downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Content,
    Prefix,
}

/// Reference to one remote object, as returned by a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Full key of the object within the container.
    pub key: String,
    pub kind: ObjectKind,
}

impl ObjectRef {
    pub fn content(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ObjectKind::Content,
        }
    }
}

/// Opaque continuation token for paginated listings.
///
/// The raw value is backend-specific; the pipeline only passes it back
/// verbatim on the next page request and never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct ListPage {
    /// Entries in store order. May mix kinds; callers filter.
    pub objects: Vec<ObjectRef>,
    /// Cursor for the next page, or `None` when the listing is exhausted.
    pub next: Option<PageCursor>,
}

impl ListPage {
    pub fn last(objects: Vec<ObjectRef>) -> Self {
        Self {
            objects,
            next: None,
        }
    }
}

/// Read-side storage abstraction consumed by the export pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one listing page under `prefix`, at most `page_size` entries,
    /// continuing from `cursor` when given.
    async fn list_page(
        &self,
        prefix: &str,
        page_size: usize,
        cursor: Option<&PageCursor>,
    ) -> Result<ListPage>;

    /// Download the body of one object as text.
    async fn download(&self, object: &ObjectRef) -> Result<String>;
}
