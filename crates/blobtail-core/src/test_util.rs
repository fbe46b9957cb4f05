// Shared fixtures for pipeline tests: deterministic clocks and an in-memory
// object store with failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::clock::Clock;
use crate::store::{ListPage, ObjectKind, ObjectRef, ObjectStore, PageCursor};

/// Parse a minute-resolution UTC timestamp like `2024-01-01T00:03Z`.
pub(crate) fn minute(s: &str) -> DateTime<Utc> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ"))
        .expect("test timestamp");
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Clock whose `sleep` advances `now` by exactly the requested duration, so
/// latency waits resolve instantly and deterministically.
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock().unwrap();
        *now = now.checked_add_signed(step).unwrap_or(*now);
    }
}

/// Clock pinned at a fixed instant whose `sleep` never resolves. Used to park
/// the tick generator inside a latency wait.
pub(crate) struct PendingClock {
    now: DateTime<Utc>,
}

impl PendingClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

#[async_trait]
impl Clock for PendingClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    async fn sleep(&self, _duration: Duration) {
        futures::future::pending::<()>().await;
    }
}

/// In-memory object store with paging and injectable failures.
///
/// Listing order is insertion order; cursors are page offsets encoded as
/// decimal strings (opaque to the pipeline, like a real backend token).
#[derive(Default)]
pub(crate) struct MockStore {
    entries: Vec<(String, ObjectKind)>,
    bodies: HashMap<String, String>,
    failing_downloads: HashSet<String>,
    /// prefix -> zero-based page index that fails
    failing_pages: HashMap<String, usize>,
    pages_served: Mutex<HashMap<String, usize>>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_object(
        mut self,
        key: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let key = key.into();
        if !self.bodies.contains_key(&key) {
            self.entries.push((key.clone(), ObjectKind::Content));
        }
        self.bodies.insert(key, body.into());
        self
    }

    /// Add a directory-style entry, as hierarchical listings surface them.
    pub(crate) fn with_prefix_entry(mut self, key: impl Into<String>) -> Self {
        self.entries.push((key.into(), ObjectKind::Prefix));
        self
    }

    pub(crate) fn with_failing_download(mut self, key: impl Into<String>) -> Self {
        self.failing_downloads.insert(key.into());
        self
    }

    pub(crate) fn with_failing_page(mut self, prefix: impl Into<String>, page: usize) -> Self {
        self.failing_pages.insert(prefix.into(), page);
        self
    }

    pub(crate) fn pages_served(&self, prefix: &str) -> usize {
        self.pages_served
            .lock()
            .unwrap()
            .get(prefix)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn list_page(
        &self,
        prefix: &str,
        page_size: usize,
        cursor: Option<&PageCursor>,
    ) -> Result<ListPage> {
        *self
            .pages_served
            .lock()
            .unwrap()
            .entry(prefix.to_string())
            .or_insert(0) += 1;

        let offset: usize = match cursor {
            Some(cursor) => cursor.as_str().parse()?,
            None => 0,
        };

        if let Some(failing) = self.failing_pages.get(prefix) {
            if offset / page_size.max(1) == *failing {
                bail!("injected listing failure at page {failing}");
            }
        }

        let matching: Vec<ObjectRef> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, kind)| ObjectRef {
                key: key.clone(),
                kind: *kind,
            })
            .collect();

        let objects: Vec<ObjectRef> = matching.iter().skip(offset).take(page_size).cloned().collect();
        let next = if offset + objects.len() < matching.len() {
            Some(PageCursor::new((offset + page_size).to_string()))
        } else {
            None
        };

        Ok(ListPage { objects, next })
    }

    async fn download(&self, object: &ObjectRef) -> Result<String> {
        if self.failing_downloads.contains(&object.key) {
            bail!("injected download failure for {}", object.key);
        }
        match self.bodies.get(&object.key) {
            Some(body) => Ok(body.clone()),
            None => bail!("no such object: {}", object.key),
        }
    }
}
