// blobtail-storage - OpenDAL-backed object store access
//
// One adapter over opendal's Operator covers every backend the exporter
// reads from:
// - S3 (and any S3-compatible endpoint)
// - R2 via its S3-compatible endpoint
// - Local filesystem
// - In-memory (tests)
//
// Request shaping (endpoint, credentials, region) is configured once on the
// backend builder; the pipeline never sees it.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use opendal::Operator;

use blobtail_core::{ListPage, ObjectKind, ObjectRef, ObjectStore, PageCursor};

/// Object store adapter over an opendal [`Operator`].
#[derive(Clone)]
pub struct OpendalStore {
    operator: Operator,
}

impl OpendalStore {
    /// Wrap an already-configured operator.
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// S3, including S3-compatible endpoints.
    #[cfg(feature = "services-s3")]
    pub fn new_s3(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
    ) -> Result<Self> {
        use opendal::services;

        let mut builder = services::S3::default().bucket(bucket).region(region);

        if let Some(ep) = endpoint {
            builder = builder.endpoint(ep);
        }

        if let Some(key) = access_key_id {
            builder = builder.access_key_id(key);
        }

        if let Some(secret) = secret_access_key {
            builder = builder.secret_access_key(secret);
        }

        Ok(Self::new(Operator::new(builder)?.finish()))
    }

    /// R2 (Cloudflare) through its S3-compatible endpoint.
    #[cfg(feature = "services-s3")]
    pub fn new_r2(
        bucket: &str,
        account_id: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Self> {
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", account_id);
        Self::new_s3(
            bucket,
            "auto",
            Some(&endpoint),
            Some(access_key_id),
            Some(secret_access_key),
        )
    }

    /// Local filesystem rooted at `root`.
    #[cfg(any(feature = "services-fs", test))]
    pub fn new_fs(root: &str) -> Result<Self> {
        use opendal::services;

        let builder = services::Fs::default().root(root);
        Ok(Self::new(Operator::new(builder)?.finish()))
    }

    /// In-memory backend for tests.
    #[cfg(any(feature = "services-memory", test))]
    pub fn new_memory() -> Result<Self> {
        use opendal::services;

        Ok(Self::new(Operator::new(services::Memory::default())?.finish()))
    }

    /// Seed one object; test setup helper.
    #[cfg(any(feature = "services-memory", test))]
    pub async fn put(&self, key: &str, body: &str) -> Result<()> {
        self.operator.write(key, body.as_bytes().to_vec()).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    /// One page of the recursive listing under `prefix`.
    ///
    /// opendal listers hide the backend's own continuation token, so the
    /// cursor is the last path of the previous page, applied over a sorted
    /// snapshot of the prefix's entries. Backends disagree on listing order
    /// (fs surfaces readdir order), so the snapshot is sorted here rather
    /// than trusting the lister; minute prefixes are small.
    async fn list_page(
        &self,
        prefix: &str,
        page_size: usize,
        cursor: Option<&PageCursor>,
    ) -> Result<ListPage> {
        let mut lister = match self.operator.lister_with(prefix).recursive(true).await {
            Ok(lister) => lister,
            // A minute with no writes has no common prefix on some backends.
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                return Ok(ListPage::last(Vec::new()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = lister.next().await {
            let entry = entry?;
            let kind = if entry.metadata().mode().is_file() {
                ObjectKind::Content
            } else {
                ObjectKind::Prefix
            };
            entries.push(ObjectRef {
                key: entry.path().to_string(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let start = match cursor {
            Some(cursor) => entries.partition_point(|o| o.key.as_str() <= cursor.as_str()),
            None => 0,
        };
        let has_more = entries.len().saturating_sub(start) > page_size;
        let objects: Vec<ObjectRef> = entries.into_iter().skip(start).take(page_size).collect();

        let next = has_more
            .then(|| objects.last().map(|o| PageCursor::new(o.key.clone())))
            .flatten();
        tracing::debug!(
            prefix,
            entries = objects.len(),
            has_more = next.is_some(),
            "listed page"
        );
        Ok(ListPage { objects, next })
    }

    async fn download(&self, object: &ObjectRef) -> Result<String> {
        let buffer = self.operator.read(&object.key).await?;
        let text = String::from_utf8(buffer.to_vec())?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> OpendalStore {
        let store = OpendalStore::new_memory().unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            store
                .put(
                    &format!("2024/01/01/00/00/logs/{name}/logs.v1.data"),
                    r#"[{"id":1}]"#,
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_page_walks_cursor_to_exhaustion() {
        let store = seeded_store().await;

        let mut keys = Vec::new();
        let mut cursor: Option<PageCursor> = None;
        let mut pages = 0;
        loop {
            let page = store
                .list_page("2024/01/01/00/00/logs/", 2, cursor.as_ref())
                .await
                .unwrap();
            pages += 1;
            keys.extend(page.objects.into_iter().map(|o| o.key));
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let files: Vec<_> = keys
            .iter()
            .filter(|k| k.ends_with("logs.v1.data"))
            .collect();
        assert_eq!(files.len(), 5);
        assert!(pages >= 3);
    }

    #[tokio::test]
    async fn test_fs_cursor_walk_drops_nothing_across_pages() {
        // Readdir order is arbitrary, so the cursor must not rely on the
        // backend yielding sorted paths.
        let dir = tempfile::tempdir().unwrap();
        let store = OpendalStore::new_fs(dir.path().to_str().unwrap()).unwrap();
        let mut expected = Vec::new();
        for i in 0..60 {
            let key = format!("2024/01/01/00/00/logs/{i:02}/logs.v1.data");
            store.put(&key, r#"[{"id":1}]"#).await.unwrap();
            expected.push(key);
        }

        let mut keys = Vec::new();
        let mut cursor: Option<PageCursor> = None;
        loop {
            let page = store
                .list_page("2024/01/01/00/00/logs/", 7, cursor.as_ref())
                .await
                .unwrap();
            keys.extend(
                page.objects
                    .into_iter()
                    .filter(|o| o.kind == ObjectKind::Content)
                    .map(|o| o.key),
            );
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn test_list_page_missing_prefix_is_empty() {
        let store = OpendalStore::new_memory().unwrap();
        let page = store
            .list_page("2024/01/01/00/09/logs/", 10, None)
            .await
            .unwrap();
        assert!(page.objects.is_empty());
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_download_roundtrip() {
        let store = seeded_store().await;
        let object = ObjectRef::content("2024/01/01/00/00/logs/a/logs.v1.data");
        assert_eq!(store.download(&object).await.unwrap(), r#"[{"id":1}]"#);
    }

    #[tokio::test]
    async fn test_download_missing_object_errors() {
        let store = OpendalStore::new_memory().unwrap();
        let object = ObjectRef::content("2024/01/01/00/00/logs/zz/logs.v1.data");
        assert!(store.download(&object).await.is_err());
    }
}
