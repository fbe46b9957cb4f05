// Bucket listing: paginated walk of one minute's key prefix
//
// Listing fails hard: a page that cannot be fetched means the bucket's
// contents cannot be trusted, so the error terminates the stream instead of
// being swallowed as "no objects".

use std::sync::Arc;

use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::ExportError;
use crate::options::ExportOptions;
use crate::store::{ObjectKind, ObjectRef, ObjectStore, PageCursor, LOG_OBJECT_SUFFIX};

/// Key prefix for one minute bucket, directory form.
///
/// Exported objects live at `{prefix}<uuid>/logs.v1.data`.
pub fn bucket_prefix(timestamp: DateTime<Utc>) -> String {
    format!("{}/logs/", timestamp.format("%Y/%m/%d/%H/%M"))
}

/// List the log objects of one minute bucket, page by page.
///
/// Objects are emitted in page order, pages in cursor order. Entries that are
/// not plain content objects or do not carry the `logs.v1.data` suffix are
/// skipped. Cancellation mid-pagination ends the stream normally.
pub fn list_bucket(
    store: Arc<dyn ObjectStore>,
    timestamp: DateTime<Utc>,
    options: &ExportOptions,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<ObjectRef, ExportError>> {
    let prefix = bucket_prefix(timestamp);
    let page_size = options.page_size;

    try_stream! {
        let mut cursor: Option<PageCursor> = None;
        loop {
            if cancel.is_cancelled() {
                return;
            }

            let page = store
                .list_page(&prefix, page_size, cursor.as_ref())
                .await
                .map_err(|source| ExportError::List {
                    prefix: prefix.clone(),
                    source,
                })?;

            for object in page.objects {
                if object.kind == ObjectKind::Content && object.key.ends_with(LOG_OBJECT_SUFFIX) {
                    yield object;
                }
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => return,
            }
        }
    }
}
