// Export assembly: ticks -> listings -> downloads -> decoded batches
//
// Buckets are drained strictly in tick order; within a bucket, downloads run
// concurrently but surface in listing order, so the output is deterministic
// for a given store state.

use std::pin::pin;
use std::sync::Arc;

use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::error::ExportError;
use crate::fetch::fetch_text;
use crate::listing::list_bucket;
use crate::options::ExportOptions;
use crate::record::{DeviceLog, Timestamped};
use crate::store::ObjectStore;
use crate::ticks::{export_ticks, TimeWindow};

/// Streaming export of minute-partitioned log objects.
///
/// Holds the collaborators for one export invocation; each stream-producing
/// method can be called independently for the raw or decoded view.
pub struct Exporter {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Inject a clock, for tests or replay against historical windows.
    pub fn with_clock(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// The minute buckets this export will poll, in order.
    pub fn ticks(
        &self,
        window: TimeWindow,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<DateTime<Utc>, ExportError>> {
        export_ticks(window, &self.options, self.clock.clone(), cancel)
    }

    /// Every log object body of one bucket, paired with the bucket timestamp.
    ///
    /// Downloads fan out up to `max_concurrent_downloads` wide but results
    /// keep listing order. Download failures yield empty text.
    pub fn bucket_texts(
        &self,
        timestamp: DateTime<Utc>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Timestamped<String>, ExportError>> {
        bucket_texts(self.store.clone(), timestamp, &self.options, cancel)
    }

    /// The flattened raw export: bucket streams concatenated in tick order.
    /// Bucket N+1 does not begin until bucket N has drained, and the first
    /// listing error ends the whole export.
    pub fn raw(
        &self,
        window: TimeWindow,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Timestamped<String>, ExportError>> {
        let store = self.store.clone();
        let options = self.options.clone();
        let ticks = export_ticks(window, &self.options, self.clock.clone(), cancel.clone());
        try_stream! {
            let mut ticks = pin!(ticks);
            while let Some(timestamp) = ticks.try_next().await? {
                let bucket = bucket_texts(store.clone(), timestamp, &options, cancel.clone());
                let mut bucket = pin!(bucket);
                while let Some(item) = bucket.try_next().await? {
                    yield item;
                }
            }
        }
    }

    /// The decoded export: each raw text parsed as a JSON array of records.
    /// Empty or malformed text decodes to an empty batch, never an error.
    pub fn batches<R: DeserializeOwned>(
        &self,
        window: TimeWindow,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Timestamped<Vec<R>>, ExportError>> {
        self.raw(window, cancel).map_ok(|item| {
            let timestamp = item.timestamp;
            item.map(|text| decode_batch(&text, timestamp))
        })
    }

    /// `batches` fixed to the device-log record type.
    pub fn device_logs(
        &self,
        window: TimeWindow,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Timestamped<Vec<DeviceLog>>, ExportError>> {
        self.batches(window, cancel)
    }
}

fn bucket_texts(
    store: Arc<dyn ObjectStore>,
    timestamp: DateTime<Utc>,
    options: &ExportOptions,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Timestamped<String>, ExportError>> {
    let fetch_store = store.clone();
    list_bucket(store, timestamp, options, cancel)
        .map_ok(move |object| {
            let store = fetch_store.clone();
            async move {
                let text = fetch_text(store.as_ref(), &object).await;
                Ok::<_, ExportError>(Timestamped::new(text, timestamp))
            }
        })
        .try_buffered(options.max_concurrent_downloads)
}

fn decode_batch<R: DeserializeOwned>(text: &str, timestamp: DateTime<Utc>) -> Vec<R> {
    if text.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(text) {
        Ok(records) => records,
        Err(error) => {
            tracing::error!(%timestamp, error = %error, "error decoding log batch JSON");
            Vec::new()
        }
    }
}
