// Content fetching: download one listed object, fail-soft
//
// One broken object must never abort the export, so download failures are
// logged and substituted with empty text. The empty text later decodes to an
// empty batch.

use crate::store::{ObjectRef, ObjectStore};

/// Download the text body of `object`, substituting the empty string on any
/// failure.
pub async fn fetch_text(store: &dyn ObjectStore, object: &ObjectRef) -> String {
    match store.download(object).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!(key = %object.key, error = %error, "error downloading log object");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockStore;

    #[tokio::test]
    async fn test_returns_body_on_success() {
        let store = MockStore::new().with_object("2024/01/01/00/00/logs/a/logs.v1.data", "[{}]");
        let object = ObjectRef::content("2024/01/01/00/00/logs/a/logs.v1.data");
        assert_eq!(fetch_text(&store, &object).await, "[{}]");
    }

    #[tokio::test]
    async fn test_substitutes_empty_text_on_failure() {
        let store = MockStore::new()
            .with_object("2024/01/01/00/00/logs/a/logs.v1.data", "[{}]")
            .with_failing_download("2024/01/01/00/00/logs/a/logs.v1.data");
        let object = ObjectRef::content("2024/01/01/00/00/logs/a/logs.v1.data");
        assert_eq!(fetch_text(&store, &object).await, "");
    }

    #[tokio::test]
    async fn test_missing_object_is_soft_too() {
        let store = MockStore::new();
        let object = ObjectRef::content("2024/01/01/00/00/logs/gone/logs.v1.data");
        assert_eq!(fetch_text(&store, &object).await, "");
    }
}
