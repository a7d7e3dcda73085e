//! In-memory object locator for tests and local development

use async_trait::async_trait;
use dashmap::DashMap;

use crate::auth::Subject;
use crate::db::locator::{ObjectLocator, ResolvedObject};
use crate::db::schemas::MediaRecord;
use crate::types::GatewayError;

/// Locator backed by a concurrent map keyed by media id
#[derive(Debug, Default)]
pub struct MemoryObjectLocator {
    records: DashMap<String, MediaRecord>,
}

impl MemoryObjectLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a set of records
    pub fn with_records(records: impl IntoIterator<Item = MediaRecord>) -> Self {
        let locator = Self::new();
        for record in records {
            locator.insert(record);
        }
        locator
    }

    pub fn insert(&self, record: MediaRecord) {
        self.records.insert(record.media_id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ObjectLocator for MemoryObjectLocator {
    async fn locate(
        &self,
        subject: &Subject,
        object_id: &str,
    ) -> Result<Option<ResolvedObject>, GatewayError> {
        Ok(self
            .records
            .get(object_id)
            .filter(|record| record.is_visible_to(subject.as_str()))
            .map(|record| ResolvedObject::new(&record.storage_path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> MemoryObjectLocator {
        MemoryObjectLocator::with_records([
            MediaRecord::new("abc", "user_1", "u/1/img.png"),
            MediaRecord::new("def", "user_2", "/u/2/cat.jpg"),
        ])
    }

    #[tokio::test]
    async fn test_locate_owned_object() {
        let found = locator()
            .locate(&Subject("user_1".into()), "abc")
            .await
            .unwrap();
        assert_eq!(found, Some(ResolvedObject::new("/u/1/img.png")));
        assert_eq!(found.unwrap().canonical_path, "/u/1/img.png");
    }

    #[tokio::test]
    async fn test_unknown_and_foreign_objects_look_the_same() {
        let l = locator();
        let subject = Subject("user_1".into());
        assert_eq!(l.locate(&subject, "xyz").await.unwrap(), None);
        assert_eq!(l.locate(&subject, "def").await.unwrap(), None);
    }
}
