//! Media document schema
//!
//! Only the fields needed to resolve a path are mapped; the rest of the
//! document (captions, dimensions, timestamps) is ignored on read.

use serde::{Deserialize, Serialize};

pub const MEDIA_COLLECTION: &str = "media";

/// A user-uploaded media object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Caller-visible id used in `/media/{id}`
    pub media_id: String,
    /// Subject id of the uploader
    pub owner_id: String,
    /// Path inside the storage zone, e.g. `u/1/img.png`
    pub storage_path: String,
}

impl MediaRecord {
    pub fn new(
        media_id: impl Into<String>,
        owner_id: impl Into<String>,
        storage_path: impl Into<String>,
    ) -> Self {
        Self {
            media_id: media_id.into(),
            owner_id: owner_id.into(),
            storage_path: storage_path.into(),
        }
    }

    /// Whether `subject_id` may read this object
    pub fn is_visible_to(&self, subject_id: &str) -> bool {
        self.owner_id == subject_id
    }
}
