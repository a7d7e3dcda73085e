//! Object locator seam

use async_trait::async_trait;

use crate::auth::Subject;
use crate::signing::canonical_path;
use crate::types::GatewayError;

/// Canonical storage path of a located object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    pub canonical_path: String,
}

impl ResolvedObject {
    pub fn new(storage_path: &str) -> Self {
        Self {
            canonical_path: canonical_path(storage_path),
        }
    }
}

/// Maps caller-visible object ids to storage paths.
///
/// `Ok(None)` covers both unknown ids and objects the subject may not
/// see, so callers cannot probe for other users' media. `Err` is reserved
/// for backend failures.
#[async_trait]
pub trait ObjectLocator: Send + Sync {
    async fn locate(
        &self,
        subject: &Subject,
        object_id: &str,
    ) -> Result<Option<ResolvedObject>, GatewayError>;
}
