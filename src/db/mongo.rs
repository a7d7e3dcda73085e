//! MongoDB-backed object locator
//!
//! The client is owned by the locator and created on first use rather than
//! at startup, so the gateway boots (and serves 401s) while the database
//! is still coming up. A failed connection is not cached; the next request
//! tries again.

use async_trait::async_trait;
use bson::doc;
use mongodb::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::auth::Subject;
use crate::db::locator::{ObjectLocator, ResolvedObject};
use crate::db::schemas::MediaRecord;
use crate::types::GatewayError;

/// Object locator reading the media collection
pub struct MongoObjectLocator {
    uri: String,
    db_name: String,
    collection_name: String,
    client: OnceCell<Client>,
}

impl MongoObjectLocator {
    /// Create a locator. No connection is made until the first lookup.
    pub fn new(uri: &str, db_name: &str, collection_name: &str) -> Self {
        Self {
            uri: uri.to_string(),
            db_name: db_name.to_string(),
            collection_name: collection_name.to_string(),
            client: OnceCell::new(),
        }
    }

    /// Acquire the shared client, connecting on first use
    pub async fn acquire(&self) -> Result<&Client, GatewayError> {
        self.client
            .get_or_try_init(|| connect(&self.uri, &self.db_name))
            .await
    }

    /// Whether a connection has been established
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    /// Release the client and its pooled connections.
    ///
    /// Lookups after this fail with `UpstreamUnavailable`.
    pub async fn close(&self) {
        if let Some(client) = self.client.get() {
            client.clone().shutdown().await;
            info!("MongoDB client closed");
        }
    }
}

/// Connect and verify with a ping
async fn connect(uri: &str, db_name: &str) -> Result<Client, GatewayError> {
    info!("Connecting to MongoDB");

    // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
    let timeout_uri = if uri.contains('?') {
        format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
    } else {
        format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
    };

    let client = Client::with_uri_str(&timeout_uri).await?;

    client
        .database(db_name)
        .run_command(doc! { "ping": 1 })
        .await?;

    info!("Connected to MongoDB database '{}'", db_name);
    Ok(client)
}

#[async_trait]
impl ObjectLocator for MongoObjectLocator {
    async fn locate(
        &self,
        subject: &Subject,
        object_id: &str,
    ) -> Result<Option<ResolvedObject>, GatewayError> {
        let client = self.acquire().await?;
        let collection = client
            .database(&self.db_name)
            .collection::<MediaRecord>(&self.collection_name);

        // Owner filter in the query: foreign objects are indistinguishable from missing ones
        let record = collection
            .find_one(doc! { "media_id": object_id, "owner_id": subject.as_str() })
            .await?;

        debug!(object_id = %object_id, found = record.is_some(), "Media lookup");
        Ok(record.map(|r| ResolvedObject::new(&r.storage_path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_does_not_connect() {
        let locator = MongoObjectLocator::new("mongodb://127.0.0.1:1", "postern", "media");
        assert!(!locator.is_connected());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_upstream_error() {
        let locator = MongoObjectLocator::new("mongodb://127.0.0.1:1", "postern", "media");
        let err = locator
            .locate(&Subject("user_1".into()), "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
        assert!(!locator.is_connected());
    }
}
