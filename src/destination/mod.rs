pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::SourceId;
use crate::payload::ItemPayload;

pub use http::{CmsClient, CmsSettings};

/// Identifier of an item in the content API
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity mapping used when nothing is written remotely
    pub fn from_source(id: SourceId) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an uploaded asset, in the shape file fields expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub upload_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: DestinationId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpload {
    pub id: String,
}

/// Offset pagination window for list calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Upload filter used for image assets
pub const IMAGE_UPLOAD_TYPE: &str = "image";

/// Operations the migrator needs from the remote content API. Every call is
/// awaited before the next one is issued.
#[async_trait]
pub trait Destination: Send + Sync {
    async fn create_item(&self, schema_id: &str, payload: &ItemPayload) -> Result<DestinationId>;

    async fn list_items(&self, schema_id: &str, page: PageRequest) -> Result<Vec<RemoteItem>>;

    async fn delete_item(&self, id: &DestinationId) -> Result<()>;

    async fn list_uploads(&self, filter_type: &str, page: PageRequest) -> Result<Vec<RemoteUpload>>;

    async fn delete_upload(&self, id: &str) -> Result<()>;

    /// Import the image found at `url` and return a reference usable in a
    /// file field.
    async fn upload_image(&self, url: &str) -> Result<AssetRef>;
}
