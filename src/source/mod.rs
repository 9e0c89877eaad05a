pub mod connection;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Author, Book, Collection, Image, OwnerType, SourceId, Supplier};

pub use connection::{connect_with_url, DatabaseConfig};
pub use postgres::PgSource;

/// Read-only access to the source catalog
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn collections(&self) -> Result<Vec<Collection>>;

    async fn authors(&self) -> Result<Vec<Author>>;

    /// Books with `collection_id` and `author_ids` already loaded
    async fn books(&self) -> Result<Vec<Book>>;

    async fn suppliers(&self) -> Result<Vec<Supplier>>;

    /// The image with the lowest id attached to `(owner_type, owner_id)`
    async fn first_image(&self, owner_type: OwnerType, owner_id: SourceId) -> Result<Option<Image>>;
}
