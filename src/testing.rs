//! In-memory source and destination, for tests and dry runs without a
//! database or network.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::destination::{
    AssetRef, Destination, DestinationId, PageRequest, RemoteItem, RemoteUpload, IMAGE_UPLOAD_TYPE,
};
use crate::error::{MigrateError, Result};
use crate::model::{Author, Book, Collection, Image, OwnerType, SourceId, Supplier};
use crate::payload::ItemPayload;
use crate::source::SourceStore;

/// Source catalog held in vectors, returned in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub collections: Vec<Collection>,
    pub authors: Vec<Author>,
    pub books: Vec<Book>,
    pub suppliers: Vec<Supplier>,
    pub images: Vec<Image>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    pub fn with_book(mut self, book: Book) -> Self {
        self.books.push(book);
        self
    }

    pub fn with_supplier(mut self, supplier: Supplier) -> Self {
        self.suppliers.push(supplier);
        self
    }

    pub fn with_image(
        mut self,
        owner_type: OwnerType,
        owner_id: SourceId,
        image_id: SourceId,
        asset_uid: &str,
    ) -> Self {
        self.images.push(Image {
            id: image_id,
            owner_type,
            owner_id,
            asset_uid: asset_uid.to_string(),
        });
        self
    }
}

#[async_trait]
impl SourceStore for MemorySource {
    async fn collections(&self) -> Result<Vec<Collection>> {
        Ok(self.collections.clone())
    }

    async fn authors(&self) -> Result<Vec<Author>> {
        Ok(self.authors.clone())
    }

    async fn books(&self) -> Result<Vec<Book>> {
        Ok(self.books.clone())
    }

    async fn suppliers(&self) -> Result<Vec<Supplier>> {
        Ok(self.suppliers.clone())
    }

    async fn first_image(&self, owner_type: OwnerType, owner_id: SourceId) -> Result<Option<Image>> {
        Ok(self
            .images
            .iter()
            .filter(|image| image.owner_type == owner_type && image.owner_id == owner_id)
            .min_by_key(|image| image.id)
            .cloned())
    }
}

/// Every call the destination received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum DestinationCall {
    CreateItem { schema_id: String },
    ListItems { schema_id: String, page: PageRequest },
    DeleteItem(DestinationId),
    ListUploads { filter_type: String, page: PageRequest },
    DeleteUpload(String),
    UploadImage(String),
}

#[derive(Debug, Clone)]
struct StoredItem {
    id: DestinationId,
    payload: Option<ItemPayload>,
}

#[derive(Debug, Default)]
struct DestinationState {
    items: BTreeMap<String, Vec<StoredItem>>,
    uploads: Vec<(String, String)>,
    next_id: u64,
    journal: Vec<DestinationCall>,
}

impl DestinationState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// Content API held in memory. Items get ids of the form `item-N`, uploads
/// `upload-N`.
#[derive(Debug, Default)]
pub struct MemoryDestination {
    state: Mutex<DestinationState>,
    fail_uploads: bool,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `count` items under `schema_id`
    pub fn with_items(self, schema_id: &str, count: usize) -> Self {
        {
            let mut state = self.state();
            for _ in 0..count {
                let id = DestinationId::new(state.allocate("item"));
                state
                    .items
                    .entry(schema_id.to_string())
                    .or_default()
                    .push(StoredItem { id, payload: None });
            }
        }
        self
    }

    /// Pre-populate `count` image uploads
    pub fn with_uploads(self, count: usize) -> Self {
        {
            let mut state = self.state();
            for _ in 0..count {
                let id = state.allocate("upload");
                state.uploads.push((id, IMAGE_UPLOAD_TYPE.to_string()));
            }
        }
        self
    }

    /// Make every image upload fail with an API error
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, DestinationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn journal(&self) -> Vec<DestinationCall> {
        self.state().journal.clone()
    }

    pub fn item_count(&self, schema_id: &str) -> usize {
        self.state().items.get(schema_id).map_or(0, Vec::len)
    }

    pub fn upload_count(&self) -> usize {
        self.state().uploads.len()
    }

    /// Payloads created under `schema_id` that are still present
    pub fn created_payloads(&self, schema_id: &str) -> Vec<ItemPayload> {
        self.state()
            .items
            .get(schema_id)
            .map(|items| items.iter().filter_map(|item| item.payload.clone()).collect())
            .unwrap_or_default()
    }

    pub fn uploaded_urls(&self) -> Vec<String> {
        self.state()
            .journal
            .iter()
            .filter_map(|call| match call {
                DestinationCall::UploadImage(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items.iter().skip(page.offset).take(page.limit).cloned().collect()
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn create_item(&self, schema_id: &str, payload: &ItemPayload) -> Result<DestinationId> {
        let mut state = self.state();
        state.journal.push(DestinationCall::CreateItem {
            schema_id: schema_id.to_string(),
        });

        let id = DestinationId::new(state.allocate("item"));
        state
            .items
            .entry(schema_id.to_string())
            .or_default()
            .push(StoredItem {
                id: id.clone(),
                payload: Some(payload.clone()),
            });
        Ok(id)
    }

    async fn list_items(&self, schema_id: &str, page: PageRequest) -> Result<Vec<RemoteItem>> {
        let mut state = self.state();
        state.journal.push(DestinationCall::ListItems {
            schema_id: schema_id.to_string(),
            page,
        });

        let ids: Vec<RemoteItem> = state
            .items
            .get(schema_id)
            .map(|items| items.iter().map(|item| RemoteItem { id: item.id.clone() }).collect())
            .unwrap_or_default();
        Ok(page_of(&ids, page))
    }

    async fn delete_item(&self, id: &DestinationId) -> Result<()> {
        let mut state = self.state();
        state.journal.push(DestinationCall::DeleteItem(id.clone()));

        for items in state.items.values_mut() {
            if let Some(position) = items.iter().position(|item| &item.id == id) {
                items.remove(position);
                return Ok(());
            }
        }

        Err(MigrateError::Api {
            operation: "delete item".to_string(),
            status: 404,
            body: format!("item {} not found", id),
        })
    }

    async fn list_uploads(&self, filter_type: &str, page: PageRequest) -> Result<Vec<RemoteUpload>> {
        let mut state = self.state();
        state.journal.push(DestinationCall::ListUploads {
            filter_type: filter_type.to_string(),
            page,
        });

        let uploads: Vec<RemoteUpload> = state
            .uploads
            .iter()
            .filter(|(_, kind)| kind == filter_type)
            .map(|(id, _)| RemoteUpload { id: id.clone() })
            .collect();
        Ok(page_of(&uploads, page))
    }

    async fn delete_upload(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        state.journal.push(DestinationCall::DeleteUpload(id.to_string()));

        let before = state.uploads.len();
        state.uploads.retain(|(upload_id, _)| upload_id != id);
        if state.uploads.len() == before {
            return Err(MigrateError::Api {
                operation: "delete upload".to_string(),
                status: 404,
                body: format!("upload {} not found", id),
            });
        }
        Ok(())
    }

    async fn upload_image(&self, url: &str) -> Result<AssetRef> {
        let mut state = self.state();
        state.journal.push(DestinationCall::UploadImage(url.to_string()));

        if self.fail_uploads {
            return Err(MigrateError::Api {
                operation: "upload image".to_string(),
                status: 422,
                body: format!("could not fetch {}", url),
            });
        }

        let id = state.allocate("upload");
        state.uploads.push((id.clone(), IMAGE_UPLOAD_TYPE.to_string()));
        Ok(AssetRef { upload_id: id })
    }
}
