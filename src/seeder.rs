use tracing::debug;

use crate::assets::AssetUploader;
use crate::destination::DestinationId;
use crate::error::Result;
use crate::model::SourceId;
use crate::observer::ObserverEvent;
use crate::payload::{AuthorPayload, BookPayload, CollectionPayload, ItemPayload, SupplierPayload};
use crate::pipeline::RunContext;
use crate::registry::EntityKind;
use crate::remap::RemapTable;

/// Shared placeholder used for author avatars and the supplier logo
pub const PORTRAIT_PLACEHOLDER: &str = "2014/03/06/15/56/27/994/9788886762_168.jpg";
pub const COVER_PLACEHOLDER: &str = "2017/09/11/16/06/19/142/Coperta_Atti_Simposio2016.jpg";

pub const AUTHOR_FIXTURES: SourceId = 3;
/// Seeded authors linked to the book fixture, by ordinal
pub const BOOK_FIXTURE_AUTHORS: [SourceId; 2] = [1, 3];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    /// Fixture ordinal to destination id, per entity type
    pub remap: RemapTable,
}

impl SeedReport {
    pub fn authors(&self) -> Vec<DestinationId> {
        (1..=AUTHOR_FIXTURES)
            .filter_map(|i| self.remap.resolve(EntityKind::Author, i).cloned())
            .collect()
    }
}

/// Creates a small fixed record graph straight against the destination.
/// Fixtures of inactive entity types are skipped.
pub struct TestSeeder<'c, 'a> {
    ctx: &'c RunContext<'a>,
    assets: AssetUploader<'a>,
}

impl<'c, 'a> TestSeeder<'c, 'a> {
    pub fn new(ctx: &'c RunContext<'a>) -> Self {
        Self {
            ctx,
            assets: AssetUploader::new(ctx),
        }
    }

    pub async fn seed(&self) -> Result<SeedReport> {
        let mut remap = RemapTable::new();

        if self.ctx.registry.is_active(EntityKind::Collection) {
            let payload = CollectionPayload {
                name: Some("Collana 1".to_string()),
                description: None,
            };
            self.create(&mut remap, 1, "Collana 1", ItemPayload::Collection(payload))
                .await?;
        }

        if self.ctx.registry.is_active(EntityKind::Author) {
            for i in 1..=AUTHOR_FIXTURES {
                let full_name = format!("Ciccio Baiano {}", i);
                let payload = AuthorPayload {
                    full_name: full_name.clone(),
                    alias: Some(format!("Baianino {}", i)),
                    biography: None,
                    country: None,
                    avatar: Some(self.assets.upload_placeholder(PORTRAIT_PLACEHOLDER).await?),
                };
                self.create(&mut remap, i, &full_name, ItemPayload::Author(payload))
                    .await?;
            }
        }

        if self.ctx.registry.is_active(EntityKind::Book) {
            let payload = BookPayload {
                title: Some("Libro di prova".to_string()),
                collection: remap.resolve(EntityKind::Collection, 1).cloned(),
                cover: Some(self.assets.upload_placeholder(COVER_PLACEHOLDER).await?),
                authors: remap.resolve_all(EntityKind::Author, &BOOK_FIXTURE_AUTHORS),
                isbn: Some("XXXXX".to_string()),
                pages: Some(250),
                stock: Some(20),
                highlight: Some(true),
                ..BookPayload::default()
            };
            self.create(&mut remap, 1, "Libro di prova", ItemPayload::Book(payload))
                .await?;
        }

        if self.ctx.registry.is_active(EntityKind::Supplier) {
            let payload = SupplierPayload {
                name: Some("Distributore xxx".to_string()),
                city: Some("Firenze".to_string()),
                region: Some("Toscana".to_string()),
                address: None,
                telephone: Some("3445435".to_string()),
                description: None,
                url: Some("https://www.google.com".to_string()),
                email: Some("spleenteo@gmail.com".to_string()),
                published: Some(true),
                logo: Some(self.assets.upload_placeholder(PORTRAIT_PLACEHOLDER).await?),
            };
            self.create(&mut remap, 1, "Distributore xxx", ItemPayload::Supplier(payload))
                .await?;
        }

        Ok(SeedReport { remap })
    }

    async fn create(
        &self,
        remap: &mut RemapTable,
        ordinal: SourceId,
        label: &str,
        payload: ItemPayload,
    ) -> Result<()> {
        let kind = payload.kind();
        let schema_id = self.ctx.registry.schema_id(kind)?;
        let id = self.ctx.destination.create_item(schema_id, &payload).await?;
        debug!(kind = %kind, ordinal, id = %id, "Seeded fixture");

        remap.record(kind, ordinal, id.clone())?;
        self.ctx.observer.notify(&ObserverEvent::FixtureCreated {
            kind,
            label: label.to_string(),
            id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageSettings;
    use crate::observer::RecordingObserver;
    use crate::registry::{EntityRegistry, EntityType};
    use crate::testing::{MemoryDestination, MemorySource};

    fn registry(collection: bool, author: bool) -> EntityRegistry {
        EntityRegistry::new([
            EntityType::new(EntityKind::Collection, "C", collection),
            EntityType::new(EntityKind::Author, "A", author),
            EntityType::new(EntityKind::Book, "B", true),
            EntityType::new(EntityKind::Supplier, "S", true),
        ])
    }

    fn book_payload(destination: &MemoryDestination) -> BookPayload {
        match destination.created_payloads("B").into_iter().next() {
            Some(ItemPayload::Book(payload)) => payload,
            other => panic!("Expected one book payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_book_links_first_and_third_author() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new();
        let registry = registry(true, true);
        let images = ImageSettings::default();
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        let report = TestSeeder::new(&ctx).seed().await.unwrap();

        let authors = report.authors();
        assert_eq!(authors.len(), 3);
        let book = book_payload(&destination);
        assert_eq!(book.authors, vec![authors[0].clone(), authors[2].clone()]);
        assert_eq!(book.collection, report.remap.resolve(EntityKind::Collection, 1).cloned());
        assert_eq!(book.isbn.as_deref(), Some("XXXXX"));
        assert_eq!(book.pages, Some(250));
    }

    #[tokio::test]
    async fn test_placeholders_upload_even_when_images_are_excluded() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new();
        let registry = registry(true, true);
        let images = ImageSettings { include: false, ..ImageSettings::default() };
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        TestSeeder::new(&ctx).seed().await.unwrap();

        // three avatars, one cover, one logo
        let urls = destination.uploaded_urls();
        assert_eq!(urls.len(), 5);
        assert!(urls[3].ends_with(COVER_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_inactive_types_are_not_seeded() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new();
        let registry = registry(false, false);
        let images = ImageSettings::default();
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        let report = TestSeeder::new(&ctx).seed().await.unwrap();

        assert_eq!(destination.item_count("C"), 0);
        assert_eq!(destination.item_count("A"), 0);
        let book = book_payload(&destination);
        assert_eq!(book.collection, None);
        assert!(book.authors.is_empty());
        assert_eq!(report.remap.kinds(), vec![EntityKind::Book, EntityKind::Supplier]);
    }
}
