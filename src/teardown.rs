use std::collections::BTreeMap;

use tracing::info;

use crate::destination::{PageRequest, IMAGE_UPLOAD_TYPE};
use crate::error::Result;
use crate::observer::ObserverEvent;
use crate::pipeline::RunContext;
use crate::registry::EntityKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    pub items_deleted: BTreeMap<EntityKind, usize>,
    pub bypassed: Vec<EntityKind>,
    pub uploads_deleted: usize,
}

impl TeardownReport {
    pub fn total_items(&self) -> usize {
        self.items_deleted.values().sum()
    }
}

/// Deletes every remote item of the active entity types, and every image
/// asset when purging is enabled. Not transactional: an error leaves the
/// destination partially cleared.
pub struct Teardown<'c, 'a> {
    ctx: &'c RunContext<'a>,
}

impl<'c, 'a> Teardown<'c, 'a> {
    pub fn new(ctx: &'c RunContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<TeardownReport> {
        let mut report = TeardownReport::default();

        for entity in self.ctx.registry.teardown_order() {
            if !entity.active {
                self.ctx.observer.notify(&ObserverEvent::TeardownBypassed(entity.kind));
                report.bypassed.push(entity.kind);
                continue;
            }

            let deleted = self.clear_items(entity.kind).await?;
            report.items_deleted.insert(entity.kind, deleted);
        }

        if self.ctx.images.purge {
            report.uploads_deleted = self.clear_uploads().await?;
        }

        info!(
            items = report.total_items(),
            uploads = report.uploads_deleted,
            "Teardown finished"
        );
        Ok(report)
    }

    // Deleting shifts later pages forward, so every round re-reads the first page.
    async fn clear_items(&self, kind: EntityKind) -> Result<usize> {
        let schema_id = self.ctx.registry.schema_id(kind)?;
        let limit = self.ctx.page_limit;
        let mut deleted = 0;

        loop {
            let page = self
                .ctx
                .destination
                .list_items(schema_id, PageRequest::first(limit))
                .await?;
            let exhausted = page.is_empty() || page.len() < limit;

            for item in page {
                self.ctx.destination.delete_item(&item.id).await?;
                self.ctx.observer.notify(&ObserverEvent::ItemDeleted { kind, id: item.id });
                deleted += 1;
            }

            if exhausted {
                return Ok(deleted);
            }
        }
    }

    async fn clear_uploads(&self) -> Result<usize> {
        let limit = self.ctx.page_limit;
        let mut deleted = 0;

        loop {
            let page = self
                .ctx
                .destination
                .list_uploads(IMAGE_UPLOAD_TYPE, PageRequest::first(limit))
                .await?;
            let exhausted = page.is_empty() || page.len() < limit;

            for upload in page {
                self.ctx.destination.delete_upload(&upload.id).await?;
                self.ctx.observer.notify(&ObserverEvent::UploadDeleted { id: upload.id });
                deleted += 1;
            }

            if exhausted {
                return Ok(deleted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageSettings;
    use crate::destination::Destination;
    use crate::observer::RecordingObserver;
    use crate::registry::{EntityRegistry, EntityType};
    use crate::testing::{MemoryDestination, MemorySource};

    fn registry() -> EntityRegistry {
        EntityRegistry::new([
            EntityType::new(EntityKind::Author, "A", true),
            EntityType::new(EntityKind::Book, "B", true),
            EntityType::inactive(EntityKind::Collection),
            EntityType::new(EntityKind::Supplier, "S", false),
        ])
    }

    #[tokio::test]
    async fn test_clears_every_page_of_active_types() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new()
            .with_items("A", 7)
            .with_items("B", 3)
            .with_items("S", 2);
        let registry = registry();
        let images = ImageSettings::default();
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 3, &observer);

        let report = Teardown::new(&ctx).run().await.unwrap();

        assert_eq!(report.items_deleted.get(&EntityKind::Author), Some(&7));
        assert_eq!(report.items_deleted.get(&EntityKind::Book), Some(&3));
        assert_eq!(report.bypassed, vec![EntityKind::Collection, EntityKind::Supplier]);
        assert!(destination.list_items("A", PageRequest::first(3)).await.unwrap().is_empty());
        assert!(destination.list_items("B", PageRequest::first(3)).await.unwrap().is_empty());
        // inactive types are left alone
        assert_eq!(destination.item_count("S"), 2);
    }

    #[tokio::test]
    async fn test_follows_teardown_order() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new().with_items("A", 1).with_items("B", 1);
        let registry = registry();
        let images = ImageSettings::default();
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        Teardown::new(&ctx).run().await.unwrap();

        let kinds: Vec<EntityKind> = observer
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::ItemDeleted { kind, .. } => Some(kind),
                ObserverEvent::TeardownBypassed(kind) => Some(kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, EntityKind::TEARDOWN_ORDER.to_vec());
    }

    #[tokio::test]
    async fn test_purges_uploads_only_when_enabled() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new().with_uploads(5);
        let registry = registry();
        let observer = RecordingObserver::new();

        let keep = ImageSettings::default();
        let ctx = RunContext::new(&source, &destination, &registry, &keep, 2, &observer);
        assert_eq!(Teardown::new(&ctx).run().await.unwrap().uploads_deleted, 0);
        assert_eq!(destination.upload_count(), 5);

        let purge = ImageSettings { purge: true, ..ImageSettings::default() };
        let ctx = RunContext::new(&source, &destination, &registry, &purge, 2, &observer);
        assert_eq!(Teardown::new(&ctx).run().await.unwrap().uploads_deleted, 5);
        assert_eq!(destination.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_exact_page_multiple_needs_one_more_round() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new().with_items("A", 4);
        let registry = registry();
        let images = ImageSettings::default();
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 2, &observer);

        let report = Teardown::new(&ctx).run().await.unwrap();

        assert_eq!(report.items_deleted.get(&EntityKind::Author), Some(&4));
        assert_eq!(destination.item_count("A"), 0);
    }

    #[tokio::test]
    async fn test_zero_page_limit_still_terminates() {
        let source = MemorySource::new();
        let destination = MemoryDestination::new().with_items("A", 3).with_uploads(2);
        let registry = registry();
        let images = ImageSettings { purge: true, ..ImageSettings::default() };
        let observer = RecordingObserver::new();

        let ctx = RunContext::new(&source, &destination, &registry, &images, 0, &observer);
        assert_eq!(ctx.page_limit, 1);
        let report = Teardown::new(&ctx).run().await.unwrap();
        assert_eq!(report.items_deleted.get(&EntityKind::Author), Some(&3));
        assert_eq!(report.uploads_deleted, 2);

        // a literal context bypasses the constructor; an empty page ends the loop
        let destination_left = MemoryDestination::new().with_items("A", 2);
        let ctx = RunContext {
            destination: &destination_left,
            page_limit: 0,
            ..ctx
        };
        let report = Teardown::new(&ctx).run().await.unwrap();
        assert_eq!(report.total_items(), 0);
        assert_eq!(destination_left.item_count("A"), 2);
    }
}
