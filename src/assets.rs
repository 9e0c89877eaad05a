use tracing::debug;

use crate::config::ImageSettings;
use crate::destination::{AssetRef, Destination};
use crate::error::Result;
use crate::model::{OwnerType, SourceId};
use crate::pipeline::RunContext;
use crate::run_mode::WriteMode;
use crate::source::SourceStore;

/// Public url of a gallery image
pub fn image_url(asset_host: &str, asset_uid: &str) -> String {
    format!(
        "{}/{}",
        asset_host.trim_end_matches('/'),
        asset_uid.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub url: String,
    /// None when nothing was uploaded (preview)
    pub asset: Option<AssetRef>,
}

/// Exchanges the first gallery image of a record for a remote asset
pub struct AssetUploader<'a> {
    source: &'a dyn SourceStore,
    destination: &'a dyn Destination,
    asset_host: &'a str,
    include: bool,
}

impl<'a> AssetUploader<'a> {
    pub fn new(ctx: &RunContext<'a>) -> Self {
        let images: &'a ImageSettings = ctx.images;
        Self {
            source: ctx.source,
            destination: ctx.destination,
            asset_host: &images.asset_host,
            include: images.include,
        }
    }

    /// Look up the owner's image and upload it in write mode. Returns `None`
    /// when image inclusion is off or the owner has no image. Upload errors
    /// are returned as is.
    pub async fn resolve(
        &self,
        owner_type: OwnerType,
        owner_id: SourceId,
        mode: WriteMode,
    ) -> Result<Option<ResolvedAsset>> {
        if !self.include {
            return Ok(None);
        }

        let Some(image) = self.source.first_image(owner_type, owner_id).await? else {
            debug!(owner = %owner_type, owner_id, "No image");
            return Ok(None);
        };

        let url = image_url(self.asset_host, &image.asset_uid);
        let asset = match mode {
            WriteMode::Preview => None,
            WriteMode::Write => {
                debug!(owner = %owner_type, owner_id, url = %url, "Uploading image");
                Some(self.destination.upload_image(&url).await?)
            }
        };

        Ok(Some(ResolvedAsset { url, asset }))
    }

    /// Upload a fixed url, bypassing the inclusion flag
    pub async fn upload_placeholder(&self, asset_uid: &str) -> Result<AssetRef> {
        let url = image_url(self.asset_host, asset_uid);
        debug!(url = %url, "Uploading placeholder image");
        self.destination.upload_image(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use crate::registry::EntityRegistry;
    use crate::testing::{MemoryDestination, MemorySource};

    #[test]
    fn test_image_url_joins_host_and_uid() {
        assert_eq!(image_url("http://host", "2014/a.jpg"), "http://host/2014/a.jpg");
        assert_eq!(image_url("http://host/", "/2014/a.jpg"), "http://host/2014/a.jpg");
    }

    fn settings(include: bool) -> ImageSettings {
        ImageSettings {
            include,
            purge: false,
            asset_host: "http://img".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_picks_lowest_image_id() {
        let source = MemorySource::new()
            .with_image(OwnerType::Author, 7, 30, "late.jpg")
            .with_image(OwnerType::Author, 7, 12, "early.jpg")
            .with_image(OwnerType::Book, 7, 1, "book.jpg");
        let destination = MemoryDestination::new();
        let registry = EntityRegistry::default();
        let images = settings(true);
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        let resolved = AssetUploader::new(&ctx)
            .resolve(OwnerType::Author, 7, WriteMode::Write)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.url, "http://img/early.jpg");
        assert!(resolved.asset.is_some());
        assert_eq!(destination.uploaded_urls(), vec!["http://img/early.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_preview_does_not_upload() {
        let source = MemorySource::new().with_image(OwnerType::Supplier, 1, 1, "logo.png");
        let destination = MemoryDestination::new();
        let registry = EntityRegistry::default();
        let images = settings(true);
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        let resolved = AssetUploader::new(&ctx)
            .resolve(OwnerType::Supplier, 1, WriteMode::Preview)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.asset, None);
        assert!(destination.uploaded_urls().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_or_missing_image_is_none() {
        let source = MemorySource::new().with_image(OwnerType::Book, 2, 1, "cover.jpg");
        let destination = MemoryDestination::new();
        let registry = EntityRegistry::default();
        let observer = RecordingObserver::new();

        let disabled = settings(false);
        let ctx = RunContext::new(&source, &destination, &registry, &disabled, 10, &observer);
        let uploader = AssetUploader::new(&ctx);
        assert!(uploader.resolve(OwnerType::Book, 2, WriteMode::Write).await.unwrap().is_none());

        let enabled = settings(true);
        let ctx = RunContext::new(&source, &destination, &registry, &enabled, 10, &observer);
        let uploader = AssetUploader::new(&ctx);
        assert!(uploader.resolve(OwnerType::Book, 3, WriteMode::Write).await.unwrap().is_none());
        assert!(destination.uploaded_urls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_propagates() {
        let source = MemorySource::new().with_image(OwnerType::Author, 1, 1, "a.jpg");
        let destination = MemoryDestination::new().failing_uploads();
        let registry = EntityRegistry::default();
        let images = settings(true);
        let observer = RecordingObserver::new();
        let ctx = RunContext::new(&source, &destination, &registry, &images, 10, &observer);

        let result = AssetUploader::new(&ctx)
            .resolve(OwnerType::Author, 1, WriteMode::Write)
            .await;
        assert!(result.is_err());
    }
}
