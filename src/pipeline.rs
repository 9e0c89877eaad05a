//! Migration pipeline and the run driver.
//!
//! A run is a fixed sequence of [`Stage`]s picked by its [`RunMode`]. The
//! migration stage walks the active entity types in creation order; each
//! type's pass receives the remap table built so far and hands back the
//! table extended with its own entries, so every referenced type is complete
//! before a referencing type is processed.

use tracing::{debug, instrument};

use crate::assets::{AssetUploader, ResolvedAsset};
use crate::config::ImageSettings;
use crate::destination::{AssetRef, Destination, DestinationId};
use crate::error::Result;
use crate::model::{OwnerType, SourceId};
use crate::observer::{MigrationObserver, ObserverEvent};
use crate::payload::{AuthorPayload, BookPayload, CollectionPayload, ItemPayload, SupplierPayload};
use crate::registry::{EntityKind, EntityRegistry};
use crate::remap::RemapTable;
use crate::run_mode::{RunFlags, RunMode, Stage, WriteMode};
use crate::seeder::{SeedReport, TestSeeder};
use crate::source::SourceStore;
use crate::teardown::{Teardown, TeardownReport};

#[cfg(feature = "cli")]
use owo_colors::OwoColorize;

/// Collaborators and settings shared by every stage of a run
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub source: &'a dyn SourceStore,
    pub destination: &'a dyn Destination,
    pub registry: &'a EntityRegistry,
    pub images: &'a ImageSettings,
    pub page_limit: usize,
    pub observer: &'a dyn MigrationObserver,
}

impl<'a> RunContext<'a> {
    /// A `page_limit` of zero is raised to one
    pub fn new(
        source: &'a dyn SourceStore,
        destination: &'a dyn Destination,
        registry: &'a EntityRegistry,
        images: &'a ImageSettings,
        page_limit: usize,
        observer: &'a dyn MigrationObserver,
    ) -> Self {
        Self {
            source,
            destination,
            registry,
            images,
            page_limit: page_limit.max(1),
            observer,
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub mode: RunMode,
    /// Remap table of the migration stage; `None` when no migration ran
    pub remap: Option<RemapTable>,
    pub teardowns: Vec<TeardownReport>,
    pub seed: Option<SeedReport>,
}

/// Run every stage `flags` selects, stopping at the first error
#[instrument(skip(ctx))]
pub async fn execute_run(ctx: &RunContext<'_>, flags: RunFlags) -> Result<RunOutcome> {
    let mode = RunMode::from(flags);

    ctx.observer.notify(&ObserverEvent::RunStarted {
        mode,
        tokens: flags.tokens(),
    });

    let mut outcome = RunOutcome {
        mode,
        remap: None,
        teardowns: Vec::new(),
        seed: None,
    };

    for stage in mode.stages() {
        ctx.observer.notify(&ObserverEvent::StageStarted(*stage));
        match stage {
            Stage::Teardown => outcome.teardowns.push(Teardown::new(ctx).run().await?),
            Stage::Migrate(write_mode) => {
                outcome.remap = Some(MigrationPipeline::new(ctx).migrate(*write_mode).await?)
            }
            Stage::Seed => outcome.seed = Some(TestSeeder::new(ctx).seed().await?),
        }
    }

    Ok(outcome)
}

pub struct MigrationPipeline<'c, 'a> {
    ctx: &'c RunContext<'a>,
    assets: AssetUploader<'a>,
}

impl<'c, 'a> MigrationPipeline<'c, 'a> {
    pub fn new(ctx: &'c RunContext<'a>) -> Self {
        Self {
            ctx,
            assets: AssetUploader::new(ctx),
        }
    }

    /// Migrate every active entity type in creation order
    pub async fn migrate(&self, mode: WriteMode) -> Result<RemapTable> {
        let mut remap = RemapTable::new();

        for entity in self.ctx.registry.creation_order() {
            if !entity.active {
                debug!(kind = %entity.kind, "Entity type inactive, skipping pass");
                continue;
            }
            remap = self.run_pass(entity.kind, mode, remap).await?;
        }

        Ok(remap)
    }

    /// Migrate every source record of `kind`, returning `remap` extended with
    /// the new entries
    pub async fn run_pass(
        &self,
        kind: EntityKind,
        mode: WriteMode,
        mut remap: RemapTable,
    ) -> Result<RemapTable> {
        self.ctx.observer.notify(&ObserverEvent::PassStarted { kind, mode });

        match kind {
            EntityKind::Collection => {
                for collection in self.ctx.source.collections().await? {
                    let label = collection
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("collection {}", collection.id));
                    let payload = ItemPayload::Collection(CollectionPayload::from_record(&collection));
                    self.commit(&mut remap, mode, collection.id, label, payload, None)
                        .await?;
                }
            }
            EntityKind::Author => {
                for author in self.ctx.source.authors().await? {
                    let image = self.assets.resolve(OwnerType::Author, author.id, mode).await?;
                    let (image_url, avatar) = split_image(image);
                    let payload = ItemPayload::Author(AuthorPayload::from_record(&author, avatar));
                    self.commit(&mut remap, mode, author.id, author.full_name(), payload, image_url)
                        .await?;
                }
            }
            EntityKind::Book => {
                for book in self.ctx.source.books().await? {
                    let image = self.assets.resolve(OwnerType::Book, book.id, mode).await?;
                    let (image_url, cover) = split_image(image);
                    let label = book.title.clone().unwrap_or_else(|| format!("book {}", book.id));
                    let payload = ItemPayload::Book(BookPayload::from_record(&book, &remap, cover));
                    self.commit(&mut remap, mode, book.id, label, payload, image_url)
                        .await?;
                }
            }
            EntityKind::Supplier => {
                for supplier in self.ctx.source.suppliers().await? {
                    let image = self.assets.resolve(OwnerType::Supplier, supplier.id, mode).await?;
                    let (image_url, logo) = split_image(image);
                    let label = supplier
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("supplier {}", supplier.id));
                    let payload = ItemPayload::Supplier(SupplierPayload::from_record(&supplier, logo));
                    self.commit(&mut remap, mode, supplier.id, label, payload, image_url)
                        .await?;
                }
            }
        }

        let mapping = remap
            .mapping(kind)
            .map(|table| table.iter().map(|(source, dest)| (*source, dest.clone())).collect())
            .unwrap_or_default();
        self.ctx.observer.notify(&ObserverEvent::PassCompleted { kind, mapping });

        Ok(remap)
    }

    async fn commit(
        &self,
        remap: &mut RemapTable,
        mode: WriteMode,
        source_id: SourceId,
        label: String,
        payload: ItemPayload,
        image_url: Option<String>,
    ) -> Result<()> {
        let kind = payload.kind();

        let destination = match mode {
            WriteMode::Preview => {
                debug!(kind = %kind, source_id, payload = ?payload, "Preview record");
                DestinationId::from_source(source_id)
            }
            WriteMode::Write => {
                let schema_id = self.ctx.registry.schema_id(kind)?;
                self.ctx.destination.create_item(schema_id, &payload).await?
            }
        };

        remap.record(kind, source_id, destination.clone())?;
        self.ctx.observer.notify(&ObserverEvent::RecordMigrated {
            kind,
            source_id,
            label,
            destination,
            image_url,
            payload,
        });

        Ok(())
    }
}

fn split_image(image: Option<ResolvedAsset>) -> (Option<String>, Option<AssetRef>) {
    match image {
        Some(resolved) => (Some(resolved.url), resolved.asset),
        None => (None, None),
    }
}

#[cfg(feature = "cli")]
pub fn print_run_summary(outcome: &RunOutcome, elapsed: std::time::Duration) {
    println!("\n{}", "=== Catalog Migration Summary ===".bold().blue());
    println!("{} {}", "Mode:".bold(), outcome.mode.as_str().cyan());

    for (round, report) in outcome.teardowns.iter().enumerate() {
        println!("\n{} {}:", "Teardown".bold().red(), round + 1);
        for (kind, count) in &report.items_deleted {
            println!("  {} {} {}", "-".red().bold(), count, kind.as_str().cyan());
        }
        for kind in &report.bypassed {
            println!("  {} {} (inactive)", "·".dimmed(), kind.as_str().dimmed());
        }
        if report.uploads_deleted > 0 {
            println!("  {} {} images", "-".red().bold(), report.uploads_deleted);
        }
    }

    if let Some(remap) = &outcome.remap {
        println!("\n{}:", "Migrated".bold().green());
        if remap.is_empty() {
            println!("  {}", "No records migrated".dimmed());
        }
        for kind in remap.kinds() {
            println!("  {} {} {}", "+".green().bold(), remap.len(kind), kind.as_str().cyan());
        }
    }

    if let Some(seed) = &outcome.seed {
        println!("\n{}:", "Fixtures".bold().yellow());
        for kind in seed.remap.kinds() {
            println!("  {} {} {}", "+".yellow().bold(), seed.remap.len(kind), kind.as_str().cyan());
        }
    }

    println!(
        "\n{} in {}",
        "Finished".green().bold(),
        crate::logging::format_duration(elapsed)
    );
    tracing::info!(mode = outcome.mode.as_str(), "Run finished");
}
