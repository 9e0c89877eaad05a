#![allow(dead_code)]

pub mod fixtures;

use catalog_migrate::config::ImageSettings;
use catalog_migrate::observer::{ObserverEvent, RecordingObserver};
use catalog_migrate::testing::{MemoryDestination, MemorySource};
use catalog_migrate::{execute_run, EntityRegistry, Result, RunContext, RunFlags, RunOutcome};

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// In-memory source and destination wired to a recording observer
pub struct TestEnvironment {
    pub source: MemorySource,
    pub destination: MemoryDestination,
    pub registry: EntityRegistry,
    pub images: ImageSettings,
    pub page_limit: usize,
    pub observer: RecordingObserver,
}

impl TestEnvironment {
    pub fn new(source: MemorySource, registry: EntityRegistry) -> Self {
        init_test_tracing();
        Self {
            source,
            destination: MemoryDestination::new(),
            registry,
            images: ImageSettings::default(),
            page_limit: 3,
            observer: RecordingObserver::new(),
        }
    }

    pub fn with_destination(mut self, destination: MemoryDestination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_images(mut self, images: ImageSettings) -> Self {
        self.images = images;
        self
    }

    pub fn ctx(&self) -> RunContext<'_> {
        RunContext::new(
            &self.source,
            &self.destination,
            &self.registry,
            &self.images,
            self.page_limit,
            &self.observer,
        )
    }

    pub async fn run(&self, tokens: &[&str]) -> Result<RunOutcome> {
        execute_run(&self.ctx(), RunFlags::from_tokens(tokens)).await
    }

    /// Number of observer events matching `predicate`
    pub fn count_events(&self, predicate: impl Fn(&ObserverEvent) -> bool) -> usize {
        self.observer.events().iter().filter(|event| predicate(*event)).count()
    }
}
