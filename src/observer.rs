//! Run progress reporting.
//!
//! The pipeline, teardown and seeder only emit [`ObserverEvent`]s; what gets
//! printed or logged is decided by the observer the caller plugs in.

use std::sync::Mutex;

use tracing::{debug, info};

use crate::destination::DestinationId;
use crate::model::SourceId;
use crate::payload::ItemPayload;
use crate::registry::EntityKind;
use crate::run_mode::{RunMode, Stage, WriteMode};

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    RunStarted {
        mode: RunMode,
        tokens: Vec<&'static str>,
    },
    StageStarted(Stage),
    TeardownBypassed(EntityKind),
    ItemDeleted {
        kind: EntityKind,
        id: DestinationId,
    },
    UploadDeleted {
        id: String,
    },
    PassStarted {
        kind: EntityKind,
        mode: WriteMode,
    },
    RecordMigrated {
        kind: EntityKind,
        source_id: SourceId,
        label: String,
        destination: DestinationId,
        image_url: Option<String>,
        /// Payload as built for the record, sent or only previewed
        payload: ItemPayload,
    },
    PassCompleted {
        kind: EntityKind,
        mapping: Vec<(SourceId, DestinationId)>,
    },
    FixtureCreated {
        kind: EntityKind,
        label: String,
        id: DestinationId,
    },
}

pub trait MigrationObserver: Send + Sync {
    fn notify(&self, event: &ObserverEvent);
}

impl<A, B> MigrationObserver for (A, B)
where
    A: MigrationObserver,
    B: MigrationObserver,
{
    fn notify(&self, event: &ObserverEvent) {
        self.0.notify(event);
        self.1.notify(event);
    }
}

fn format_mapping(mapping: &[(SourceId, DestinationId)]) -> String {
    let pairs: Vec<String> = mapping
        .iter()
        .map(|(source, destination)| format!("{} => {}", source, destination))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Structured tracing events
pub struct TracingObserver;

impl MigrationObserver for TracingObserver {
    fn notify(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::RunStarted { mode, tokens } => {
                info!(mode = %mode, tokens = ?tokens, "Performing run");
            }
            ObserverEvent::StageStarted(stage) => info!(stage = %stage, "Stage started"),
            ObserverEvent::TeardownBypassed(kind) => info!(kind = %kind, "Teardown bypassed"),
            ObserverEvent::ItemDeleted { kind, id } => debug!(kind = %kind, id = %id, "Removed item"),
            ObserverEvent::UploadDeleted { id } => debug!(id = %id, "Removed image"),
            ObserverEvent::PassStarted { kind, mode } => {
                info!(kind = %kind, mode = mode.as_str(), "Migration pass started")
            }
            ObserverEvent::RecordMigrated { kind, source_id, label, destination, image_url, .. } => {
                debug!(
                    kind = %kind,
                    source_id,
                    label = %label,
                    destination = %destination,
                    image = image_url.as_deref().unwrap_or(""),
                    "Record migrated"
                );
            }
            ObserverEvent::PassCompleted { kind, mapping } => {
                info!(kind = %kind, count = mapping.len(), mapping = %format_mapping(mapping), "Id conversion");
            }
            ObserverEvent::FixtureCreated { kind, label, id } => {
                info!(kind = %kind, label = %label, id = %id, "Fixture created")
            }
        }
    }
}

/// Collects events for inspection; used by tests and library callers
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Migrated record events only
    pub fn migrated(&self) -> Vec<(EntityKind, SourceId, DestinationId)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::RecordMigrated { kind, source_id, destination, .. } => {
                    Some((kind, source_id, destination))
                }
                _ => None,
            })
            .collect()
    }

    /// Payloads built for records of `kind`, in migration order
    pub fn payloads(&self, kind: EntityKind) -> Vec<(SourceId, ItemPayload)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::RecordMigrated { kind: migrated, source_id, payload, .. }
                    if migrated == kind =>
                {
                    Some((source_id, payload))
                }
                _ => None,
            })
            .collect()
    }
}

impl MigrationObserver for RecordingObserver {
    fn notify(&self, event: &ObserverEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sectioned, colored console output
#[cfg(feature = "cli")]
pub struct ConsoleObserver;

#[cfg(feature = "cli")]
impl MigrationObserver for ConsoleObserver {
    fn notify(&self, event: &ObserverEvent) {
        use crate::logging::output;
        use owo_colors::OwoColorize;

        match event {
            ObserverEvent::RunStarted { mode, tokens } => {
                output::header(format!("Performing {:?} ({})", tokens, mode));
            }
            ObserverEvent::StageStarted(stage) => output::header(stage.to_string().to_uppercase()),
            ObserverEvent::TeardownBypassed(kind) => output::info(format!("BYPASS {}", kind)),
            ObserverEvent::ItemDeleted { kind, id } => {
                output::step(format!("Removing {} {}", kind, id.dimmed()))
            }
            ObserverEvent::UploadDeleted { id } => output::step(format!("Removing image {}", id.dimmed())),
            ObserverEvent::PassStarted { kind, mode } => {
                output::subheader(format!("{} ({})", kind.as_str().to_uppercase(), mode.as_str()))
            }
            ObserverEvent::RecordMigrated { kind, source_id, label, destination, image_url, .. } => {
                println!(
                    "{:>12} {} #{} {} {}",
                    kind.as_str().green().bold(),
                    label,
                    source_id,
                    "->".dimmed(),
                    destination.cyan()
                );
                if let Some(url) = image_url {
                    println!("{:>12} {}", "image".dimmed(), url);
                }
            }
            ObserverEvent::PassCompleted { kind, mapping } => {
                output::subheader(format!("{} id conversion", kind));
                println!("{}", format_mapping(mapping));
            }
            ObserverEvent::FixtureCreated { kind, label, id } => {
                output::success(format!("Created {} fixture '{}' as {}", kind, label, id.cyan()))
            }
        }
    }
}
