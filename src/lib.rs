//! Migrates a book catalog (collections, authors, books, suppliers and their
//! gallery images) from its PostgreSQL database into a hosted content API.
//!
//! Source ids are remapped to the ids the API assigns, so book links to
//! collections and authors survive the move. Runs can also wipe the
//! destination and seed a small fixture graph.

pub mod assets;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod logging;
pub mod model;
pub mod observer;
pub mod payload;
pub mod pipeline;
pub mod registry;
pub mod remap;
pub mod run_mode;
pub mod seeder;
pub mod source;
pub mod teardown;
pub mod testing;

pub use config::MigrateConfig;
pub use error::{MigrateError, Result};
pub use pipeline::{execute_run, MigrationPipeline, RunContext, RunOutcome};
pub use registry::{EntityKind, EntityRegistry};
pub use remap::RemapTable;
pub use run_mode::{RunFlags, RunMode};
