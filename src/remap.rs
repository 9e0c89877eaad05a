use std::collections::BTreeMap;

use crate::destination::DestinationId;
use crate::error::{MigrateError, Result};
use crate::model::SourceId;
use crate::registry::EntityKind;

/// Per entity type map from source id to destination id.
///
/// Entries are written once, during the pass for their type, and never
/// changed afterwards. A type that was never migrated has no entries, so
/// every lookup against it misses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemapTable {
    tables: BTreeMap<EntityKind, BTreeMap<SourceId, DestinationId>>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the destination id for `(kind, source_id)`.
    pub fn record(
        &mut self,
        kind: EntityKind,
        source_id: SourceId,
        destination: DestinationId,
    ) -> Result<()> {
        let table = self.tables.entry(kind).or_default();
        if table.contains_key(&source_id) {
            return Err(MigrateError::DuplicateMapping { kind, source_id });
        }
        table.insert(source_id, destination);
        Ok(())
    }

    pub fn resolve(&self, kind: EntityKind, source_id: SourceId) -> Option<&DestinationId> {
        self.tables.get(&kind).and_then(|table| table.get(&source_id))
    }

    /// Resolve a reference list, dropping ids without a mapping. Order of the
    /// surviving ids is preserved.
    pub fn resolve_all(&self, kind: EntityKind, source_ids: &[SourceId]) -> Vec<DestinationId> {
        source_ids
            .iter()
            .filter_map(|id| self.resolve(kind, *id))
            .cloned()
            .collect()
    }

    pub fn mapping(&self, kind: EntityKind) -> Option<&BTreeMap<SourceId, DestinationId>> {
        self.tables.get(&kind)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.mapping(kind).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }

    /// Entity types holding at least one entry
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.tables
            .iter()
            .filter(|(_, table)| !table.is_empty())
            .map(|(kind, _)| *kind)
            .collect()
    }
}
