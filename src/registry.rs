use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// The catalog entity types known to the migrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Collection,
    Author,
    Book,
    Supplier,
}

impl EntityKind {
    /// Creation order: every type a record references comes before it.
    /// Book points at collection and author, supplier points nowhere.
    pub const CREATION_ORDER: [EntityKind; 4] = [
        EntityKind::Collection,
        EntityKind::Author,
        EntityKind::Book,
        EntityKind::Supplier,
    ];

    /// Deletion order. Not the reverse of creation order: authors go first so
    /// the remote side drops the book/author links before books are removed.
    pub const TEARDOWN_ORDER: [EntityKind; 4] = [
        EntityKind::Author,
        EntityKind::Book,
        EntityKind::Collection,
        EntityKind::Supplier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Collection => "collection",
            EntityKind::Author => "author",
            EntityKind::Book => "book",
            EntityKind::Supplier => "supplier",
        }
    }

    /// Environment variable carrying this type's destination schema id
    pub fn env_var(self) -> &'static str {
        match self {
            EntityKind::Collection => "COLLECTION",
            EntityKind::Author => "AUTHOR",
            EntityKind::Book => "BOOK",
            EntityKind::Supplier => "SUPPLIER",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry row: an entity type, whether it takes part in the run, and
/// which remote model its items belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    pub kind: EntityKind,
    pub schema_id: Option<String>,
    pub active: bool,
}

impl EntityType {
    pub fn new(kind: EntityKind, schema_id: impl Into<String>, active: bool) -> Self {
        Self {
            kind,
            schema_id: Some(schema_id.into()),
            active,
        }
    }

    pub fn inactive(kind: EntityKind) -> Self {
        Self {
            kind,
            schema_id: None,
            active: false,
        }
    }
}

/// Fixed table of entity types. Kinds that were never registered are
/// treated as inactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRegistry {
    entries: BTreeMap<EntityKind, EntityType>,
}

impl EntityRegistry {
    pub fn new(entries: impl IntoIterator<Item = EntityType>) -> Self {
        let mut map: BTreeMap<EntityKind, EntityType> = EntityKind::CREATION_ORDER
            .iter()
            .map(|kind| (*kind, EntityType::inactive(*kind)))
            .collect();

        for entry in entries {
            map.insert(entry.kind, entry);
        }

        Self { entries: map }
    }

    pub fn get(&self, kind: EntityKind) -> &EntityType {
        // Every kind is seeded in `new`
        &self.entries[&kind]
    }

    pub fn is_active(&self, kind: EntityKind) -> bool {
        self.get(kind).active
    }

    /// Destination schema id for `kind`; an error if none was configured
    pub fn schema_id(&self, kind: EntityKind) -> Result<&str> {
        self.get(kind)
            .schema_id
            .as_deref()
            .ok_or(MigrateError::MissingSchemaId(kind))
    }

    /// Entity types in creation order
    pub fn creation_order(&self) -> impl Iterator<Item = &EntityType> {
        EntityKind::CREATION_ORDER.iter().map(|kind| self.get(*kind))
    }

    /// Entity types in teardown order
    pub fn teardown_order(&self) -> impl Iterator<Item = &EntityType> {
        EntityKind::TEARDOWN_ORDER.iter().map(|kind| self.get(*kind))
    }

    pub fn active_kinds(&self) -> Vec<EntityKind> {
        self.creation_order()
            .filter(|entry| entry.active)
            .map(|entry| entry.kind)
            .collect()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}
