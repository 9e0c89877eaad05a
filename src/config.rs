use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::destination::http::{CmsSettings, DEFAULT_BASE_URL};
use crate::error::{MigrateError, Result};
use crate::registry::{EntityKind, EntityRegistry, EntityType};
use crate::run_mode::RunMode;

pub const CONFIG_FILE_NAME: &str = "catalog-migrate.toml";
pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const DEFAULT_ASSET_HOST: &str = "http://multimage.s3.amazonaws.com";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Log verbosity: 0 = warn, 1 = info, 2 = debug, 3+ = trace
    pub verbosity: Option<u8>,

    pub source: SourceSection,

    pub destination: DestinationSection,

    pub entities: EntitiesSection,

    pub images: ImageSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// PostgreSQL connection string of the catalog database
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationSection {
    /// Full-access API token
    pub api_token: Option<String>,

    /// API base url (defaults to the hosted API)
    pub base_url: Option<String>,

    /// Page size for list calls during teardown
    pub page_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitiesSection {
    pub collection: EntitySection,
    pub author: EntitySection,
    pub book: EntitySection,
    pub supplier: EntitySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySection {
    /// Remote model id items of this type are created under
    pub schema_id: Option<String>,

    /// Whether this type is migrated, torn down and seeded
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Upload the first gallery image of each record
    pub include: bool,

    /// Delete every remote image asset during teardown
    pub purge: bool,

    /// Host the gallery image uids are served from
    pub asset_host: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            include: false,
            purge: false,
            asset_host: DEFAULT_ASSET_HOST.to_string(),
        }
    }
}

impl EntitiesSection {
    fn section(&self, kind: EntityKind) -> &EntitySection {
        match kind {
            EntityKind::Collection => &self.collection,
            EntityKind::Author => &self.author,
            EntityKind::Book => &self.book,
            EntityKind::Supplier => &self.supplier,
        }
    }

    fn section_mut(&mut self, kind: EntityKind) -> &mut EntitySection {
        match kind {
            EntityKind::Collection => &mut self.collection,
            EntityKind::Author => &mut self.author,
            EntityKind::Book => &mut self.book,
            EntityKind::Supplier => &mut self.supplier,
        }
    }
}

impl MigrateConfig {
    /// Load configuration from catalog-migrate.toml in the current directory
    pub fn load_from_file() -> Result<Option<Self>> {
        Self::load_from_path(&PathBuf::from(CONFIG_FILE_NAME))
    }

    pub fn load_from_path(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|e| MigrateError::ConfigLoad {
            path: config_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: MigrateConfig = toml::from_str(&content).map_err(|e| MigrateError::ConfigLoad {
            path: config_path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Some(config))
    }

    /// Merge environment values over config file values.
    /// Environment values take precedence.
    pub fn merge_with_env<F>(config_file: Option<Self>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = config_file.unwrap_or_default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.source.connection_string = Some(url);
        }
        if let Some(token) = lookup("DATO_TOKEN") {
            config.destination.api_token = Some(token);
        }
        if let Some(base_url) = lookup("CATALOG_API_URL") {
            config.destination.base_url = Some(base_url);
        }
        if let Some(limit) = lookup("DATO_PAGE_LIMIT") {
            let parsed = limit.trim().parse::<usize>().map_err(|_| {
                MigrateError::Configuration(format!("DATO_PAGE_LIMIT is not a number: '{}'", limit))
            })?;
            config.destination.page_limit = Some(parsed);
        }
        for kind in EntityKind::CREATION_ORDER {
            if let Some(schema_id) = lookup(kind.env_var()) {
                config.entities.section_mut(kind).schema_id = Some(schema_id);
            }
        }

        Ok(config)
    }

    /// Config file merged with the process environment
    pub fn from_environment() -> Result<Self> {
        let config_file = Self::load_from_file()?;
        Self::merge_with_env(config_file, |key| std::env::var(key).ok())
    }

    pub fn registry(&self) -> EntityRegistry {
        EntityRegistry::new(EntityKind::CREATION_ORDER.iter().map(|kind| {
            let section = self.entities.section(*kind);
            EntityType {
                kind: *kind,
                schema_id: section.schema_id.clone(),
                active: section.active,
            }
        }))
    }

    pub fn page_limit(&self) -> usize {
        self.destination.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn cms_settings(&self) -> Result<CmsSettings> {
        let api_token = self.destination.api_token.clone().ok_or_else(|| {
            MigrateError::Configuration(
                "No API token provided. Set DATO_TOKEN or [destination] api_token".to_string(),
            )
        })?;

        Ok(CmsSettings {
            base_url: self
                .destination
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_token,
        })
    }

    /// Check that everything `mode` will touch is configured
    pub fn validate(&self, mode: RunMode) -> Result<()> {
        if self.page_limit() == 0 {
            return Err(MigrateError::Configuration(
                "page_limit must be greater than zero".to_string(),
            ));
        }

        self.cms_settings()?;

        let registry = self.registry();
        for kind in registry.active_kinds() {
            registry.schema_id(kind)?;
        }

        if mode.reads_source() && self.source.connection_string.is_none() {
            return Err(MigrateError::Configuration(
                "No source connection string provided. Set DATABASE_URL or [source] connection_string"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
