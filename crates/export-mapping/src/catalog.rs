//! Named mapping bundles
//!
//! A bundle names a relation together with its full column list, so that an
//! export can be configured with `mapping: <name>` alone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ColumnEntry;
use crate::{Error, Result};

/// A reusable relation + columns definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MappingBundle {
    /// Name the bundle is referenced by
    pub name: String,

    /// Relation the bundle exports
    #[serde(alias = "klass")]
    pub relation: String,

    /// Columns in output order
    pub columns: Vec<ColumnEntry>,
}

/// Catalog file layout
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    mappings: Vec<MappingBundle>,
}

/// Registry of mapping bundles by name
#[derive(Debug, Clone, Default)]
pub struct MappingCatalog {
    bundles: HashMap<String, MappingBundle>,
}

impl MappingCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle under its own name
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a bundle of that name already exists.
    pub fn register(&mut self, bundle: MappingBundle) -> Result<()> {
        if self.bundles.contains_key(&bundle.name) {
            return Err(Error::configuration(format!(
                "Mapping '{}' is defined more than once",
                bundle.name
            )));
        }
        debug!(mapping = %bundle.name, relation = %bundle.relation, "Registered mapping");
        self.bundles.insert(bundle.name.clone(), bundle);
        Ok(())
    }

    /// Get a bundle by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MappingBundle> {
        self.bundles.get(name)
    }

    /// Check if a bundle exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Bundle names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse a catalog from YAML (`mappings: [...]`)
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed YAML or duplicate names.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::configuration(format!("Failed to parse mapping catalog: {e}")))?;

        let mut catalog = Self::new();
        for bundle in file.mappings {
            catalog.register(bundle)?;
        }
        Ok(catalog)
    }

    /// Load a catalog from a YAML file
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let catalog = Self::from_yaml(&content)?;
        info!(path = %path.display(), mappings = catalog.bundles.len(), "Loaded mapping catalog");
        Ok(catalog)
    }
}
