//! Serde-loadable rights configuration.
//!
//! Deployments that need a different menu/page layout ship a JSON document
//! with their own hierarchy and catalog instead of recompiling.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PermissionCatalog, RightsHierarchy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("rights config file not found")]
    NotFound,
    #[error("failed to read rights config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse rights config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid rights config: {0}")]
    Invalid(String),
}

/// One catalog row: stable codename plus display label.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub codename: String,
    pub label: String,
}

/// On-disk form of the hierarchy table and catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RightsConfig {
    /// Parent permission → children that imply it.
    pub hierarchy: BTreeMap<String, Vec<String>>,
    pub catalog: Vec<CatalogEntry>,
}

impl RightsConfig {
    /// The standard table and catalog in config form.
    pub fn standard() -> Self {
        let hierarchy = RightsHierarchy::standard()
            .edges()
            .map(|(parent, kids)| {
                (
                    parent.to_string(),
                    kids.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();
        let catalog = PermissionCatalog::standard()
            .iter()
            .map(|(name, label)| CatalogEntry {
                codename: name.to_string(),
                label: label.to_string(),
            })
            .collect();
        Self { hierarchy, catalog }
    }

    /// Load config from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound
            } else {
                ConfigError::Read(e)
            }
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save config to a JSON file, creating parent directories as needed.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self)?)?;
        Ok(())
    }

    /// Validate and convert into the engine's hierarchy and catalog.
    pub fn into_parts(self) -> Result<(RightsHierarchy, PermissionCatalog), ConfigError> {
        for (parent, kids) in &self.hierarchy {
            if kids.iter().any(|c| c == parent) {
                return Err(ConfigError::Invalid(format!(
                    "permission {parent} lists itself as a child"
                )));
            }
            let mut seen = std::collections::BTreeSet::new();
            for child in kids {
                if !seen.insert(child) {
                    return Err(ConfigError::Invalid(format!(
                        "duplicate child {child} under {parent}"
                    )));
                }
            }
        }

        let hierarchy = RightsHierarchy::from_edges(self.hierarchy);
        let mut catalog = PermissionCatalog::new();
        for entry in self.catalog {
            catalog.insert(entry.codename, entry.label);
        }
        Ok((hierarchy, catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use wicket_storage::PermissionName;

    #[test]
    fn standard_config_converts_back() {
        let (hierarchy, catalog) = RightsConfig::standard().into_parts().unwrap();
        assert_eq!(hierarchy.len(), RightsHierarchy::standard().len());
        assert_eq!(catalog, PermissionCatalog::standard());
    }

    #[test]
    fn converted_hierarchy_still_closes() {
        let (hierarchy, _) = RightsConfig::standard().into_parts().unwrap();
        let closed = hierarchy
            .reconcile(&BTreeSet::from([PermissionName::from("can_view_users")]))
            .unwrap();
        assert!(closed.contains(&PermissionName::from("can_access_user")));
    }

    #[test]
    fn self_edge_is_rejected() {
        let config = RightsConfig {
            hierarchy: BTreeMap::from([("A".to_string(), vec!["A".to_string()])]),
            catalog: vec![],
        };
        assert!(matches!(
            config.into_parts(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn duplicate_child_is_rejected() {
        let config = RightsConfig {
            hierarchy: BTreeMap::from([(
                "A".to_string(),
                vec!["B".to_string(), "B".to_string()],
            )]),
            catalog: vec![],
        };
        assert!(matches!(
            config.into_parts(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rights.json");
        let config = RightsConfig::standard();
        config.save_to(&path).unwrap();
        let loaded = RightsConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = RightsConfig::load_from("/nonexistent/rights.json").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound));
    }
}
