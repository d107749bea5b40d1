//! Permission hierarchy engine for wicket.
//!
//! Permissions form a forest: top-level menu access at the roots, page access
//! below, view/create/update/delete operations at the leaves. Granting any
//! permission implies every ancestor must be granted too. This crate owns the
//! hierarchy table, computes the ancestor closure of a requested grant set,
//! applies the closed set to a principal through a [`wicket_storage::Store`],
//! and reads back effective permissions (direct grants plus group grants).
//!
//! The closure runs at write time only; reads report exactly what is stored.

mod catalog;
mod config;
mod engine;
mod error;
mod hierarchy;

pub use catalog::PermissionCatalog;
pub use config::{CatalogEntry, ConfigError, RightsConfig};
pub use engine::{PrincipalRights, RightsEngine};
pub use error::RightsError;
pub use hierarchy::RightsHierarchy;
