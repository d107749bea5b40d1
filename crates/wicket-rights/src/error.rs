//! Error type for rights operations.

use thiserror::Error;
use wicket_storage::{PrincipalId, StoreError};

/// Uniform error type for the rights engine.
#[derive(Debug, Error)]
pub enum RightsError {
    #[error("principal {0} not found")]
    PrincipalNotFound(PrincipalId),

    /// The ancestor walk did not reach a fixed point within the safety cap.
    /// Only a malformed hierarchy table can trigger this.
    #[error("hierarchy closure did not settle after {passes} passes")]
    HierarchyDepthExceeded { passes: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}
