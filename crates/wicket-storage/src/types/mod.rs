//! Type definitions for wicket storage.

mod flags;
mod groups;
mod ids;
mod principals;

// Re-export all types from submodules
pub use flags::*;
pub use groups::*;
pub use ids::*;
pub use principals::*;
