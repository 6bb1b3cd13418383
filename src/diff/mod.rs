//! Upgrade differential
//!
//! # Modules
//!
//! - [`artifact_changes`]: Added/removed/upgraded/downgraded artifacts of one category
//! - [`property_changes`]: Added/removed/changed frontend build properties
//! - [`differential`]: The full differential, including the singular platform

pub mod artifact_changes;
pub mod differential;
pub mod property_changes;

pub use artifact_changes::ArtifactChanges;
pub use differential::{PlatformChange, UpgradeDifferential};
pub use property_changes::PropertyChanges;
