//! Distribution layer
//!
//! # Modules
//!
//! - [`document`]: Distribution documents, parent declarations and the inheritance merge
//! - [`resolver`]: Parent chain resolution through a fetch collaborator
//! - [`legacy`]: Built-in documents for legacy reference application releases

pub mod document;
pub mod legacy;
pub mod resolver;

pub use document::DistributionDoc;
pub use resolver::{
    Distribution, DistributionFetcher, DistributionResolver, FetchError, ResolveError,
    normalize_distribution_ref, parse_distribution_ref,
};
