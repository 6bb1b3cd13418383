//! Collaborator implementations
//! - maven.rs: remote version lookup against a Maven repository
//! - directory.rs: distribution documents from a local directory

pub mod directory;
pub mod maven;

pub use directory::DirectoryFetcher;
pub use maven::MavenRegistry;
