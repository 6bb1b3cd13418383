pub mod advisor;
pub mod config;
pub mod diff;
pub mod distro;
pub mod logging;
pub mod model;
pub mod parser;
pub mod registries;
pub mod registry;
pub mod server;
