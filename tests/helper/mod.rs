#![allow(dead_code)]

mod distribution;
mod registry;

pub use distribution::*;
pub use registry::*;
