//! CLI command implementations.

pub mod build;
pub mod doctor;
pub mod export;
pub mod import;
pub mod migrate;
pub mod scatter;
