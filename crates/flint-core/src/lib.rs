//! Shared data model for the flint build-configuration compiler.
//!
//! Everything the toolchain registry, the build parameter compiler, and the
//! legacy project translator agree on lives here:
//! - **Option model:** versioned, nested compile-option sets
//! - **Project model:** toolchain-agnostic project description
//! - **Memory model:** fixed-slot RAM/ROM tables with canonical hex literals
//! - **Hashing:** content hashes over semantically relevant option subsets

pub mod error;
pub mod hash;
pub mod memory;
pub mod options;
pub mod project;
