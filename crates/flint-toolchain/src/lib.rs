//! Toolchain registry and option model for the flint build-configuration
//! compiler.
//!
//! A fixed set of embedded toolchains is described by [`descriptor::ToolchainId`];
//! each identity supplies default option sets, property schemas, system
//! include/macro discovery, and a pre-handle transform applied to a build
//! request's options before emission. The set is closed: dispatch happens
//! by match over the identity, not by open subclassing.

pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod migrate;
pub mod prehandle;
pub mod probe;
pub mod registry;
pub mod schema;
