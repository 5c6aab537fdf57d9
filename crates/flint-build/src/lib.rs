//! Build parameter compiler for the flint build-configuration compiler.
//!
//! Assembles one toolchain-agnostic build request from project state,
//! decides full vs. incremental builds by content-hash comparison, and
//! generates the ARM linker scatter description. The resulting
//! [`params::BuilderParams`] artifact is the sole hand-off to the
//! external builder process.

pub mod compile;
pub mod error;
pub mod params;
pub mod scatter;
