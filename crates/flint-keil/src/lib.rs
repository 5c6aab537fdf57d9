//! Legacy Keil project translation.
//!
//! Parses and re-serializes the legacy XML project formats into and from
//! the abstract project model, for two families: C51 (`.uvproj`,
//! 8-bit targets) and ARM (`.uvprojx`, 32-bit targets). The raw XML
//! source is kept alongside the parsed model; mutations splice the
//! source by byte range, so structure this system never inspects
//! survives a round-trip untouched.

pub mod arm;
pub mod c51;
pub mod document;
pub mod error;
pub mod mapping;
pub mod model;
pub mod strings;
