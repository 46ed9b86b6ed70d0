//! Document tree model for interlinear glossed text.
//!
//! # Responsibility
//! - Define the node types, attribute keys and namespace maps shared by the
//!   codec, the query helpers and importers.
//!
//! # Invariants
//! - The tree has a fixed shape; only `MetaChild` nests recursively.
//! - Child ordering is significant everywhere.

pub mod attributes;
pub mod namespace;
pub mod node;
