//! Core library for xigt corpora.
//! Owns the document model, the namespace-aware JSON codec, read-side
//! queries and the sample importers.

pub mod codec;
pub mod import;
pub mod logging;
pub mod model;
pub mod query;

pub use codec::{
    decode, dump, dump_path, dumps, encode, encode_node, load, load_path, loads, CodecError,
    CodecResult, MAX_NESTING_DEPTH,
};
pub use import::pangloss::{import_path, import_str, xigt_import, ImportOptions, ImportReport};
pub use import::{ImportError, ImportResult};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use model::attributes::{AttrKey, Attributes};
pub use model::namespace::{
    delta, invert, merge, render_key, resolve_key, InverseNamespaceMap, NamespaceMap,
};
pub use model::node::{
    Corpus, DocumentRef, Igt, Item, LoadMode, Meta, MetaChild, Metadata, NodeFields, Tier,
    XigtNode,
};
pub use query::{resolve_expression, AlignmentExpr, QueryError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
