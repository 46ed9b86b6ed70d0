//! JSON codec for xigt corpora.
//!
//! # Responsibility
//! - Encode document trees to JSON values, declaring each namespace binding
//!   only where it first becomes active.
//! - Decode JSON values back into document trees.
//! - Provide `load`/`loads`/`dump`/`dumps` over readers, writers and strings.
//!
//! # Invariants
//! - Encoding never mutates the input tree.
//! - Only a `Corpus` is accepted at the top level of the encode entry points.
//! - Decode failures never yield a partial tree.
//! - `MetaChild` nesting is bounded by `MAX_NESTING_DEPTH` in both directions.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod decode;
pub mod encode;
pub mod stream;

pub use decode::decode;
pub use encode::{encode, encode_node};
pub use stream::{dump, dump_path, dumps, load, load_path, loads};

/// Deepest `MetaChild` nesting accepted by the codec.
pub const MAX_NESTING_DEPTH: usize = 64;

pub(crate) const FIELD_ID: &str = "id";
pub(crate) const FIELD_TYPE: &str = "type";
pub(crate) const FIELD_ATTRIBUTES: &str = "attributes";
pub(crate) const FIELD_NAMESPACE: &str = "namespace";
pub(crate) const FIELD_NAMESPACES: &str = "namespaces";
pub(crate) const FIELD_METADATA: &str = "metadata";
pub(crate) const FIELD_IGTS: &str = "igts";
pub(crate) const FIELD_TIERS: &str = "tiers";
pub(crate) const FIELD_ITEMS: &str = "items";
pub(crate) const FIELD_METAS: &str = "metas";
pub(crate) const FIELD_CHILDREN: &str = "children";
pub(crate) const FIELD_TEXT: &str = "text";
pub(crate) const FIELD_NAME: &str = "name";

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from encoding, decoding and stream I/O.
#[derive(Debug)]
pub enum CodecError {
    /// Wrong node type passed to a top-level entry point.
    InvalidArgument(String),
    /// Input is structurally invalid at `path`.
    Malformed { path: String, reason: String },
    /// `MetaChild` nesting exceeded `limit` at `path`.
    DepthLimit { path: String, limit: usize },
    /// Attribute key at `path` has no serialized form that reads back as
    /// the same key.
    UnencodableKey { path: String, key: String },
    /// JSON syntax or serialization failure.
    Json(serde_json::Error),
    /// Reader/writer failure.
    Io(std::io::Error),
}

impl CodecError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Malformed { path, reason } => write!(f, "malformed document at {path}: {reason}"),
            Self::DepthLimit { path, limit } => {
                write!(f, "nesting deeper than {limit} levels at {path}")
            }
            Self::UnencodableKey { path, key } => {
                write!(f, "attribute key `{key}` at {path} cannot be written unambiguously")
            }
            Self::Json(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub(crate) fn child_path(parent: &str, field: &str, index: usize) -> String {
    format!("{parent}.{field}[{index}]")
}

pub(crate) fn check_depth(path: &str, depth: usize) -> CodecResult<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(CodecError::DepthLimit {
            path: path.to_string(),
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}
