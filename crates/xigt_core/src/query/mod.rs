//! Read-side helpers over a decoded or built igt.
//!
//! # Responsibility
//! - Parse alignment/segmentation/content expressions.
//! - Resolve expressions to the text they select inside one igt.
//!
//! # Invariants
//! - Resolution never mutates the tree.
//! - Reference chains longer than `MAX_REFERENCE_DEPTH` are reported as
//!   cycles instead of recursing without bound.

use crate::model::node::{Igt, Item, XigtNode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod alignment;

pub use alignment::{AlignmentExpr, Joiner, Segment, Span};

/// Longest chain of item -> expression -> item references followed.
pub const MAX_REFERENCE_DEPTH: usize = 16;

/// Errors from expression parsing and resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    MalformedExpression { expr: String, reason: String },
    UnknownId(String),
    SpanOutOfRange { id: String, span: Span, len: usize },
    /// Item has no text and no `content`/`segmentation` reference.
    MissingText(String),
    CycleDetected(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedExpression { expr, reason } => {
                write!(f, "malformed alignment expression `{expr}`: {reason}")
            }
            Self::UnknownId(id) => write!(f, "no item with id `{id}`"),
            Self::SpanOutOfRange { id, span, len } => write!(
                f,
                "span [{}:{}] is out of range for `{id}` (length {len})",
                span.start, span.end
            ),
            Self::MissingText(id) => write!(f, "item `{id}` has no text to select"),
            Self::CycleDetected(id) => {
                write!(f, "reference chain through `{id}` exceeds {MAX_REFERENCE_DEPTH} levels")
            }
        }
    }
}

impl Error for QueryError {}

/// Resolves `expr` against the items of `igt`.
pub fn resolve_expression(igt: &Igt, expr: &str) -> Result<String, QueryError> {
    resolve_at_depth(igt, expr, 0)
}

impl Item {
    /// Returns the item's text, else the text selected by its `content`
    /// expression, else by its `segmentation` expression.
    pub fn value(&self, igt: &Igt) -> Result<String, QueryError> {
        item_value(igt, self, 0)
    }
}

fn resolve_at_depth(igt: &Igt, expr: &str, depth: usize) -> Result<String, QueryError> {
    let parsed = AlignmentExpr::parse(expr)?;
    let mut out = String::new();
    for segment in &parsed.segments {
        let item = igt
            .get_item(&segment.id)
            .ok_or_else(|| QueryError::UnknownId(segment.id.clone()))?;
        let text = item_value(igt, item, depth + 1)?;
        let selected = match segment.span {
            Some(span) => select_span(&segment.id, &text, span)?,
            None => text,
        };
        if segment.joiner == Some(Joiner::Delimit) {
            out.push(' ');
        }
        out.push_str(&selected);
    }
    Ok(out)
}

fn item_value(igt: &Igt, item: &Item, depth: usize) -> Result<String, QueryError> {
    let id = item.id().unwrap_or_default();
    if depth > MAX_REFERENCE_DEPTH {
        return Err(QueryError::CycleDetected(id.to_string()));
    }
    if let Some(text) = item.text() {
        return Ok(text.to_string());
    }
    match item.content().or_else(|| item.segmentation()) {
        Some(expr) => resolve_at_depth(igt, expr, depth),
        None => Err(QueryError::MissingText(id.to_string())),
    }
}

fn select_span(id: &str, text: &str, span: Span) -> Result<String, QueryError> {
    let len = text.chars().count();
    if span.end > len {
        return Err(QueryError::SpanOutOfRange {
            id: id.to_string(),
            span,
            len,
        });
    }
    Ok(text
        .chars()
        .skip(span.start)
        .take(span.end - span.start)
        .collect())
}
