//! Alignment expression parsing.
//!
//! Grammar (whitespace around tokens is ignored):
//!
//! ```text
//! expr  := term (op term)*
//! term  := ID | ID "[" span (op span)* "]"
//! span  := START ":" END
//! op    := "+" | ","
//! ```
//!
//! `+` concatenates the selected text and `,` joins it with one space. An
//! operator inside brackets behaves exactly like one between terms, so an
//! expression flattens to a list of `Segment`s.

use crate::query::QueryError;
use once_cell::sync::Lazy;
use regex::Regex;

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<id>[^\s\[\]+,:]+)(?:\[(?P<spans>[^\[\]]*)\])?\s*")
        .expect("valid alignment term regex")
});
static SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<start>\d+)\s*:\s*(?P<end>\d+)\s*$").expect("valid alignment span regex")
});
static OP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+,]").expect("valid alignment op regex"));

/// How a segment's text attaches to the text before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    /// `+`: append directly.
    Concat,
    /// `,`: append after a single space.
    Delimit,
}

impl Joiner {
    fn from_op(op: &str) -> Self {
        if op == "," {
            Self::Delimit
        } else {
            Self::Concat
        }
    }
}

/// Character span, start inclusive and end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One selection of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// `None` for the first segment.
    pub joiner: Option<Joiner>,
    pub id: String,
    /// `None` selects the whole text of `id`.
    pub span: Option<Span>,
}

/// Parsed alignment expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentExpr {
    pub segments: Vec<Segment>,
}

impl AlignmentExpr {
    /// Parses an alignment expression such as `p1[0:3]+p1[4:6],w2`.
    pub fn parse(expr: &str) -> Result<Self, QueryError> {
        let malformed = |reason: &str| QueryError::MalformedExpression {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = expr;
        let mut pending: Option<Joiner> = None;
        loop {
            let caps = TERM_RE
                .captures(rest)
                .ok_or_else(|| malformed("expected an identifier"))?;
            let id = caps["id"].to_string();
            match caps.name("spans") {
                None => segments.push(Segment {
                    joiner: pending.take(),
                    id,
                    span: None,
                }),
                Some(spans) => {
                    for (inner, raw) in split_ops(spans.as_str()) {
                        let span = parse_span(raw).ok_or_else(|| malformed("invalid span"))?;
                        segments.push(Segment {
                            joiner: inner.or_else(|| pending.take()),
                            id: id.clone(),
                            span: Some(span),
                        });
                    }
                }
            }

            rest = &rest[caps[0].len()..];
            if rest.is_empty() {
                break;
            }
            let op = OP_RE
                .find(rest)
                .filter(|m| m.start() == 0)
                .ok_or_else(|| malformed("expected `+` or `,` between terms"))?;
            pending = Some(Joiner::from_op(op.as_str()));
            rest = &rest[op.end()..];
        }

        if let Some(first) = segments.first_mut() {
            first.joiner = None;
        }
        Ok(Self { segments })
    }

    /// Distinct ids referenced by the expression, in first-use order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if !ids.contains(&segment.id.as_str()) {
                ids.push(segment.id.as_str());
            }
        }
        ids
    }
}

/// Splits `raw` on `+`/`,`, pairing each piece with the operator before it.
fn split_ops(raw: &str) -> Vec<(Option<Joiner>, &str)> {
    let mut pieces = Vec::new();
    let mut joiner = None;
    let mut last = 0;
    for op in OP_RE.find_iter(raw) {
        pieces.push((joiner, &raw[last..op.start()]));
        joiner = Some(Joiner::from_op(op.as_str()));
        last = op.end();
    }
    pieces.push((joiner, &raw[last..]));
    pieces
}

fn parse_span(raw: &str) -> Option<Span> {
    let caps = SPAN_RE.captures(raw)?;
    let start = caps["start"].parse().ok()?;
    let end = caps["end"].parse().ok()?;
    if end < start {
        return None;
    }
    Some(Span { start, end })
}

#[cfg(test)]
mod tests {
    use super::{AlignmentExpr, Joiner, Segment, Span};
    use crate::query::QueryError;

    fn segment(joiner: Option<Joiner>, id: &str, span: Option<(usize, usize)>) -> Segment {
        Segment {
            joiner,
            id: id.to_string(),
            span: span.map(|(start, end)| Span { start, end }),
        }
    }

    #[test]
    fn parses_bare_identifier() {
        let expr = AlignmentExpr::parse("p1").unwrap();
        assert_eq!(expr.segments, vec![segment(None, "p1", None)]);
    }

    #[test]
    fn parses_spans_and_operators() {
        let expr = AlignmentExpr::parse("p1[0:3+5:6], w2").unwrap();
        assert_eq!(
            expr.segments,
            vec![
                segment(None, "p1", Some((0, 3))),
                segment(Some(Joiner::Concat), "p1", Some((5, 6))),
                segment(Some(Joiner::Delimit), "w2", None),
            ]
        );
        assert_eq!(expr.ids(), vec!["p1", "w2"]);
    }

    #[test]
    fn operator_before_bracketed_term_is_kept() {
        let expr = AlignmentExpr::parse("w1+w2[0:1]").unwrap();
        assert_eq!(expr.segments[1], segment(Some(Joiner::Concat), "w2", Some((0, 1))));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for raw in ["", "p1[0-3]", "p1 p2", "p1[3:1]", "p1+"] {
            let err = AlignmentExpr::parse(raw).unwrap_err();
            assert!(
                matches!(err, QueryError::MalformedExpression { .. }),
                "expected malformed for {raw:?}, got {err:?}"
            );
        }
    }
}
