//! Namespace declarations and scoped namespace contexts.
//!
//! # Responsibility
//! - Hold per-node prefix -> URI declarations in declaration order.
//! - Compute the active context of a node (`merge`), the bindings a node must
//!   declare itself (`delta`) and the URI -> prefix view used to rewrite
//!   attribute keys (`invert`).
//!
//! # Invariants
//! - Node-level declarations shadow inherited ones under the same prefix.
//! - `invert` is first-declared-wins in context iteration order.
//! - The default namespace (prefix `""`) never qualifies attribute keys.
//! - `render_key` is injective per context: `resolve_key` maps its output back
//!   to the same key, so distinct keys never share a serialized name.

use crate::model::attributes::AttrKey;
use std::collections::HashMap;

/// Prefix used for the default namespace.
pub const DEFAULT_PREFIX: &str = "";

/// Leading marker of a plain key written verbatim, as in `\x:note`.
pub const PLAIN_KEY_ESCAPE: char = '\\';

/// Insertion-ordered prefix -> URI map.
///
/// Used both for a node's own declarations and for an active context.
/// Equality compares bindings and ignores declaration order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    bindings: Vec<(String, String)>,
}

/// URI -> prefix lookup derived from a context.
pub type InverseNamespaceMap = HashMap<String, String>;

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(existing, _)| existing == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Binds `prefix` to `uri`, replacing an earlier binding in place.
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        let prefix = prefix.into();
        let uri = uri.into();
        match self
            .bindings
            .iter_mut()
            .find(|(existing, _)| *existing == prefix)
        {
            Some((_, slot)) => Some(std::mem::replace(slot, uri)),
            None => {
                self.bindings.push((prefix, uri));
                None
            }
        }
    }

    pub fn remove(&mut self, prefix: &str) -> Option<String> {
        let index = self
            .bindings
            .iter()
            .position(|(existing, _)| existing == prefix)?;
        Some(self.bindings.remove(index).1)
    }

    /// Returns true when `prefix` is bound to exactly `uri`.
    pub fn binds(&self, prefix: &str, uri: &str) -> bool {
        self.get(prefix) == Some(uri)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }
}

impl PartialEq for NamespaceMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(prefix, uri)| other.binds(prefix, uri))
    }
}

impl Eq for NamespaceMap {}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for NamespaceMap {
    fn from_iter<T: IntoIterator<Item = (P, U)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (prefix, uri) in iter {
            map.insert(prefix, uri);
        }
        map
    }
}

/// Computes the active context of a node.
///
/// Inherited bindings keep their position; a redeclared prefix takes the
/// node's URI; new prefixes are appended in declaration order.
pub fn merge(parent: &NamespaceMap, own: &NamespaceMap) -> NamespaceMap {
    let mut active = parent.clone();
    for (prefix, uri) in own.iter() {
        active.insert(prefix, uri);
    }
    active
}

/// Returns the bindings of `active` not already present, unchanged, in
/// `parent`.
///
/// A prefix rebound to a different URI is part of the delta.
pub fn delta(active: &NamespaceMap, parent: &NamespaceMap) -> NamespaceMap {
    active
        .iter()
        .filter(|(prefix, uri)| !parent.binds(prefix, uri))
        .collect()
}

/// Builds the URI -> prefix view of a context.
///
/// When several prefixes share a URI the first one in iteration order wins.
/// The default prefix is skipped since it cannot name an attribute.
pub fn invert(context: &NamespaceMap) -> InverseNamespaceMap {
    let mut inverse = InverseNamespaceMap::new();
    for (prefix, uri) in context.iter() {
        if prefix == DEFAULT_PREFIX {
            continue;
        }
        inverse
            .entry(uri.to_string())
            .or_insert_with(|| prefix.to_string());
    }
    inverse
}

/// Renders an attribute key in `prefix:local` form.
///
/// Plain keys are returned as-is. Returns `None` for a qualified key whose
/// URI has no prefix in `inverse`.
pub fn prefixed_key(key: &AttrKey, inverse: &InverseNamespaceMap) -> Option<String> {
    match key {
        AttrKey::Plain(name) => Some(name.clone()),
        AttrKey::Qualified { uri, local } => inverse
            .get(uri)
            .map(|prefix| format!("{prefix}:{local}")),
    }
}

/// Serializes an attribute key so that `resolve_key` reads it back unchanged.
///
/// Qualified keys prefer `prefix:local`, then Clark notation. Plain keys are
/// written as-is unless that text would resolve to something else (a bound
/// `prefix:`, a leading `{` or the escape marker), in which case they get a
/// leading `PLAIN_KEY_ESCAPE`. Returns `None` when no form round-trips, e.g. a
/// qualified key with an empty local name.
pub fn render_key(
    key: &AttrKey,
    context: &NamespaceMap,
    inverse: &InverseNamespaceMap,
) -> Option<String> {
    let candidates = match key {
        AttrKey::Plain(name) => vec![name.clone(), format!("{PLAIN_KEY_ESCAPE}{name}")],
        AttrKey::Qualified { .. } => prefixed_key(key, inverse)
            .into_iter()
            .chain(std::iter::once(key.to_clark()))
            .collect(),
    };
    candidates
        .into_iter()
        .find(|candidate| resolve_key(candidate, context) == *key)
}

/// Interprets a serialized attribute key against a context.
///
/// A leading `PLAIN_KEY_ESCAPE` marks a plain key and is stripped. Clark
/// notation (`{uri}local`) is always qualified. `prefix:local` is qualified
/// when `prefix` is bound in `context`; anything else stays plain.
pub fn resolve_key(raw: &str, context: &NamespaceMap) -> AttrKey {
    if let Some(name) = raw.strip_prefix(PLAIN_KEY_ESCAPE) {
        return AttrKey::plain(name);
    }
    if let Some(key) = AttrKey::from_clark(raw) {
        return key;
    }
    if let Some((prefix, local)) = raw.split_once(':') {
        if !prefix.is_empty() && !local.is_empty() {
            if let Some(uri) = context.get(prefix) {
                return AttrKey::qualified(uri, local);
            }
        }
    }
    AttrKey::plain(raw)
}
