//! Attribute keys and insertion-ordered attribute maps.
//!
//! # Responsibility
//! - Model attribute names as an explicit sum type instead of sniffing
//!   strings for a `{uri}` prefix.
//! - Keep attributes in insertion order so serialized output is stable.
//!
//! # Invariants
//! - A key appears at most once in an `Attributes` map.
//! - `Plain("a")` and `Qualified { uri, local: "a" }` are distinct keys.

use std::fmt::{Display, Formatter};

/// Attribute name, either plain or bound to a namespace URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKey {
    /// Unqualified attribute name.
    Plain(String),
    /// Namespace-qualified name, stored by URI rather than by prefix.
    Qualified { uri: String, local: String },
}

impl AttrKey {
    pub fn plain(name: impl Into<String>) -> Self {
        Self::Plain(name.into())
    }

    pub fn qualified(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self::Qualified {
            uri: uri.into(),
            local: local.into(),
        }
    }

    /// Parses Clark notation (`{uri}local`).
    ///
    /// Returns `None` when `raw` is not in Clark notation or either part is
    /// empty.
    pub fn from_clark(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix('{')?;
        let (uri, local) = rest.split_once('}')?;
        if uri.is_empty() || local.is_empty() {
            return None;
        }
        Some(Self::qualified(uri, local))
    }

    /// Renders the key in Clark notation; plain keys are returned unchanged.
    pub fn to_clark(&self) -> String {
        match self {
            Self::Plain(name) => name.clone(),
            Self::Qualified { uri, local } => format!("{{{uri}}}{local}"),
        }
    }

    pub fn local_name(&self) -> &str {
        match self {
            Self::Plain(name) => name,
            Self::Qualified { local, .. } => local,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Qualified { uri, .. } => Some(uri),
        }
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified { .. })
    }
}

impl Display for AttrKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(name) => write!(f, "{name}"),
            Self::Qualified { uri, local } => write!(f, "{{{uri}}}{local}"),
        }
    }
}

impl From<&str> for AttrKey {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<String> for AttrKey {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

/// Insertion-ordered attribute map.
///
/// Equality compares the key/value sets and ignores insertion order.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(AttrKey, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &AttrKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Looks up an unqualified attribute by name.
    pub fn get_plain(&self, name: &str) -> Option<&str> {
        self.entries.iter().find_map(|(key, value)| match key {
            AttrKey::Plain(existing) if existing == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains_key(&self, key: &AttrKey) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces a value, keeping the original position on replace.
    ///
    /// Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: impl Into<AttrKey>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &AttrKey) -> Option<String> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttrKey, &str)> {
        self.entries.iter().map(|(key, value)| (key, value.as_str()))
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value.as_str()))
    }
}

impl Eq for Attributes {}

impl<K: Into<AttrKey>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}
