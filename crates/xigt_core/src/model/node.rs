//! Document tree node types.
//!
//! # Responsibility
//! - Define the fixed-depth ownership tree: `Corpus > Igt > Tier > Item`, with
//!   `Metadata > Meta > MetaChild` blocks hanging off corpus, igt and tier.
//! - Provide the constructors and lookup helpers used by producers such as
//!   importers.
//!
//! # Invariants
//! - Every node exclusively owns its children; child order is significant.
//! - Shared fields live in `NodeFields`, embedded by composition.
//! - Identifiers are opaque; uniqueness is a caller convention.

use crate::model::attributes::{AttrKey, Attributes};
use crate::model::namespace::NamespaceMap;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Attribute naming the tier/item a node is aligned to.
pub const ALIGNMENT_ATTR: &str = "alignment";
/// Attribute naming the tier/item a node segments.
pub const SEGMENTATION_ATTR: &str = "segmentation";
/// Attribute naming the tier/item a node takes its content from.
pub const CONTENT_ATTR: &str = "content";

/// Fields shared by every node type.
///
/// `id`, `kind` and `namespace` are identifiers: an empty string is written
/// like `None` and decodes as `None`. Node text is content, so `Some("")`
/// survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFields {
    pub id: Option<String>,
    /// Serialized as `type`.
    pub kind: Option<String>,
    pub attributes: Attributes,
    /// Default namespace URI declared on this node.
    pub namespace: Option<String>,
    /// Prefix declarations made by this node itself.
    pub nsmap: NamespaceMap,
}

/// Common access to `NodeFields` for every node type.
pub trait XigtNode {
    fn fields(&self) -> &NodeFields;
    fn fields_mut(&mut self) -> &mut NodeFields;

    fn id(&self) -> Option<&str> {
        self.fields().id.as_deref()
    }

    fn kind(&self) -> Option<&str> {
        self.fields().kind.as_deref()
    }

    fn attributes(&self) -> &Attributes {
        &self.fields().attributes
    }

    /// Reads an unqualified attribute.
    fn attribute(&self, name: &str) -> Option<&str> {
        self.fields().attributes.get_plain(name)
    }

    fn set_attribute(&mut self, key: impl Into<AttrKey>, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.fields_mut().attributes.insert(key, value);
    }

    fn nsmap(&self) -> &NamespaceMap {
        &self.fields().nsmap
    }

    fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>)
    where
        Self: Sized,
    {
        self.fields_mut().nsmap.insert(prefix, uri);
    }

    fn with_id(mut self, id: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.fields_mut().id = Some(id.into());
        self
    }

    fn with_kind(mut self, kind: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.fields_mut().kind = Some(kind.into());
        self
    }

    fn with_attribute(mut self, key: impl Into<AttrKey>, value: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.set_attribute(key, value);
        self
    }

    fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.declare_namespace(prefix, uri);
        self
    }

    fn with_default_namespace(mut self, uri: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.fields_mut().namespace = Some(uri.into());
        self
    }
}

macro_rules! impl_xigt_node {
    ($($node:ty),+ $(,)?) => {
        $(
            impl XigtNode for $node {
                fn fields(&self) -> &NodeFields {
                    &self.fields
                }

                fn fields_mut(&mut self) -> &mut NodeFields {
                    &mut self.fields
                }
            }
        )+
    };
}

impl_xigt_node!(Corpus, Igt, Tier, Item, Metadata, Meta, MetaChild);

/// Opaque load mode recorded on a decoded corpus.
///
/// The codec stores it and never branches on it. Names are the snake_case
/// variant names; `FromStr` goes through the `Deserialize` impl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    #[default]
    Full,
    Transient,
    Incremental,
}

impl LoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Transient => "transient",
            Self::Incremental => "incremental",
        }
    }
}

impl Display for LoadMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let deserializer: StrDeserializer<'_, ValueError> = normalized.as_str().into_deserializer();
        Self::deserialize(deserializer).map_err(|_| {
            format!("unsupported load mode `{normalized}`; expected full|transient|incremental")
        })
    }
}

/// Root collection of IGT records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub fields: NodeFields,
    pub metadata: Vec<Metadata>,
    pub igts: Vec<Igt>,
    pub mode: LoadMode,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, igt: Igt) {
        self.igts.push(igt);
    }

    pub fn with_igt(mut self, igt: Igt) -> Self {
        self.igts.push(igt);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    /// Returns the first igt with `id`.
    pub fn get(&self, id: &str) -> Option<&Igt> {
        self.igts.iter().find(|igt| igt.id() == Some(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Igt> {
        self.igts.iter_mut().find(|igt| igt.id() == Some(id))
    }
}

/// One annotated example (interlinear glossed text record).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Igt {
    pub fields: NodeFields,
    pub metadata: Vec<Metadata>,
    pub tiers: Vec<Tier>,
}

impl Igt {
    pub fn new(id: impl Into<String>) -> Self {
        Self::default().with_id(id)
    }

    pub fn push(&mut self, tier: Tier) {
        self.tiers.push(tier);
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    /// Returns the first tier with `id`.
    pub fn get(&self, id: &str) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.id() == Some(id))
    }

    /// Searches every tier, in order, for an item with `id`.
    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.tiers.iter().find_map(|tier| tier.get(id))
    }

    /// Returns the tiers whose `type` equals `kind`.
    pub fn tiers_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Tier> + 'a {
        self.tiers
            .iter()
            .filter(move |tier| tier.kind() == Some(kind))
    }
}

/// Ordered annotation layer within an igt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tier {
    pub fields: NodeFields,
    pub metadata: Vec<Metadata>,
    pub items: Vec<Item>,
}

impl Tier {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::default().with_id(id).with_kind(kind)
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    /// Returns the first item with `id`.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == Some(id))
    }

    pub fn alignment(&self) -> Option<&str> {
        self.attribute(ALIGNMENT_ATTR)
    }

    pub fn segmentation(&self) -> Option<&str> {
        self.attribute(SEGMENTATION_ATTR)
    }

    pub fn content(&self) -> Option<&str> {
        self.attribute(CONTENT_ATTR)
    }

    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().filter_map(|item| item.id()).collect()
    }
}

/// Smallest annotated unit; a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub fields: NodeFields,
    pub text: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self::default().with_id(id)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn alignment(&self) -> Option<&str> {
        self.attribute(ALIGNMENT_ATTR)
    }

    pub fn segmentation(&self) -> Option<&str> {
        self.attribute(SEGMENTATION_ATTR)
    }

    pub fn content(&self) -> Option<&str> {
        self.attribute(CONTENT_ATTR)
    }
}

/// Block of descriptive `Meta` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub fields: NodeFields,
    pub metas: Vec<Meta>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.metas.push(meta);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Meta> {
        self.metas.iter().find(|meta| meta.id() == Some(id))
    }
}

/// One descriptive entry: plain text or nested markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub fields: NodeFields,
    pub text: Option<String>,
    pub children: Vec<MetaChild>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: MetaChild) -> Self {
        self.children.push(child);
        self
    }
}

/// Uninterpreted nested markup inside a `Meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaChild {
    pub name: String,
    pub fields: NodeFields,
    pub text: Option<String>,
    pub children: Vec<MetaChild>,
}

impl MetaChild {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: NodeFields::default(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: MetaChild) -> Self {
        self.children.push(child);
        self
    }
}

/// Borrowed view of any node, accepted by the codec entry points.
#[derive(Debug, Clone, Copy)]
pub enum DocumentRef<'a> {
    Corpus(&'a Corpus),
    Igt(&'a Igt),
    Tier(&'a Tier),
    Item(&'a Item),
    Metadata(&'a Metadata),
    Meta(&'a Meta),
    MetaChild(&'a MetaChild),
}

impl DocumentRef<'_> {
    pub fn node_name(&self) -> &'static str {
        match self {
            Self::Corpus(_) => "corpus",
            Self::Igt(_) => "igt",
            Self::Tier(_) => "tier",
            Self::Item(_) => "item",
            Self::Metadata(_) => "metadata",
            Self::Meta(_) => "meta",
            Self::MetaChild(_) => "metachild",
        }
    }
}

impl<'a> From<&'a Corpus> for DocumentRef<'a> {
    fn from(value: &'a Corpus) -> Self {
        Self::Corpus(value)
    }
}

impl<'a> From<&'a Igt> for DocumentRef<'a> {
    fn from(value: &'a Igt) -> Self {
        Self::Igt(value)
    }
}

impl<'a> From<&'a Tier> for DocumentRef<'a> {
    fn from(value: &'a Tier) -> Self {
        Self::Tier(value)
    }
}

impl<'a> From<&'a Item> for DocumentRef<'a> {
    fn from(value: &'a Item) -> Self {
        Self::Item(value)
    }
}

impl<'a> From<&'a Metadata> for DocumentRef<'a> {
    fn from(value: &'a Metadata) -> Self {
        Self::Metadata(value)
    }
}

impl<'a> From<&'a Meta> for DocumentRef<'a> {
    fn from(value: &'a Meta) -> Self {
        Self::Meta(value)
    }
}

impl<'a> From<&'a MetaChild> for DocumentRef<'a> {
    fn from(value: &'a MetaChild) -> Self {
        Self::MetaChild(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Corpus, Igt, Item, LoadMode, Tier, XigtNode};

    fn sample_igt() -> Igt {
        Igt::new("i1")
            .with_tier(
                Tier::new("p", "phrases").with_item(Item::new("p1").with_text("inu ga hoeru")),
            )
            .with_tier(
                Tier::new("w", "words")
                    .with_attribute("segmentation", "p")
                    .with_item(Item::new("w1").with_attribute("segmentation", "p1[0:3]"))
                    .with_item(Item::new("w2").with_attribute("segmentation", "p1[4:6]")),
            )
    }

    #[test]
    fn lookups_find_first_match_by_id() {
        let corpus = Corpus::new().with_igt(sample_igt());
        let igt = corpus.get("i1").unwrap();

        assert_eq!(igt.get("w").and_then(|tier| tier.segmentation()), Some("p"));
        assert_eq!(igt.get_item("w2").and_then(Item::segmentation), Some("p1[4:6]"));
        assert!(igt.get_item("w3").is_none());
        assert_eq!(igt.tiers_of_kind("words").count(), 1);
    }

    #[test]
    fn item_ids_follow_insertion_order() {
        let igt = sample_igt();
        assert_eq!(igt.get("w").unwrap().item_ids(), vec!["w1", "w2"]);
    }

    #[test]
    fn load_mode_parses_known_values() {
        assert_eq!(" Full ".parse::<LoadMode>().unwrap(), LoadMode::Full);
        assert_eq!("transient".parse::<LoadMode>().unwrap(), LoadMode::Transient);
        assert_eq!(
            "INCREMENTAL".parse::<LoadMode>().unwrap(),
            LoadMode::Incremental
        );
        let err = "lazy".parse::<LoadMode>().unwrap_err();
        assert!(err.contains("full|transient|incremental"));
        assert_eq!(LoadMode::default().to_string(), "full");
    }
}
