//! Tree -> JSON encoding with minimal namespace declarations.
//!
//! # Responsibility
//! - Thread the active namespace context top-down through the tree.
//! - Emit at each node only the bindings its parent context lacks.
//! - Rewrite qualified attribute keys to `prefix:local` form.
//!
//! # Invariants
//! - Empty optional fields are omitted; `igts`, `tiers`, `items` and `metas`
//!   are always present.
//! - A qualified key with no bound prefix is kept in `{uri}local` form and
//!   never fails the encode.
//! - Every serialized attribute key decodes back to the key it came from;
//!   a key with no such form fails with `CodecError::UnencodableKey`.
//! - Empty `id`, `type` and `namespace` strings are omitted like absent ones.

use crate::codec::{
    check_depth, child_path, CodecError, CodecResult, FIELD_ATTRIBUTES, FIELD_CHILDREN, FIELD_ID,
    FIELD_IGTS, FIELD_ITEMS, FIELD_METADATA, FIELD_METAS, FIELD_NAME, FIELD_NAMESPACE,
    FIELD_NAMESPACES, FIELD_TEXT, FIELD_TIERS, FIELD_TYPE,
};
use crate::model::namespace::{delta, invert, merge, render_key, NamespaceMap};
use crate::model::node::{
    Corpus, DocumentRef, Igt, Item, Meta, MetaChild, Metadata, Tier, XigtNode,
};
use log::debug;
use serde_json::{Map, Value};

type JsonObject = Map<String, Value>;

const ROOT_PATH: &str = "$";

/// Encodes a corpus into its JSON value.
///
/// # Errors
/// - `CodecError::InvalidArgument` when `doc` is not a corpus.
/// - `CodecError::DepthLimit` when `MetaChild` nesting is too deep.
pub fn encode<'a>(doc: impl Into<DocumentRef<'a>>) -> CodecResult<Value> {
    match doc.into() {
        DocumentRef::Corpus(corpus) => encode_corpus(corpus),
        other => Err(CodecError::InvalidArgument(format!(
            "expected a corpus at the top level, got a {}",
            other.node_name()
        ))),
    }
}

/// Encodes the fields shared by all node types.
///
/// Returns the partial JSON object and the node's active namespace context,
/// which callers pass down as the parent context of the node's children.
/// Errors are reported at path `$`.
pub fn encode_node<N: XigtNode>(
    node: &N,
    parent: &NamespaceMap,
) -> CodecResult<(JsonObject, NamespaceMap)> {
    encode_fields(node, parent, ROOT_PATH)
}

fn encode_fields<N: XigtNode>(
    node: &N,
    parent: &NamespaceMap,
    path: &str,
) -> CodecResult<(JsonObject, NamespaceMap)> {
    let fields = node.fields();
    let active = merge(parent, &fields.nsmap);
    let declared = delta(&active, parent);

    let mut obj = JsonObject::new();
    if let Some(id) = non_empty(fields.id.as_deref()) {
        obj.insert(FIELD_ID.to_string(), Value::from(id));
    }
    if let Some(kind) = non_empty(fields.kind.as_deref()) {
        obj.insert(FIELD_TYPE.to_string(), Value::from(kind));
    }
    if !fields.attributes.is_empty() {
        let inverse = invert(&active);
        let mut attrs = JsonObject::new();
        for (key, value) in fields.attributes.iter() {
            if let Some(uri) = key.uri() {
                if !inverse.contains_key(uri) {
                    debug!(
                        "event=namespace_unresolved module=codec status=fallback path={} key={}",
                        path, key
                    );
                }
            }
            let name = render_key(key, &active, &inverse).ok_or_else(|| {
                CodecError::UnencodableKey {
                    path: path.to_string(),
                    key: key.to_string(),
                }
            })?;
            attrs.insert(name, Value::from(value));
        }
        obj.insert(FIELD_ATTRIBUTES.to_string(), Value::Object(attrs));
    }
    if let Some(namespace) = non_empty(fields.namespace.as_deref()) {
        obj.insert(FIELD_NAMESPACE.to_string(), Value::from(namespace));
    }
    if !declared.is_empty() {
        let bindings = declared
            .iter()
            .map(|(prefix, uri)| (prefix.to_string(), Value::from(uri)))
            .collect();
        obj.insert(FIELD_NAMESPACES.to_string(), Value::Object(bindings));
    }
    Ok((obj, active))
}

fn encode_corpus(corpus: &Corpus) -> CodecResult<Value> {
    let (mut obj, ns) = encode_fields(corpus, &NamespaceMap::new(), ROOT_PATH)?;
    insert_metadata(&mut obj, &corpus.metadata, &ns, ROOT_PATH)?;
    let igts = corpus
        .igts
        .iter()
        .enumerate()
        .map(|(index, igt)| encode_igt(igt, &ns, &child_path(ROOT_PATH, FIELD_IGTS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    obj.insert(FIELD_IGTS.to_string(), Value::Array(igts));

    debug!(
        "event=encode module=codec status=ok igts={}",
        corpus.igts.len()
    );
    Ok(Value::Object(obj))
}

fn encode_igt(igt: &Igt, context: &NamespaceMap, path: &str) -> CodecResult<Value> {
    let (mut obj, ns) = encode_fields(igt, context, path)?;
    insert_metadata(&mut obj, &igt.metadata, &ns, path)?;
    let tiers = igt
        .tiers
        .iter()
        .enumerate()
        .map(|(index, tier)| encode_tier(tier, &ns, &child_path(path, FIELD_TIERS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    obj.insert(FIELD_TIERS.to_string(), Value::Array(tiers));
    Ok(Value::Object(obj))
}

fn encode_tier(tier: &Tier, context: &NamespaceMap, path: &str) -> CodecResult<Value> {
    let (mut obj, ns) = encode_fields(tier, context, path)?;
    insert_metadata(&mut obj, &tier.metadata, &ns, path)?;
    let items = tier
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| encode_item(item, &ns, &child_path(path, FIELD_ITEMS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    obj.insert(FIELD_ITEMS.to_string(), Value::Array(items));
    Ok(Value::Object(obj))
}

fn encode_item(item: &Item, context: &NamespaceMap, path: &str) -> CodecResult<Value> {
    let (mut obj, _) = encode_fields(item, context, path)?;
    if let Some(text) = &item.text {
        obj.insert(FIELD_TEXT.to_string(), Value::from(text.as_str()));
    }
    Ok(Value::Object(obj))
}

fn insert_metadata(
    obj: &mut JsonObject,
    metadata: &[Metadata],
    context: &NamespaceMap,
    path: &str,
) -> CodecResult<()> {
    if metadata.is_empty() {
        return Ok(());
    }
    let encoded = metadata
        .iter()
        .enumerate()
        .map(|(index, md)| encode_metadata(md, context, &child_path(path, FIELD_METADATA, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    obj.insert(FIELD_METADATA.to_string(), Value::Array(encoded));
    Ok(())
}

fn encode_metadata(metadata: &Metadata, context: &NamespaceMap, path: &str) -> CodecResult<Value> {
    let (mut obj, ns) = encode_fields(metadata, context, path)?;
    let metas = metadata
        .metas
        .iter()
        .enumerate()
        .map(|(index, meta)| encode_meta(meta, &ns, &child_path(path, FIELD_METAS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    obj.insert(FIELD_METAS.to_string(), Value::Array(metas));
    Ok(Value::Object(obj))
}

fn encode_meta(meta: &Meta, context: &NamespaceMap, path: &str) -> CodecResult<Value> {
    let (mut obj, ns) = encode_fields(meta, context, path)?;
    if let Some(text) = &meta.text {
        obj.insert(FIELD_TEXT.to_string(), Value::from(text.as_str()));
    }
    insert_children(&mut obj, &meta.children, &ns, path, 1)?;
    Ok(Value::Object(obj))
}

fn encode_metachild(
    child: &MetaChild,
    context: &NamespaceMap,
    path: &str,
    depth: usize,
) -> CodecResult<Value> {
    check_depth(path, depth)?;
    let (mut obj, ns) = encode_fields(child, context, path)?;
    obj.insert(FIELD_NAME.to_string(), Value::from(child.name.as_str()));
    if let Some(text) = &child.text {
        obj.insert(FIELD_TEXT.to_string(), Value::from(text.as_str()));
    }
    insert_children(&mut obj, &child.children, &ns, path, depth + 1)?;
    Ok(Value::Object(obj))
}

fn insert_children(
    obj: &mut JsonObject,
    children: &[MetaChild],
    context: &NamespaceMap,
    path: &str,
    depth: usize,
) -> CodecResult<()> {
    if children.is_empty() {
        return Ok(());
    }
    let encoded = children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            encode_metachild(
                child,
                context,
                &child_path(path, FIELD_CHILDREN, index),
                depth,
            )
        })
        .collect::<CodecResult<Vec<_>>>()?;
    obj.insert(FIELD_CHILDREN.to_string(), Value::Array(encoded));
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
