//! JSON -> tree decoding.
//!
//! # Responsibility
//! - Rebuild document trees from JSON values using the encoder's field names.
//! - Store each node's `namespace`/`namespaces` fields exactly as given.
//! - Turn serialized attribute keys back into `AttrKey` values.
//!
//! # Invariants
//! - Missing optional fields default to empty collections or `None`.
//! - A missing `MetaChild` name or a wrongly typed field fails the whole
//!   decode with a path to the offending node.
//! - `prefix:local` keys are qualified against the node's active context
//!   (inherited declarations plus its own); unknown prefixes stay plain.
//! - A key with a leading `\` is a plain key written verbatim.

use crate::codec::{
    check_depth, child_path, CodecError, CodecResult, FIELD_ATTRIBUTES, FIELD_CHILDREN, FIELD_ID,
    FIELD_IGTS, FIELD_ITEMS, FIELD_METADATA, FIELD_METAS, FIELD_NAME, FIELD_NAMESPACE,
    FIELD_NAMESPACES, FIELD_TEXT, FIELD_TIERS, FIELD_TYPE,
};
use crate::model::attributes::Attributes;
use crate::model::namespace::{merge, resolve_key, NamespaceMap};
use crate::model::node::{Corpus, Igt, Item, LoadMode, Meta, MetaChild, Metadata, NodeFields, Tier};
use log::debug;
use serde_json::{Map, Value};

type JsonObject = Map<String, Value>;

const ROOT_PATH: &str = "$";

/// Decodes a corpus from its JSON value.
///
/// `mode` is stored on the returned corpus and does not affect decoding.
///
/// # Errors
/// - `CodecError::Malformed` for non-object nodes, wrongly typed fields or a
///   `MetaChild` without a name.
/// - `CodecError::DepthLimit` when `MetaChild` nesting is too deep.
pub fn decode(value: &Value, mode: LoadMode) -> CodecResult<Corpus> {
    let obj = as_object(value, ROOT_PATH)?;
    let (fields, ns) = decode_fields(obj, &NamespaceMap::new(), ROOT_PATH)?;
    let metadata = decode_metadata_list(obj, &ns, ROOT_PATH)?;
    let igts = array_field(obj, FIELD_IGTS, ROOT_PATH)?
        .iter()
        .enumerate()
        .map(|(index, igt)| decode_igt(igt, &ns, &child_path(ROOT_PATH, FIELD_IGTS, index)))
        .collect::<CodecResult<Vec<_>>>()?;

    debug!(
        "event=decode module=codec status=ok igts={} mode={}",
        igts.len(),
        mode
    );
    Ok(Corpus {
        fields,
        metadata,
        igts,
        mode,
    })
}

fn decode_igt(value: &Value, context: &NamespaceMap, path: &str) -> CodecResult<Igt> {
    let obj = as_object(value, path)?;
    let (fields, ns) = decode_fields(obj, context, path)?;
    let metadata = decode_metadata_list(obj, &ns, path)?;
    let tiers = array_field(obj, FIELD_TIERS, path)?
        .iter()
        .enumerate()
        .map(|(index, tier)| decode_tier(tier, &ns, &child_path(path, FIELD_TIERS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(Igt {
        fields,
        metadata,
        tiers,
    })
}

fn decode_tier(value: &Value, context: &NamespaceMap, path: &str) -> CodecResult<Tier> {
    let obj = as_object(value, path)?;
    let (fields, ns) = decode_fields(obj, context, path)?;
    let metadata = decode_metadata_list(obj, &ns, path)?;
    let items = array_field(obj, FIELD_ITEMS, path)?
        .iter()
        .enumerate()
        .map(|(index, item)| decode_item(item, &ns, &child_path(path, FIELD_ITEMS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(Tier {
        fields,
        metadata,
        items,
    })
}

fn decode_item(value: &Value, context: &NamespaceMap, path: &str) -> CodecResult<Item> {
    let obj = as_object(value, path)?;
    let (fields, _) = decode_fields(obj, context, path)?;
    let text = string_field(obj, FIELD_TEXT, path)?;
    Ok(Item { fields, text })
}

fn decode_metadata_list(
    obj: &JsonObject,
    context: &NamespaceMap,
    path: &str,
) -> CodecResult<Vec<Metadata>> {
    array_field(obj, FIELD_METADATA, path)?
        .iter()
        .enumerate()
        .map(|(index, md)| decode_metadata(md, context, &child_path(path, FIELD_METADATA, index)))
        .collect()
}

fn decode_metadata(value: &Value, context: &NamespaceMap, path: &str) -> CodecResult<Metadata> {
    let obj = as_object(value, path)?;
    let (fields, ns) = decode_fields(obj, context, path)?;
    let metas = array_field(obj, FIELD_METAS, path)?
        .iter()
        .enumerate()
        .map(|(index, meta)| decode_meta(meta, &ns, &child_path(path, FIELD_METAS, index)))
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(Metadata { fields, metas })
}

fn decode_meta(value: &Value, context: &NamespaceMap, path: &str) -> CodecResult<Meta> {
    let obj = as_object(value, path)?;
    let (fields, ns) = decode_fields(obj, context, path)?;
    let text = string_field(obj, FIELD_TEXT, path)?;
    let children = decode_children(obj, &ns, path, 1)?;
    Ok(Meta {
        fields,
        text,
        children,
    })
}

fn decode_metachild(
    value: &Value,
    context: &NamespaceMap,
    path: &str,
    depth: usize,
) -> CodecResult<MetaChild> {
    check_depth(path, depth)?;
    let obj = as_object(value, path)?;
    let name = string_field(obj, FIELD_NAME, path)?
        .ok_or_else(|| CodecError::malformed(path, "metachild requires a `name` field"))?;
    let (fields, ns) = decode_fields(obj, context, path)?;
    let text = string_field(obj, FIELD_TEXT, path)?;
    let children = decode_children(obj, &ns, path, depth + 1)?;
    Ok(MetaChild {
        name,
        fields,
        text,
        children,
    })
}

fn decode_children(
    obj: &JsonObject,
    context: &NamespaceMap,
    path: &str,
    depth: usize,
) -> CodecResult<Vec<MetaChild>> {
    array_field(obj, FIELD_CHILDREN, path)?
        .iter()
        .enumerate()
        .map(|(index, child)| {
            decode_metachild(
                child,
                context,
                &child_path(path, FIELD_CHILDREN, index),
                depth,
            )
        })
        .collect()
}

/// Reads the shared node fields and returns them with the node's active
/// namespace context.
fn decode_fields(
    obj: &JsonObject,
    context: &NamespaceMap,
    path: &str,
) -> CodecResult<(NodeFields, NamespaceMap)> {
    let nsmap: NamespaceMap = string_map(obj, FIELD_NAMESPACES, path)?
        .into_iter()
        .collect();
    let active = merge(context, &nsmap);

    let mut attributes = Attributes::new();
    for (key, value) in string_map(obj, FIELD_ATTRIBUTES, path)? {
        attributes.insert(resolve_key(&key, &active), value);
    }

    let fields = NodeFields {
        id: string_field(obj, FIELD_ID, path)?,
        kind: string_field(obj, FIELD_TYPE, path)?,
        attributes,
        namespace: string_field(obj, FIELD_NAMESPACE, path)?,
        nsmap,
    };
    Ok((fields, active))
}

fn as_object<'a>(value: &'a Value, path: &str) -> CodecResult<&'a JsonObject> {
    value.as_object().ok_or_else(|| {
        CodecError::malformed(path, format!("expected object, got {}", json_kind(value)))
    })
}

fn string_field(obj: &JsonObject, field: &str, path: &str) -> CodecResult<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(CodecError::malformed(
            path,
            format!("`{field}` must be a string, got {}", json_kind(other)),
        )),
    }
}

fn array_field<'a>(obj: &'a JsonObject, field: &str, path: &str) -> CodecResult<&'a [Value]> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(values)) => Ok(values.as_slice()),
        Some(other) => Err(CodecError::malformed(
            path,
            format!("`{field}` must be an array, got {}", json_kind(other)),
        )),
    }
}

fn string_map(obj: &JsonObject, field: &str, path: &str) -> CodecResult<Vec<(String, String)>> {
    let entries = match obj.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(CodecError::malformed(
                path,
                format!("`{field}` must be an object, got {}", json_kind(other)),
            ))
        }
    };
    entries
        .iter()
        .map(|(key, value)| match value {
            Value::String(value) => Ok((key.clone(), value.clone())),
            other => Err(CodecError::malformed(
                path,
                format!(
                    "`{field}.{key}` must be a string, got {}",
                    json_kind(other)
                ),
            )),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::decode;
    use crate::codec::{CodecError, MAX_NESTING_DEPTH};
    use crate::model::attributes::AttrKey;
    use crate::model::node::{LoadMode, XigtNode};
    use serde_json::{json, Value};

    #[test]
    fn decode_defaults_missing_fields() {
        let corpus = decode(&json!({}), LoadMode::Transient).unwrap();
        assert!(corpus.igts.is_empty());
        assert!(corpus.metadata.is_empty());
        assert_eq!(corpus.id(), None);
        assert_eq!(corpus.mode, LoadMode::Transient);
    }

    #[test]
    fn decode_requires_metachild_name() {
        let value = json!({
            "metadata": [{"metas": [{"children": [{"text": "orphan"}]}]}],
            "igts": []
        });
        let err = decode(&value, LoadMode::Full).unwrap_err();
        match err {
            CodecError::Malformed { path, reason } => {
                assert_eq!(path, "$.metadata[0].metas[0].children[0]");
                assert!(reason.contains("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_wrong_field_types() {
        let err = decode(&json!({"igts": {"id": "i1"}}), LoadMode::Full).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));

        let err = decode(
            &json!({"igts": [{"attributes": {"n": 3}}]}),
            LoadMode::Full,
        )
        .unwrap_err();
        assert!(err.to_string().contains("attributes.n"));
    }

    #[test]
    fn decode_qualifies_keys_with_inherited_prefixes() {
        let value = json!({
            "namespaces": {"dc": "http://purl.org/dc/elements/1.1/"},
            "igts": [{"id": "i1", "attributes": {"dc:source": "field notes", "x:y": "z"}, "tiers": []}]
        });
        let corpus = decode(&value, LoadMode::Full).unwrap();
        let igt = &corpus.igts[0];

        assert_eq!(
            igt.attributes()
                .get(&AttrKey::qualified("http://purl.org/dc/elements/1.1/", "source")),
            Some("field notes")
        );
        assert_eq!(igt.attribute("x:y"), Some("z"));
        assert!(igt.nsmap().is_empty());
    }

    #[test]
    fn decode_rejects_runaway_nesting() {
        let mut child = json!({"name": "leaf"});
        for _ in 0..MAX_NESTING_DEPTH {
            child = json!({"name": "span", "children": [child]});
        }
        let value: Value = json!({"metadata": [{"metas": [{"children": [child]}]}]});

        let err = decode(&value, LoadMode::Full).unwrap_err();
        assert!(matches!(err, CodecError::DepthLimit { .. }));
    }
}
