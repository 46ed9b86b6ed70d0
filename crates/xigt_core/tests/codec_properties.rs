//! Property-based checks of the codec over generated trees.
//!
//! Trees mix namespace declarations (including shadowing and redundant
//! redeclarations), plain keys that look prefixed or Clark-notated, and
//! qualified keys with bound and unbound URIs.

use proptest::prelude::*;
use serde_json::{Map, Value};
use xigt_core::{
    decode, encode, invert, merge, render_key, resolve_key, AttrKey, Attributes, Corpus, Igt,
    Item, LoadMode, Meta, MetaChild, Metadata, NamespaceMap, NodeFields, Tier,
};

const PREFIXES: [&str; 4] = ["", "a", "b", "x"];
const URIS: [&str; 3] = ["http://a.example/", "http://b.example/", "urn:example:c"];

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 96,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// Generators
// =============================================================================

fn uri() -> impl Strategy<Value = String> {
    prop::sample::select(URIS.to_vec()).prop_map(|uri| uri.to_string())
}

fn nsmap() -> impl Strategy<Value = NamespaceMap> {
    prop::collection::vec(
        (
            prop::sample::select(PREFIXES.to_vec()),
            prop::sample::select(URIS.to_vec()),
        ),
        0..3,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
}

fn unbound_key() -> impl Strategy<Value = AttrKey> {
    ("urn:unbound:[a-z]", "[a-z]{1,4}").prop_map(|(uri, local)| AttrKey::qualified(uri, local))
}

fn attr_key() -> impl Strategy<Value = AttrKey> {
    prop_oneof![
        "[a-z]{1,4}".prop_map(|name| AttrKey::plain(name)),
        "[abxq]:[a-z]{1,3}".prop_map(|name| AttrKey::plain(name)),
        "\\{urn:example:c\\}[a-z]{1,3}".prop_map(|name| AttrKey::plain(name)),
        "\\\\[a-z]{1,3}".prop_map(|name| AttrKey::plain(name)),
        (uri(), "[a-z]{1,4}").prop_map(|(uri, local)| AttrKey::qualified(uri, local)),
        (uri(), "[a-z]:[a-z]{1,2}").prop_map(|(uri, local)| AttrKey::qualified(uri, local)),
        unbound_key(),
    ]
}

fn fields() -> impl Strategy<Value = NodeFields> {
    (
        prop::option::of("[a-z][a-z0-9]{0,3}"),
        prop::option::of("[a-z]{1,6}"),
        prop::collection::vec((attr_key(), "[a-z ]{0,5}"), 0..4),
        prop::option::of(uri()),
        nsmap(),
    )
        .prop_map(|(id, kind, attributes, namespace, nsmap)| NodeFields {
            id,
            kind,
            attributes: attributes.into_iter().collect::<Attributes>(),
            namespace,
            nsmap,
        })
}

fn text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z ]{0,6}")
}

fn leaf_child() -> impl Strategy<Value = MetaChild> {
    ("[a-z:]{1,6}", fields(), text()).prop_map(|(name, fields, text)| MetaChild {
        name,
        fields,
        text,
        children: Vec::new(),
    })
}

fn meta_child() -> impl Strategy<Value = MetaChild> {
    (
        "[a-z:]{1,6}",
        fields(),
        text(),
        prop::collection::vec(leaf_child(), 0..2),
    )
        .prop_map(|(name, fields, text, children)| MetaChild {
            name,
            fields,
            text,
            children,
        })
}

fn metadata() -> impl Strategy<Value = Metadata> {
    let meta = (fields(), text(), prop::collection::vec(meta_child(), 0..2)).prop_map(
        |(fields, text, children)| Meta {
            fields,
            text,
            children,
        },
    );
    (fields(), prop::collection::vec(meta, 0..2))
        .prop_map(|(fields, metas)| Metadata { fields, metas })
}

fn tier() -> impl Strategy<Value = Tier> {
    let item = (fields(), text()).prop_map(|(fields, text)| Item { fields, text });
    (
        fields(),
        prop::collection::vec(metadata(), 0..2),
        prop::collection::vec(item, 0..4),
    )
        .prop_map(|(fields, metadata, items)| Tier {
            fields,
            metadata,
            items,
        })
}

fn corpus() -> impl Strategy<Value = Corpus> {
    let igt = (
        fields(),
        prop::collection::vec(metadata(), 0..2),
        prop::collection::vec(tier(), 0..3),
    )
        .prop_map(|(fields, metadata, tiers)| Igt {
            fields,
            metadata,
            tiers,
        });
    (
        fields(),
        prop::collection::vec(metadata(), 0..2),
        prop::collection::vec(igt, 0..3),
    )
        .prop_map(|(fields, metadata, igts)| Corpus {
            fields,
            metadata,
            igts,
            mode: LoadMode::Full,
        })
}

// =============================================================================
// Helpers
// =============================================================================

/// Drops declarations identical to an inherited binding; the encoder never
/// writes those, so only the pruned tree can round-trip exactly.
fn prune(fields: &mut NodeFields, parent: &NamespaceMap) -> NamespaceMap {
    let own: NamespaceMap = fields
        .nsmap
        .iter()
        .filter(|(prefix, uri)| !parent.binds(prefix, uri))
        .collect();
    fields.nsmap = own;
    merge(parent, &fields.nsmap)
}

fn prune_metadata(metadata: &mut Metadata, parent: &NamespaceMap) {
    let md_ns = prune(&mut metadata.fields, parent);
    for meta in &mut metadata.metas {
        let meta_ns = prune(&mut meta.fields, &md_ns);
        for child in &mut meta.children {
            prune_child(child, &meta_ns);
        }
    }
}

fn prune_child(child: &mut MetaChild, parent: &NamespaceMap) {
    let child_ns = prune(&mut child.fields, parent);
    for nested in &mut child.children {
        prune_child(nested, &child_ns);
    }
}

fn prune_corpus(corpus: &mut Corpus) {
    let corpus_ns = prune(&mut corpus.fields, &NamespaceMap::new());
    for metadata in &mut corpus.metadata {
        prune_metadata(metadata, &corpus_ns);
    }
    for igt in &mut corpus.igts {
        let igt_ns = prune(&mut igt.fields, &corpus_ns);
        for metadata in &mut igt.metadata {
            prune_metadata(metadata, &igt_ns);
        }
        for tier in &mut igt.tiers {
            let tier_ns = prune(&mut tier.fields, &igt_ns);
            for metadata in &mut tier.metadata {
                prune_metadata(metadata, &tier_ns);
            }
            for item in &mut tier.items {
                prune(&mut item.fields, &tier_ns);
            }
        }
    }
}

const CHILD_FIELDS: [&str; 6] = ["metadata", "igts", "tiers", "items", "metas", "children"];

fn assert_minimal_namespaces(value: &Value, parent: &Map<String, Value>) {
    let obj = value.as_object().expect("every node is an object");
    let mut active = parent.clone();
    if let Some(declared) = obj.get("namespaces").and_then(Value::as_object) {
        for (prefix, uri) in declared {
            assert_ne!(parent.get(prefix), Some(uri), "re-declared {prefix}={uri}");
            active.insert(prefix.clone(), uri.clone());
        }
    }
    for field in CHILD_FIELDS {
        if let Some(children) = obj.get(field).and_then(Value::as_array) {
            for child in children {
                assert_minimal_namespaces(child, &active);
            }
        }
    }
}

fn item_ids(corpus: &Corpus) -> Vec<Vec<Vec<Option<String>>>> {
    corpus
        .igts
        .iter()
        .map(|igt| {
            igt.tiers
                .iter()
                .map(|tier| tier.items.iter().map(|item| item.fields.id.clone()).collect())
                .collect()
        })
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(config())]

    #[test]
    fn decode_of_encode_reproduces_the_tree(corpus in corpus()) {
        let mut corpus = corpus;
        prune_corpus(&mut corpus);

        let decoded = decode(&encode(&corpus).unwrap(), LoadMode::Full).unwrap();
        prop_assert_eq!(decoded, corpus);
    }

    #[test]
    fn reencoding_is_stable(corpus in corpus()) {
        let first = encode(&corpus).unwrap();
        let second = encode(&decode(&first, LoadMode::Full).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn namespaces_are_never_redeclared(corpus in corpus()) {
        let value = encode(&corpus).unwrap();
        assert_minimal_namespaces(&value, &Map::new());
    }

    #[test]
    fn item_order_is_preserved(corpus in corpus()) {
        let decoded = decode(&encode(&corpus).unwrap(), LoadMode::Full).unwrap();
        prop_assert_eq!(item_ids(&decoded), item_ids(&corpus));
    }

    #[test]
    fn rendered_keys_resolve_to_themselves(key in attr_key(), context in nsmap()) {
        let inverse = invert(&context);
        let rendered = render_key(&key, &context, &inverse).unwrap();
        prop_assert_eq!(resolve_key(&rendered, &context), key.clone());

        if let AttrKey::Qualified { uri, local } = &key {
            if let Some(prefix) = inverse.get(uri) {
                prop_assert_eq!(rendered, format!("{prefix}:{local}"));
            }
        }
    }

    #[test]
    fn unbound_qualified_keys_fall_back_to_clark(key in unbound_key(), context in nsmap()) {
        let inverse = invert(&context);
        prop_assert_eq!(render_key(&key, &context, &inverse), Some(key.to_clark()));

        let mut corpus = Corpus::new();
        corpus.fields.nsmap = context;
        corpus.fields.attributes.insert(key.clone(), "v");
        let value = encode(&corpus).unwrap();
        prop_assert!(value["attributes"][key.to_clark()] == "v");
    }
}
