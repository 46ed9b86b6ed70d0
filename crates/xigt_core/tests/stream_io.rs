use std::fs;
use xigt_core::{
    dump, dump_path, dumps, load, load_path, loads, CodecError, Corpus, Igt, Item, LoadMode, Tier,
    XigtNode,
};

const SAMPLE: &str = r#"{
  "namespaces": {"dc": "http://purl.org/dc/elements/1.1/"},
  "igts": [
    {
      "id": "i1",
      "attributes": {"dc:source": "fieldwork"},
      "tiers": [
        {"id": "p", "type": "phrases", "items": [{"id": "p1", "text": "inu ga hoeru"}]}
      ]
    }
  ]
}"#;

fn small_corpus() -> Corpus {
    Corpus::new().with_igt(
        Igt::new("i1").with_tier(Tier::new("p", "phrases").with_item(Item::new("p1").with_text("x"))),
    )
}

#[test]
fn loads_reads_a_document() {
    let corpus = loads(SAMPLE).unwrap();
    assert_eq!(corpus.mode, LoadMode::Full);
    assert_eq!(corpus.igts.len(), 1);
    let item = corpus.get("i1").and_then(|igt| igt.get_item("p1")).unwrap();
    assert_eq!(item.text(), Some("inu ga hoeru"));
}

#[test]
fn load_records_requested_mode() {
    let corpus = load(SAMPLE.as_bytes(), LoadMode::Incremental).unwrap();
    assert_eq!(corpus.mode, LoadMode::Incremental);
}

#[test]
fn loads_rejects_invalid_json() {
    let err = loads("{\"igts\": [").unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn loads_rejects_non_object_root() {
    let err = loads("[]").unwrap_err();
    assert!(matches!(err, CodecError::Malformed { .. }));
}

#[test]
fn dump_of_non_corpus_writes_nothing() {
    let tier = Tier::new("w", "words");
    let mut out = Vec::new();

    let err = dump(&mut out, &tier).unwrap_err();

    assert!(matches!(err, CodecError::InvalidArgument(_)));
    assert!(out.is_empty());
}

#[test]
fn dumps_is_pretty_printed() {
    let text = dumps(&small_corpus()).unwrap();
    assert!(text.starts_with("{\n  \"igts\": ["));
}

#[test]
fn dump_then_load_through_a_buffer() {
    let corpus = small_corpus();
    let mut out = Vec::new();
    dump(&mut out, &corpus).unwrap();

    let reloaded = load(out.as_slice(), LoadMode::Full).unwrap();
    assert_eq!(reloaded, corpus);
}

#[test]
fn dump_path_and_load_path_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("corpus.json");
    let corpus = loads(SAMPLE).unwrap();

    dump_path(&path, &corpus).unwrap();
    let reloaded = load_path(&path, LoadMode::Transient).unwrap();

    assert_eq!(reloaded.mode, LoadMode::Transient);
    assert_eq!(reloaded.igts, corpus.igts);
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"dc:source\": \"fieldwork\""));
}

#[test]
fn load_path_reports_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let err = load_path(dir.path().join("absent.json"), LoadMode::Full).unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
}

#[test]
fn metachild_without_name_reports_its_path() {
    let input = r#"{"metadata": [{"metas": [{"children": [{"text": "orphan"}]}]}], "igts": []}"#;
    let err = loads(input).unwrap_err();
    match err {
        CodecError::Malformed { path, .. } => {
            assert_eq!(path, "$.metadata[0].metas[0].children[0]");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_fields_are_ignored() {
    let input = r#"{"igts": [{"id": "i1", "tiers": [], "comment": "skip me"}], "extra": 1}"#;
    let corpus = loads(input).unwrap();
    assert_eq!(corpus.igts[0].id(), Some("i1"));
}
