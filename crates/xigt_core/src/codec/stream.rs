//! Reader/writer and string entry points for the JSON codec.
//!
//! # Responsibility
//! - Parse JSON from readers/strings and hand the value to the decoder.
//! - Encode, then serialize, then write.
//!
//! # Invariants
//! - `dump` writes nothing unless the whole document encoded and serialized.
//! - Output is pretty-printed with a two-space indent.

use crate::codec::{decode, encode, CodecResult};
use crate::model::node::{Corpus, DocumentRef, LoadMode};
use log::info;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Reads and decodes a corpus from `reader`.
pub fn load<R: Read>(reader: R, mode: LoadMode) -> CodecResult<Corpus> {
    let value: Value = serde_json::from_reader(reader)?;
    decode(&value, mode)
}

/// Decodes a corpus from a JSON string using `LoadMode::Full`.
pub fn loads(text: &str) -> CodecResult<Corpus> {
    let value: Value = serde_json::from_str(text)?;
    decode(&value, LoadMode::Full)
}

/// Encodes `doc` and writes the JSON text to `writer`.
///
/// # Errors
/// - `CodecError::InvalidArgument` when `doc` is not a corpus; nothing is
///   written in that case.
pub fn dump<'a, W: Write>(mut writer: W, doc: impl Into<DocumentRef<'a>>) -> CodecResult<()> {
    let text = dumps(doc)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Encodes `doc` into a pretty-printed JSON string.
pub fn dumps<'a>(doc: impl Into<DocumentRef<'a>>) -> CodecResult<String> {
    let value = encode(doc)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Loads a corpus from the file at `path`.
pub fn load_path(path: impl AsRef<Path>, mode: LoadMode) -> CodecResult<Corpus> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let corpus = load(BufReader::new(file), mode)?;
    info!(
        "event=corpus_load module=codec status=ok path={} igts={}",
        path.display(),
        corpus.igts.len()
    );
    Ok(corpus)
}

/// Writes `corpus` to the file at `path`, creating or truncating it.
///
/// The file is only opened after encoding succeeded.
pub fn dump_path(path: impl AsRef<Path>, corpus: &Corpus) -> CodecResult<()> {
    let path = path.as_ref();
    let text = dumps(corpus)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    info!(
        "event=corpus_dump module=codec status=ok path={} igts={}",
        path.display(),
        corpus.igts.len()
    );
    Ok(())
}
