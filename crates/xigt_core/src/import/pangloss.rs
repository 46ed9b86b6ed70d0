//! Pangloss XML importer.
//!
//! # Responsibility
//! - Read Pangloss `TEXT > S > W > M` documents.
//! - Build one igt per sentence with phrase, word, morpheme, gloss and
//!   translation tiers linked by segmentation/alignment references.
//!
//! # Invariants
//! - Only `TRANSL` elements whose `xml:lang` matches `gloss_lang` are used.
//! - Word and morpheme segmentation spans are character offsets that resolve
//!   back to the item text through `query::resolve_expression`.
//! - The output path is a parameter; the importer holds no global state.

use crate::codec::dump_path;
use crate::import::xml::{self, Element};
use crate::import::ImportResult;
use crate::model::node::{Corpus, Igt, Item, Tier, XigtNode, ALIGNMENT_ATTR, SEGMENTATION_ATTR};
use log::info;
use std::path::{Path, PathBuf};

const LANG_ATTR: &str = "xml:lang";

/// Importer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Language of the glosses and translations to keep.
    pub gloss_lang: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            gloss_lang: "en".to_string(),
        }
    }
}

/// Summary returned by `xigt_import`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub output: PathBuf,
    pub igts: usize,
}

/// Imports `input` and writes the resulting corpus as JSON to `output`.
pub fn xigt_import(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    let corpus = import_path(input.as_ref(), options)?;
    let output = output.as_ref();
    dump_path(output, &corpus)?;
    info!(
        "event=pangloss_import module=import status=ok input={} output={} igts={}",
        input.as_ref().display(),
        output.display(),
        corpus.igts.len()
    );
    Ok(ImportReport {
        output: output.to_path_buf(),
        igts: corpus.igts.len(),
    })
}

/// Reads and imports the Pangloss document at `path`.
pub fn import_path(path: impl AsRef<Path>, options: &ImportOptions) -> ImportResult<Corpus> {
    let input = std::fs::read_to_string(path)?;
    import_str(&input, options)
}

/// Imports a Pangloss document held in memory.
pub fn import_str(input: &str, options: &ImportOptions) -> ImportResult<Corpus> {
    let root = xml::parse(input)?;
    let mut corpus = Corpus::new();
    for (index, sentence) in root.find_all("S").enumerate() {
        let phrase = read_sentence(sentence, &options.gloss_lang)?;
        corpus.push(build_igt(index + 1, &phrase));
    }
    Ok(corpus)
}

#[derive(Debug, Default)]
struct Phrase {
    words: Vec<Word>,
    translation: Option<String>,
}

#[derive(Debug, Default)]
struct Word {
    form: String,
    morphemes: Vec<Morpheme>,
    /// Glosses attached to the word itself (used when it has no morphemes).
    glosses: Vec<String>,
}

#[derive(Debug, Default)]
struct Morpheme {
    form: String,
    glosses: Vec<String>,
}

fn read_sentence(sentence: &Element, lang: &str) -> ImportResult<Phrase> {
    let mut words = Vec::new();
    for word in sentence.find_all("W") {
        let mut morphemes = Vec::new();
        for morpheme in word.find_all("M") {
            morphemes.push(Morpheme {
                form: morpheme.child_text("FORM")?.to_string(),
                glosses: translations(morpheme, lang),
            });
        }
        words.push(Word {
            form: word.child_text("FORM")?.to_string(),
            morphemes,
            glosses: translations(word, lang),
        });
    }
    Ok(Phrase {
        words,
        translation: translations(sentence, lang).into_iter().next(),
    })
}

fn translations(element: &Element, lang: &str) -> Vec<String> {
    element
        .find_all("TRANSL")
        .filter(|transl| transl.attribute(LANG_ATTR) == Some(lang))
        .map(|transl| transl.text().to_string())
        .collect()
}

fn build_igt(number: usize, phrase: &Phrase) -> Igt {
    let phrase_id = format!("p{number}");
    let phrase_text = phrase
        .words
        .iter()
        .map(|word| word.form.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let phrases =
        Tier::new("p", "phrases").with_item(Item::new(&phrase_id).with_text(&phrase_text));
    let mut words = Tier::new("w", "words").with_attribute(SEGMENTATION_ATTR, "p");
    let mut morphemes = Tier::new("m", "morphemes").with_attribute(SEGMENTATION_ATTR, "w");
    let mut glosses = Tier::new("g", "glosses").with_attribute(ALIGNMENT_ATTR, "m");
    let mut translations = Tier::new("t", "translations").with_attribute(ALIGNMENT_ATTR, "p");

    let mut offset = 0;
    for (word_index, word) in phrase.words.iter().enumerate() {
        let word_id = format!("w{}", word_index + 1);
        let len = word.form.chars().count();
        words.push(
            Item::new(&word_id)
                .with_text(&word.form)
                .with_attribute(
                    SEGMENTATION_ATTR,
                    format!("{phrase_id}[{offset}:{}]", offset + len),
                ),
        );
        offset += len + 1;

        if word.morphemes.is_empty() {
            for (gloss_index, gloss) in word.glosses.iter().enumerate() {
                glosses.push(
                    Item::new(format!("g{}.{}", word_index + 1, gloss_index + 1))
                        .with_text(gloss)
                        .with_attribute(ALIGNMENT_ATTR, &word_id),
                );
            }
            continue;
        }

        let mut cursor = 0;
        let mut gloss_number = 0;
        for (morpheme_index, morpheme) in word.morphemes.iter().enumerate() {
            let morpheme_id = format!("m{}.{}", word_index + 1, morpheme_index + 1);
            let mut item = Item::new(&morpheme_id).with_text(&morpheme.form);
            if let Some((start, end)) = locate(&word.form, &morpheme.form, cursor) {
                item.set_attribute(SEGMENTATION_ATTR, format!("{word_id}[{start}:{end}]"));
                cursor = end;
            }
            morphemes.push(item);

            for gloss in &morpheme.glosses {
                gloss_number += 1;
                glosses.push(
                    Item::new(format!("g{}.{gloss_number}", word_index + 1))
                        .with_text(gloss)
                        .with_attribute(ALIGNMENT_ATTR, &morpheme_id),
                );
            }
        }
    }

    if let Some(translation) = &phrase.translation {
        translations.push(
            Item::new("t1")
                .with_text(translation)
                .with_attribute(ALIGNMENT_ATTR, &phrase_id),
        );
    }

    Igt::new(format!("igt{number}"))
        .with_tier(phrases)
        .with_tier(words)
        .with_tier(morphemes)
        .with_tier(glosses)
        .with_tier(translations)
}

/// Finds `morpheme` in `word` at or after char offset `from`.
///
/// Affix markers (`-`, `=`) are ignored. Returns char offsets.
fn locate(word: &str, morpheme: &str, from: usize) -> Option<(usize, usize)> {
    let needle: Vec<char> = morpheme
        .trim_matches(|c: char| c == '-' || c == '=')
        .chars()
        .collect();
    if needle.is_empty() {
        return None;
    }
    let haystack: Vec<char> = word.chars().collect();
    (from..=haystack.len().checked_sub(needle.len())?)
        .find(|&start| haystack[start..start + needle.len()] == needle[..])
        .map(|start| (start, start + needle.len()))
}
