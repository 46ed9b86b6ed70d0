//! Importers that build xigt corpora from foreign formats.
//!
//! # Responsibility
//! - Convert external documents into `Corpus` trees using the public model
//!   constructors.
//! - Take input and output locations as explicit parameters.
//!
//! # Invariants
//! - Importers never write partial output: the corpus is fully built before
//!   any file is created.

use crate::codec::CodecError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod pangloss;
mod xml;

pub type ImportResult<T> = Result<T, ImportError>;

/// Errors from reading foreign input and writing the imported corpus.
#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    /// Input is well-formed XML but lacks an element the format requires.
    MissingElement { parent: String, element: &'static str },
    Codec(CodecError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Xml(err) => write!(f, "invalid xml: {err}"),
            Self::MissingElement { parent, element } => {
                write!(f, "<{parent}> is missing required <{element}>")
            }
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::MissingElement { .. } => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<quick_xml::Error> for ImportError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value)
    }
}

impl From<quick_xml::events::attributes::AttrError> for ImportError {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::InvalidAttr(value))
    }
}

impl From<CodecError> for ImportError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}
