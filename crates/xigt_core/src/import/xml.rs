//! Minimal owned XML element tree built from `quick-xml` events.

use crate::import::{ImportError, ImportResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Text of the first `name` child, or `MissingElement`.
    pub fn child_text(&self, name: &'static str) -> ImportResult<&str> {
        self.find(name)
            .map(Element::text)
            .ok_or_else(|| ImportError::MissingElement {
                parent: self.name.clone(),
                element: name,
            })
    }
}

/// Parses `input` into its root element.
pub(crate) fn parse(input: &str) -> ImportResult<Element> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(ImportError::MissingElement {
        parent: "document".to_string(),
        element: "root",
    })
}

fn element_from(start: &BytesStart<'_>) -> ImportResult<Element> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::import::ImportError;

    #[test]
    fn builds_nested_elements_with_attributes() {
        let root = parse(
            r#"<?xml version="1.0"?>
            <TEXT id="t1"><S id="s1"><FORM>a &amp; b</FORM><AUDIO start="0"/></S></TEXT>"#,
        )
        .unwrap();

        assert_eq!(root.name, "TEXT");
        assert_eq!(root.attribute("id"), Some("t1"));
        let sentence = root.find("S").unwrap();
        assert_eq!(sentence.child_text("FORM").unwrap(), "a & b");
        assert_eq!(sentence.find("AUDIO").and_then(|a| a.attribute("start")), Some("0"));
    }

    #[test]
    fn reports_mismatched_tags() {
        let err = parse("<TEXT><S></TEXT>").unwrap_err();
        assert!(matches!(err, ImportError::Xml(_)));
    }

    #[test]
    fn child_text_reports_missing_element() {
        let root = parse("<W><M/></W>").unwrap();
        let err = root.child_text("FORM").unwrap_err();
        assert_eq!(err.to_string(), "<W> is missing required <FORM>");
    }
}
