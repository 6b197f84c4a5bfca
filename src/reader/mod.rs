//! Reading documents from text.
//!
//! Tokenizing is delegated to `quick-xml`. Its events are translated into
//! [`ContentHandler`] calls, so the same adapter drives the [`TreeBuilder`]
//! and any user-supplied handler. Comments, processing instructions, and the
//! document type declaration are skipped; CDATA sections arrive as ordinary
//! character data.
//!
//! # Examples
//!
//! ```
//! use xmlarbor::reader::parse_str;
//!
//! let doc = parse_str(r#"<?xml version="1.0" encoding="utf-8"?>
//! <shelf><book id="b1">Dune</book></shelf>"#).unwrap();
//! let shelf = doc.root_element().unwrap();
//! let book = doc.element_by_id(shelf, "b1").unwrap();
//! assert_eq!(doc.text(book).as_deref(), Some("Dune"));
//! assert_eq!(doc.encoding(), "UTF-8");
//! ```

use std::borrow::Cow;
use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::builder::{BuildOptions, TreeBuilder};
use crate::error::{ParseError, SourceLocation, StructuralError};
use crate::sax::ContentHandler;
use crate::tree::Document;

/// Tokenizes `input` and feeds the events to `handler`.
///
/// A leading byte order mark is ignored. `start_document` is sent first and
/// `end_document` last; an empty element produces a start and an end event.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not well-formed at the token level
/// or if the handler rejects an event. In the latter case
/// [`ParseError::structural`] holds the handler's error.
pub fn parse_events(input: &str, handler: &mut dyn ContentHandler) -> Result<(), ParseError> {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    handler
        .start_document()
        .map_err(|err| structural_error(input, 0, err))?;

    loop {
        let offset = position(reader.buffer_position());
        let event = reader
            .read_event()
            .map_err(|err| syntax_error(input, position(reader.error_position()), err))?;

        let delivered = match event {
            Event::Decl(decl) => {
                let version = decl
                    .version()
                    .map_err(|err| syntax_error(input, offset, err))?;
                let encoding = match decl.encoding() {
                    Some(Ok(label)) => Some(String::from_utf8_lossy(&label).into_owned()),
                    Some(Err(err)) => return Err(syntax_error(input, offset, err)),
                    None => None,
                };
                handler.xml_declaration(&String::from_utf8_lossy(&version), encoding.as_deref())
            }
            Event::Start(start) => {
                let (name, attributes) =
                    decode_start(&start).map_err(|err| syntax_error(input, offset, err))?;
                handler.start_element(&name, &attributes)
            }
            Event::Empty(start) => {
                let (name, attributes) =
                    decode_start(&start).map_err(|err| syntax_error(input, offset, err))?;
                handler
                    .start_element(&name, &attributes)
                    .and_then(|()| handler.end_element(&name))
            }
            Event::End(end) => {
                handler.end_element(&String::from_utf8_lossy(end.name().as_ref()))
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| syntax_error(input, offset, err))?;
                handler.characters(&text)
            }
            Event::CData(cdata) => {
                handler.characters(&String::from_utf8_lossy(&cdata.into_inner()))
            }
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => Ok(()),
            Event::Eof => break,
        };
        delivered.map_err(|err| structural_error(input, offset, err))?;
    }

    handler
        .end_document()
        .map_err(|err| structural_error(input, input.len(), err))
}

/// Reads a document with default [`BuildOptions`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is malformed.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &BuildOptions::default())
}

/// Reads a document with the given options.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is malformed.
pub fn parse_str_with_options(input: &str, options: &BuildOptions) -> Result<Document, ParseError> {
    let mut builder = TreeBuilder::with_options(options.clone());
    if let Err(mut err) = parse_events(input, &mut builder) {
        err.diagnostics = builder.document().diagnostics().to_vec();
        return Err(err);
    }
    builder
        .finish()
        .map_err(|err| structural_error(input, input.len(), err))
}

impl Document {
    /// Reads a document from a string with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the input is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlarbor::Document;
    ///
    /// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
    /// let root = doc.root_element().unwrap();
    /// assert_eq!(doc.name(root), Some("root"));
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        parse_str(input)
    }
}

/// Decodes an element name and its attributes.
fn decode_start(start: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>), quick_xml::Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map(Cow::into_owned)?;
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

fn position<P: TryInto<usize>>(raw: P) -> usize {
    raw.try_into().unwrap_or(usize::MAX)
}

fn syntax_error(input: &str, offset: usize, err: impl fmt::Display) -> ParseError {
    ParseError {
        message: err.to_string(),
        location: SourceLocation::locate(input, offset),
        structural: None,
        diagnostics: Vec::new(),
    }
}

fn structural_error(input: &str, offset: usize, err: StructuralError) -> ParseError {
    ParseError {
        message: err.message.clone(),
        location: SourceLocation::locate(input, offset),
        structural: Some(err),
        diagnostics: Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StructuralErrorKind;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ContentHandler for Recorder {
        fn start_document(&mut self) -> Result<(), StructuralError> {
            self.events.push("start-doc".to_string());
            Ok(())
        }

        fn xml_declaration(
            &mut self,
            version: &str,
            encoding: Option<&str>,
        ) -> Result<(), StructuralError> {
            self.events.push(format!("decl {version} {encoding:?}"));
            Ok(())
        }

        fn start_element(
            &mut self,
            name: &str,
            attributes: &[(String, String)],
        ) -> Result<(), StructuralError> {
            self.events.push(format!("start {name} {attributes:?}"));
            Ok(())
        }

        fn characters(&mut self, text: &str) -> Result<(), StructuralError> {
            self.events.push(format!("text {text:?}"));
            Ok(())
        }

        fn end_element(&mut self, name: &str) -> Result<(), StructuralError> {
            self.events.push(format!("end {name}"));
            Ok(())
        }

        fn end_document(&mut self) -> Result<(), StructuralError> {
            self.events.push("end-doc".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_event_sequence() {
        let mut rec = Recorder::default();
        parse_events(
            r#"<?xml version="1.0"?><a k="v&amp;w"><b/>x &lt; y<![CDATA[<raw>]]></a>"#,
            &mut rec,
        )
        .unwrap();
        assert_eq!(
            rec.events,
            vec![
                "start-doc",
                "decl 1.0 None",
                r#"start a [("k", "v&w")]"#,
                "start b []",
                "end b",
                r#"text "x < y""#,
                r#"text "<raw>""#,
                "end a",
                "end-doc",
            ]
        );
    }

    #[test]
    fn test_comments_and_pis_are_skipped() {
        let mut rec = Recorder::default();
        parse_events("<!-- c --><?pi data?><a><!-- inner --></a>", &mut rec).unwrap();
        assert_eq!(rec.events, vec!["start-doc", "start a []", "end a", "end-doc"]);
    }

    #[test]
    fn test_bom_is_ignored() {
        let doc = parse_str("\u{FEFF}<a/>").unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.name(a), Some("a"));
    }

    #[test]
    fn test_declaration_metadata() {
        let doc = parse_str(r#"<?xml version="1.1" encoding="ISO-8859-2"?><a/>"#).unwrap();
        assert_eq!(doc.version(), "1.1");
        assert_eq!(doc.encoding(), "ISO-8859-2");
    }

    #[test]
    fn test_indented_input_has_no_layout_text() {
        let doc = parse_str("<a>\n\t<b>1</b>\n\t<c>2</c>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.children(a).len(), 2);
        assert!(doc.text_nodes(a).next().is_none());
    }

    #[test]
    fn test_layout_text_kept_without_cleanup() {
        let options = BuildOptions::default().clean_whitespace(false);
        let doc = parse_str_with_options("<a>\n\t<b/>\n</a>", &options).unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.children(a).len(), 3);
    }

    #[test]
    fn test_mismatched_end_tag_is_an_error() {
        let err = parse_str("<a><b></a>").unwrap_err();
        assert!(err.location.line >= 1);
    }

    #[test]
    fn test_multiple_roots_is_structural() {
        let err = parse_str("<a/><b/>").unwrap_err();
        assert_eq!(
            err.structural.map(|s| s.kind),
            Some(StructuralErrorKind::MultipleRoots)
        );
    }

    #[test]
    fn test_text_outside_root_is_structural() {
        let err = parse_str("<a/>tail").unwrap_err();
        assert_eq!(
            err.structural.map(|s| s.kind),
            Some(StructuralErrorKind::TextOutsideRoot)
        );
    }

    #[test]
    fn test_empty_input_has_no_root() {
        let err = parse_str("  ").unwrap_err();
        assert_eq!(
            err.structural.map(|s| s.kind),
            Some(StructuralErrorKind::NoRootElement)
        );
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        assert!(parse_str("<a><b>").is_err());
    }

    #[test]
    fn test_error_location_points_into_input() {
        let err = parse_str("<a>\n</a>\n<b/>").unwrap_err();
        assert_eq!(err.location.line, 3);
    }
}
