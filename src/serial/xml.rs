//! XML serializer.
//!
//! Produces the canonical text form of a `Document`. Layout rules:
//!
//! - An element with no children is written as an empty tag (`<a/>`).
//! - An element's opening tag goes on a new, indented line unless the
//!   sibling just before it is a text node, so mixed content stays inline.
//! - The closing tag goes on its own line unless the last child is text.
//! - The id is written first, then the other attributes sorted by name.
//! - Newlines inside text are re-indented one level deeper than the
//!   enclosing element, and a trailing indent-only line is pulled back to
//!   the element's level.

use std::borrow::Cow;

use crate::tree::{Document, ElementData, NodeId, NodeKind};

const DEFAULT_INDENT: &str = "\t";

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use xmlarbor::Document;
/// use xmlarbor::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let opts = SerializeOptions::default().declaration(false).indent_str("  ");
/// let xml = serialize_with_options(&doc, &opts);
/// assert_eq!(xml, "<root>\n  <child>Hello</child>\n</root>");
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to write the `<?xml ...?>` prolog. Defaults to `true`.
    pub declaration: bool,
    /// The string written once per nesting level. Defaults to one tab.
    pub indent_str: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            declaration: true,
            indent_str: DEFAULT_INDENT.to_string(),
        }
    }
}

impl SerializeOptions {
    /// Enables or disables the XML declaration.
    #[must_use]
    pub fn declaration(mut self, yes: bool) -> Self {
        self.declaration = yes;
        self
    }

    /// Sets the indentation string used for each nesting level.
    ///
    /// Only the default tab reads back without layout text; the reader
    /// strips tabs from character data but keeps other whitespace.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    fn is_default_layout(&self) -> bool {
        self.indent_str == DEFAULT_INDENT
    }
}

/// Serializes a document to an XML string.
///
/// # Examples
///
/// ```
/// use xmlarbor::Document;
/// use xmlarbor::serial::serialize;
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// assert_eq!(
///     serialize(&doc),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n\t<child>Hello</child>\n</root>"
/// );
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string with the given options.
///
/// A document without a root element produces only the prolog (or nothing
/// when the declaration is disabled).
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut out = String::new();
    if options.declaration {
        out.push_str("<?xml version=\"");
        out.push_str(&escape(doc.version()));
        out.push_str("\" encoding=\"");
        out.push_str(&escape(doc.encoding()));
        out.push_str("\"?>");
    }

    let Some(root) = doc.root_element() else {
        return out;
    };
    let Some(data) = doc.element(root) else {
        return out;
    };
    if options.declaration {
        out.push('\n');
    }
    match data.rendered.as_deref() {
        Some(cached) if options.is_default_layout() => out.push_str(cached),
        _ => write_element(doc, data, &mut out, options, 0, false),
    }
    out
}

/// Serializes a single node as a fragment, without prolog or leading
/// newline. The node is laid out as if it were at nesting level zero.
///
/// # Examples
///
/// ```
/// use xmlarbor::Document;
/// use xmlarbor::serial::{serialize_node, SerializeOptions};
///
/// let doc = Document::parse_str("<a><b k='v'>x &amp; y</b></a>").unwrap();
/// let b = doc.element_by_name(doc.root_element().unwrap(), "b").unwrap();
/// let text = serialize_node(&doc, b, &SerializeOptions::default());
/// assert_eq!(text, r#"<b k="v">x &amp; y</b>"#);
/// ```
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::new();
    match &doc.node(id).kind {
        NodeKind::Element(data) => write_element(doc, data, &mut out, options, 0, false),
        NodeKind::Text(data) => {
            write_text(&mut out, data.text().unwrap_or_default(), options, 0);
        }
    }
    out
}

/// Escapes the five reserved XML characters.
///
/// Returns the input unchanged (borrowed) when nothing needs escaping.
///
/// # Examples
///
/// ```
/// use xmlarbor::serial::escape;
///
/// assert_eq!(escape(r#"<a href="x">'&'</a>"#),
///     "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
/// assert!(matches!(escape("plain"), std::borrow::Cow::Borrowed(_)));
/// ```
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

impl Document {
    /// Returns the fragment rendering of an element, memoized.
    ///
    /// The rendering uses the default layout and is cached on the element.
    /// Any mutation of the element or its subtree clears the cache on it
    /// and on every ancestor. Returns `None` for text nodes.
    pub fn render(&mut self, id: NodeId) -> Option<&str> {
        if self.element(id)?.rendered.is_none() {
            tracing::trace!(?id, "rendering element");
            let text = serialize_node(self, id, &SerializeOptions::default());
            self.element_mut(id)?.rendered = Some(text);
        }
        self.element(id)?.rendered.as_deref()
    }
}

fn push_indent(out: &mut String, options: &SerializeOptions, depth: usize) {
    for _ in 0..depth {
        out.push_str(&options.indent_str);
    }
}

fn write_element(
    doc: &Document,
    data: &ElementData,
    out: &mut String,
    options: &SerializeOptions,
    depth: usize,
    new_line: bool,
) {
    if new_line {
        out.push('\n');
        push_indent(out, options, depth);
    }

    out.push('<');
    out.push_str(data.name());
    if let Some(id) = data.id() {
        out.push_str(" id=\"");
        out.push_str(&escape(id));
        out.push('"');
    }
    for (key, value) in data.attributes() {
        out.push(' ');
        out.push_str(&escape(key));
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }

    if data.children().is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let mut last_was_text = false;
    for &child in data.children() {
        match &doc.node(child).kind {
            NodeKind::Text(text) => {
                write_text(out, text.text().unwrap_or_default(), options, depth);
                last_was_text = true;
            }
            NodeKind::Element(element) => {
                write_element(doc, element, out, options, depth + 1, !last_was_text);
                last_was_text = false;
            }
        }
    }

    if !last_was_text {
        out.push('\n');
        push_indent(out, options, depth);
    }
    out.push_str("</");
    out.push_str(data.name());
    out.push('>');
}

fn write_text(out: &mut String, text: &str, options: &SerializeOptions, depth: usize) {
    if text.is_empty() {
        return;
    }
    let escaped = escape(text);
    if !escaped.contains('\n') {
        out.push_str(&escaped);
        return;
    }

    let mut outer = String::from("\n");
    push_indent(&mut outer, options, depth);
    let inner = format!("{outer}{}", options.indent_str);

    let mut printed = escaped.replace('\n', &inner);
    if printed.ends_with(&inner) {
        printed.truncate(printed.len() - inner.len());
        printed.push_str(&outer);
    }
    out.push_str(&printed);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

    fn no_decl() -> SerializeOptions {
        SerializeOptions::default().declaration(false)
    }

    #[test]
    fn test_serialize_empty_element() {
        let mut doc = Document::new();
        let br = doc.create_element("br").unwrap();
        doc.set_root_element(br).unwrap();
        assert_eq!(serialize(&doc), format!("{PROLOG}\n<br/>"));
    }

    #[test]
    fn test_serialize_without_root() {
        let doc = Document::new();
        assert_eq!(serialize(&doc), PROLOG);
        assert_eq!(serialize_with_options(&doc, &no_decl()), "");
    }

    #[test]
    fn test_serialize_prolog_uses_metadata() {
        let mut doc = Document::new();
        doc.set_version("1.1");
        doc.set_encoding("latin2").unwrap();
        let r = doc.create_element("r").unwrap();
        doc.set_root_element(r).unwrap();
        assert_eq!(
            serialize(&doc),
            "<?xml version=\"1.1\" encoding=\"ISO-8859-2\"?>\n<r/>"
        );
    }

    #[test]
    fn test_id_first_then_sorted_attributes() {
        let mut doc = Document::new();
        let el = doc
            .create_element_with("div", Some("main"), [("zeta", "1"), ("alpha", "2")])
            .unwrap();
        doc.set_root_element(el).unwrap();
        assert_eq!(
            serialize_with_options(&doc, &no_decl()),
            r#"<div id="main" alpha="2" zeta="1"/>"#
        );
    }

    #[test]
    fn test_attribute_and_text_escaping() {
        let mut doc = Document::new();
        let el = doc
            .create_element_with("a", None, [("title", "He said \"hi\" & <bye>")])
            .unwrap();
        let t = doc.create_text("a < b & c > 'd'");
        doc.append_child(el, t).unwrap();
        doc.set_root_element(el).unwrap();
        assert_eq!(
            serialize_with_options(&doc, &no_decl()),
            "<a title=\"He said &quot;hi&quot; &amp; &lt;bye&gt;\">\
             a &lt; b &amp; c &gt; &apos;d&apos;</a>"
        );
    }

    #[test]
    fn test_nested_elements_are_indented() {
        let doc = Document::parse_str("<root><child><inner>text</inner></child><leaf/></root>")
            .unwrap();
        assert_eq!(
            serialize(&doc),
            format!(
                "{PROLOG}\n<root>\n\t<child>\n\t\t<inner>text</inner>\n\t</child>\n\t<leaf/>\n</root>"
            )
        );
    }

    #[test]
    fn test_mixed_content_stays_inline() {
        let doc = Document::parse_str("<p>Hello <b>big</b> world</p>").unwrap();
        assert_eq!(
            serialize_with_options(&doc, &no_decl()),
            "<p>Hello <b>big</b> world</p>"
        );
    }

    #[test]
    fn test_element_after_element_in_mixed_content() {
        let doc = Document::parse_str("<p>lead<b/><i/></p>").unwrap();
        assert_eq!(
            serialize_with_options(&doc, &no_decl()),
            "<p>lead<b/>\n\t<i/>\n</p>"
        );
    }

    #[test]
    fn test_text_newlines_are_reindented() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let note = doc.create_element("note").unwrap();
        let t = doc.create_text("line one\nline two\n");
        doc.append_child(note, t).unwrap();
        doc.append_child(root, note).unwrap();
        doc.set_root_element(root).unwrap();
        assert_eq!(
            serialize_with_options(&doc, &no_decl()),
            "<root>\n\t<note>line one\n\t\tline two\n\t</note>\n</root>"
        );
    }

    #[test]
    fn test_empty_text_writes_nothing() {
        let mut doc = Document::new();
        let a = doc.create_element("a").unwrap();
        let t = doc.create_empty_text();
        doc.append_child(a, t).unwrap();
        doc.set_root_element(a).unwrap();
        assert_eq!(serialize_with_options(&doc, &no_decl()), "<a></a>");
    }

    #[test]
    fn test_custom_indent() {
        let doc = Document::parse_str("<a><b><c/></b></a>").unwrap();
        let opts = no_decl().indent_str("  ");
        assert_eq!(
            serialize_with_options(&doc, &opts),
            "<a>\n  <b>\n    <c/>\n  </b>\n</a>"
        );
    }

    #[test]
    fn test_serialize_node_fragment() {
        let doc = Document::parse_str("<a><b><c/></b></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.element_by_name(a, "b").unwrap();
        assert_eq!(
            serialize_node(&doc, b, &SerializeOptions::default()),
            "<b>\n\t<c/>\n</b>"
        );
    }

    #[test]
    fn test_render_is_cached_and_invalidated() {
        let mut doc = Document::parse_str("<a><b/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.element_by_name(a, "b").unwrap();

        assert_eq!(doc.render(a), Some("<a>\n\t<b/>\n</a>"));
        assert!(doc.element(a).unwrap().rendered.is_some());

        doc.set_attribute(b, "k", "v").unwrap();
        assert!(doc.element(a).unwrap().rendered.is_none());
        assert_eq!(doc.render(a), Some("<a>\n\t<b k=\"v\"/>\n</a>"));
        assert_eq!(
            serialize(&doc),
            format!("{PROLOG}\n<a>\n\t<b k=\"v\"/>\n</a>")
        );
    }

    #[test]
    fn test_render_text_node_is_none() {
        let mut doc = Document::new();
        let t = doc.create_text("x");
        assert_eq!(doc.render(t), None);
    }

    #[test]
    fn test_reserialize_is_stable() {
        let input = "<catalog><book id='b1' lang='en'>Title &amp; more<note>n</note></book>\
                     <book id='b2'/></catalog>";
        let first = serialize(&Document::parse_str(input).unwrap());
        let second = serialize(&Document::parse_str(&first).unwrap());
        assert_eq!(first, second);
    }
}
