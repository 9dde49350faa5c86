//! Owned HTML sub-trees
//!
//! A [`Fragment`] is an element re-parsed into its own tree. It outlives the
//! [`Document`](crate::Document) it came from and can be rendered back to
//! indented markup with [`Fragment::render`].

use std::fmt;
use std::rc::Rc;

use scraper::{ElementRef, Html, Node};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Clone)]
pub struct Fragment {
    html: Rc<Html>,
}

impl Fragment {
    /// Copy an element and its descendants into a standalone tree
    ///
    /// The copy is re-parsed in a `<body>` context, so some elements lose
    /// their own tags and keep only their contents:
    /// - `html`, `head` and `body`, which a fragment cannot contain
    /// - elements that only parse inside a table (`tr`, `td`, ...)
    pub fn from_element(element: ElementRef<'_>) -> Self {
        Self::parse(&element.html())
    }

    pub fn parse(markup: &str) -> Self {
        Self {
            html: Rc::new(Html::parse_fragment(markup)),
        }
    }

    /// The first top-level element of the fragment
    pub fn element(&self) -> Option<ElementRef<'_>> {
        self.html.root_element().children().find_map(ElementRef::wrap)
    }

    /// Compact markup of the fragment
    pub fn html(&self) -> String {
        self.html.root_element().inner_html()
    }

    /// Markup with one node per line, indented by depth
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_children(self.html.root_element(), 0, &mut out);
        out
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.html, &other.html) || self.html() == other.html()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fragment").field(&self.html()).finish()
    }
}

fn render_children(parent: ElementRef<'_>, depth: usize, out: &mut String) {
    let raw = RAW_TEXT_ELEMENTS.contains(&parent.value().name());
    for node in parent.children() {
        match node.value() {
            Node::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                indent(depth, out);
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
                out.push('\n');
            }
            Node::Comment(comment) => {
                indent(depth, out);
                out.push_str("<!--");
                out.push_str(&comment.comment);
                out.push_str("-->\n");
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(node) {
                    render_element(child, depth, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, depth: usize, out: &mut String) {
    let name = element.value().name();

    indent(depth, out);
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push_str(">\n");

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    render_children(element, depth + 1, out);

    indent(depth, out);
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

fn indent(depth: usize, out: &mut String) {
    out.extend(std::iter::repeat(' ').take(depth));
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_indents_nodes() {
        let fragment = Fragment::parse(
            r#"<div class="box">Hi <b>there</b><br><a href="/x?a=1&amp;b=2">go</a></div>"#,
        );

        let expected = "<div class=\"box\">\n Hi\n <b>\n  there\n </b>\n <br>\n <a href=\"/x?a=1&amp;b=2\">\n  go\n </a>\n</div>\n";
        assert_eq!(fragment.render(), expected);
    }

    #[test]
    fn test_document_roots_are_unwrapped() {
        let document = Html::parse_document("<html><body><p>one</p><p>two</p></body></html>");

        let body = document
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "body")
            .unwrap();
        let fragment = Fragment::from_element(body);
        assert_eq!(fragment.element().unwrap().value().name(), "p");
        assert_eq!(fragment.html(), "<p>one</p><p>two</p>");

        let fragment = Fragment::from_element(document.root_element());
        assert!(fragment.render().starts_with("<p>\n one\n</p>\n"));
    }

    #[test]
    fn test_element_and_html() {
        let fragment = Fragment::parse("<p>one</p><p>two</p>");

        assert_eq!(fragment.element().unwrap().value().name(), "p");
        assert_eq!(fragment.html(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_render_round_trips_text() {
        let fragment = Fragment::parse("<ul><li>a &lt; b</li><li><!-- note -->c</li></ul>");
        let rendered = fragment.render();
        let reparsed = Fragment::parse(&rendered);

        let texts: Vec<String> = reparsed
            .element()
            .unwrap()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        assert_eq!(texts, vec!["a < b", "c"]);
    }
}
