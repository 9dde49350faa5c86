//! Parsed documents and path-queries
//!
//! A path-query is a CSS selector, optionally followed by an accessor:
//!
//! - `a.link` matches elements
//! - `a.link::attr(href)` matches the `href` value of each `a.link`
//! - `p::text` matches the non-blank direct text nodes of each `p`
//! - `.` matches the context element itself, e.g. `.::attr(href)`

use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::engine;
use crate::error::{ExtractError, Result};
use crate::spec::Spec;
use crate::text;
use crate::value::Value;

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// The `<html>` element every top-level query runs against
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Evaluate `spec` against the document root
    ///
    /// Element values in the result borrow from this document; use
    /// [`Value::into_owned`] to detach them.
    pub fn extract(&self, spec: &Spec) -> Result<Value<'_>> {
        engine::evaluate(spec, self.root())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root().value().name())
            .finish()
    }
}

/// One result of running a query against an element
#[derive(Debug, Clone, PartialEq)]
pub enum Matched<'a> {
    Element(ElementRef<'a>),
    /// Attribute or text value selected through an accessor
    Text(String),
}

impl<'a> Matched<'a> {
    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            Matched::Element(element) => Some(*element),
            Matched::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Scope {
    /// The context element itself
    Current,
    Descendants(Selector),
}

#[derive(Debug, Clone, PartialEq)]
enum Accessor {
    Element,
    Text,
    Attr(String),
}

/// A compiled path-query
#[derive(Debug, Clone)]
pub struct Query {
    raw: String,
    scope: Scope,
    accessor: Accessor,
}

impl Query {
    pub fn parse(path: &str) -> Result<Self> {
        let raw = path.trim();
        if raw.is_empty() {
            return Err(ExtractError::EmptySelector);
        }

        let (css, accessor) = split_accessor(raw).ok_or_else(|| ExtractError::InvalidSelector {
            selector: raw.to_string(),
            error: "malformed accessor".to_string(),
        })?;

        let css = css.trim();
        let scope = if css.is_empty() || css == "." {
            Scope::Current
        } else {
            let selector = Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
                selector: raw.to_string(),
                error: e.to_string(),
            })?;
            Scope::Descendants(selector)
        };

        Ok(Self {
            raw: raw.to_string(),
            scope,
            accessor,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Run the query below `node`, in document order
    pub fn run<'a>(&self, node: ElementRef<'a>) -> Vec<Matched<'a>> {
        let elements: Vec<ElementRef<'a>> = match &self.scope {
            Scope::Current => vec![node],
            Scope::Descendants(selector) => node.select(selector).collect(),
        };

        match &self.accessor {
            Accessor::Element => elements.into_iter().map(Matched::Element).collect(),
            Accessor::Attr(name) => elements
                .into_iter()
                .filter_map(|el| el.value().attr(name).map(|v| Matched::Text(v.to_string())))
                .collect(),
            Accessor::Text => elements
                .into_iter()
                .flat_map(text::direct_texts)
                .map(Matched::Text)
                .collect(),
        }
    }
}

// "sel::text" / "sel::attr(name)" / "sel"
fn split_accessor(raw: &str) -> Option<(&str, Accessor)> {
    if let Some(css) = raw.strip_suffix("::text") {
        return Some((css, Accessor::Text));
    }
    if let Some(pos) = raw.rfind("::attr(") {
        let name = raw[pos + "::attr(".len()..].strip_suffix(')')?.trim();
        if name.is_empty() {
            return None;
        }
        return Some((&raw[..pos], Accessor::Attr(name.to_string())));
    }
    Some((raw, Accessor::Element))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
    <html>
    <body>
        <ul class="menu">
            <li class="item"><a href="/home" title="Home page">Home</a></li>
            <li class="item"><a href="/about">About</a> us</li>
            <li class="item"><span>Contact</span></li>
        </ul>
    </body>
    </html>
    "#;

    #[test]
    fn test_element_query() {
        let doc = Document::parse(HTML);
        let query = Query::parse("li.item").unwrap();

        let matched = query.run(doc.root());
        assert_eq!(matched.len(), 3);
        assert!(matched.iter().all(|m| m.as_element().is_some()));
    }

    #[test]
    fn test_attr_query_skips_missing() {
        let doc = Document::parse(HTML);
        let query = Query::parse("a::attr(href)").unwrap();
        assert_eq!(
            query.run(doc.root()),
            vec![
                Matched::Text("/home".to_string()),
                Matched::Text("/about".to_string())
            ]
        );

        let query = Query::parse("a::attr(title)").unwrap();
        assert_eq!(query.run(doc.root()), vec![Matched::Text("Home page".to_string())]);
    }

    #[test]
    fn test_text_query() {
        let doc = Document::parse(HTML);
        let query = Query::parse("li::text").unwrap();
        assert_eq!(query.run(doc.root()), vec![Matched::Text(" us".to_string())]);
    }

    #[test]
    fn test_self_query() {
        let doc = Document::parse(HTML);
        let link = Query::parse("a").unwrap().run(doc.root())[0]
            .as_element()
            .unwrap();

        let query = Query::parse(".::attr(href)").unwrap();
        assert_eq!(query.run(link), vec![Matched::Text("/home".to_string())]);

        let query = Query::parse(".").unwrap();
        assert_eq!(query.run(link), vec![Matched::Element(link)]);
    }

    #[test]
    fn test_invalid_queries() {
        assert!(matches!(Query::parse("  "), Err(ExtractError::EmptySelector)));
        assert!(matches!(
            Query::parse("div[["),
            Err(ExtractError::InvalidSelector { .. })
        ));
        assert!(matches!(
            Query::parse("a::attr()"),
            Err(ExtractError::InvalidSelector { .. })
        ));
    }
}
