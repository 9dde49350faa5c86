//! Extraction rules: how a matched element becomes a leaf value

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::document::Matched;
use crate::error::{ExtractError, Result};
use crate::fragment::Fragment;
use crate::text;
use crate::urls::Href;
use crate::value::Value;

/// Leaf extraction strategy
///
/// In JSON, unit rules are written by name (`"href_domain"`) and attribute
/// reads as `{"attr": "data-id"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// The element itself
    Raw,
    /// `true` when the selector matched
    Found,
    /// Text before the first child element, trimmed
    Text,
    /// All descendant text, trimmed
    FullText,
    /// All descendant text with whitespace normalized
    FullTextClean,
    /// Owned copy of the element's sub-tree
    Fragment,
    /// The sub-tree rendered as indented markup
    FragmentString,
    Href,
    HrefQuery,
    HrefDomain,
    HrefBaseDomain,
    HrefEndpoint,
    HrefEndpointWithQuery,
    HrefQueryParams,
    /// Value of the named attribute
    Attr(String),
}

impl From<&str> for Rule {
    fn from(attr: &str) -> Self {
        Rule::Attr(attr.to_string())
    }
}

impl From<String> for Rule {
    fn from(attr: String) -> Self {
        Rule::Attr(attr)
    }
}

/// Turn one matched node into a value
///
/// Text matches (from `::text` / `::attr(..)` queries) are already leaf values
/// and are returned unchanged whatever the rule. An element with no rule is an
/// [`ExtractError::UnsupportedRule`].
pub fn interpret<'a>(rule: Option<&Rule>, matched: Matched<'a>, selector: &str) -> Result<Value<'a>> {
    let element = match matched {
        Matched::Text(text) => return Ok(Value::Text(text)),
        Matched::Element(element) => element,
    };

    let Some(rule) = rule else {
        return Err(ExtractError::UnsupportedRule {
            selector: selector.to_string(),
        });
    };
    trace!(selector, ?rule, element = element.value().name(), "Applying rule");

    let href = || element.value().attr("href").map(Href::parse).transpose();

    let value = match rule {
        Rule::Raw => Value::Element(element),
        Rule::Found => Value::Bool(true),
        Rule::Text => Value::Text(text::leading_text(element).trim().to_string()),
        Rule::FullText => Value::Text(text::full_text(element).trim().to_string()),
        Rule::FullTextClean => Value::Text(text::clean_text(&text::full_text(element))),
        Rule::Fragment => Value::Fragment(Fragment::from_element(element)),
        Rule::FragmentString => Value::Text(Fragment::from_element(element).render()),
        Rule::Href => element.value().attr("href").into(),
        Rule::HrefQuery => href()?.map(|h| h.query().to_string()).into(),
        Rule::HrefDomain => href()?.and_then(|h| h.domain()).into(),
        Rule::HrefBaseDomain => href()?.and_then(|h| h.base_domain()).into(),
        Rule::HrefEndpoint => href()?.map(|h| h.endpoint().to_string()).into(),
        Rule::HrefEndpointWithQuery => href()?.map(|h| h.endpoint_with_query()).into(),
        Rule::HrefQueryParams => match href()? {
            Some(h) => Value::Map(
                h.query_params()
                    .into_iter()
                    .map(|(key, values)| (key, Value::from(values)))
                    .collect(),
            ),
            None => Value::Absent,
        },
        Rule::Attr(name) => element.value().attr(name).into(),
    };
    Ok(value)
}
