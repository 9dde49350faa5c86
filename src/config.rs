//! JSON descriptions of specifications and extraction requests
//!
//! ```json
//! {
//!   "specs": [
//!     {"key": "title", "selector": "h1", "nth": 0},
//!     {"key": "links", "selector": "a", "target": "dict", "children": [
//!       {"key": "text", "selector": ".", "nth": 0},
//!       {"key": "domain", "selector": ".", "nth": 0, "extract": "href_domain"}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Typed object targets and closures cannot be described in JSON; named
//! transforms (`trim`, `lowercase`, `uppercase`, `parse_price`) can.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{ExtractError, Result};
use crate::range::Range;
use crate::rule::Rule;
use crate::spec::{Spec, Transform};

/// Target shapes available from JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigShape {
    Dict,
    List,
}

/// A specification as written in JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecConfig {
    pub selector: String,
    #[serde(default)]
    pub range: Range,
    /// Shorthand for a single-element range; overrides `range`
    #[serde(default)]
    pub nth: Option<isize>,
    /// `null` clears the rule
    #[serde(default = "default_rule")]
    pub extract: Option<Rule>,
    #[serde(default)]
    pub children: Vec<SpecConfig>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub target: Option<ConfigShape>,
    #[serde(default)]
    pub transform: Option<String>,
}

fn default_rule() -> Option<Rule> {
    Some(Rule::FullTextClean)
}

impl SpecConfig {
    /// Build and validate the specification tree
    pub fn into_spec(self) -> Result<Spec> {
        let children = self
            .children
            .into_iter()
            .map(SpecConfig::into_spec)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = Spec::new(self.selector)
            .range(self.nth.map_or(self.range, Range::nth))
            .extract_opt(self.extract)
            .children(children);

        if let Some(key) = self.key {
            builder = builder.key(key);
        }
        builder = match self.target {
            Some(ConfigShape::Dict) => builder.into_dict(),
            Some(ConfigShape::List) => builder.into_list(),
            None => builder,
        };
        if let Some(name) = self.transform {
            builder = builder.transform_with(Transform::named(&name)?);
        }

        builder.build()
    }
}

/// Parse a single specification from JSON
pub fn spec_from_json(json: &str) -> Result<Spec> {
    let config: SpecConfig = serde_json::from_str(json)?;
    config.into_spec()
}

/// Several keyed specifications evaluated against one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub specs: Vec<SpecConfig>,
}

/// JSON values keyed by each request spec's `key`, in request order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub values: IndexMap<String, serde_json::Value>,
}

impl ExtractionRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Evaluate every spec of `request` against `html`
///
/// All specs are validated before the document is parsed; any error aborts
/// the whole request.
pub fn extract_request(html: &str, request: &ExtractionRequest) -> Result<ExtractionResult> {
    let specs = request
        .specs
        .iter()
        .enumerate()
        .map(|(i, config)| -> Result<(String, Spec)> {
            let key = config.key.clone().ok_or_else(|| ExtractError::MissingKey {
                selector: "request".to_string(),
                child: format!("#{} ({})", i, config.selector),
                shape: "result",
            })?;
            Ok((key, config.clone().into_spec()?))
        })
        .collect::<Result<Vec<_>>>()?;

    let document = Document::parse(html);
    let mut result = ExtractionResult::default();
    for (key, spec) in specs {
        let value = document.extract(&spec)?;
        result.values.insert(key, value.to_json());
    }
    Ok(result)
}
