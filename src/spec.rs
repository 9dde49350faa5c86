//! Specification trees
//!
//! A [`Spec`] says what to match, which matches to keep, how to turn them into
//! values and how to shape the result. Specs are built once, validated by
//! [`SpecBuilder::build`], and can then be shared across threads and
//! documents: they hold no per-extraction state.
//!
//! ```ignore
//! use moss_parser::{extract, Range, Rule, Spec};
//!
//! let links = Spec::new("a")
//!     .into_dict()
//!     .child(Spec::new(".").key("text").range(Range::first()).build()?)
//!     .child(Spec::new(".").key("domain").range(Range::first()).extract(Rule::HrefDomain).build()?)
//!     .build()?;
//!
//! let value = extract(&links, html)?;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::document::Query;
use crate::error::{ExtractError, Result};
use crate::range::Range;
use crate::rule::Rule;
use crate::target::{Constructor, Target};
use crate::value::Value;

/// How a specification with children assembles each selected node
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Ordered map of child key to child value
    Dict,
    /// Child values in declaration order
    List,
    /// A typed [`Target`] built from the child values
    Object(Constructor),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Dict => "dict",
            Shape::List => "list",
            Shape::Object(_) => "object",
        }
    }
}

type TransformFn = dyn for<'a> Fn(Value<'a>) -> Value<'a> + Send + Sync;

/// Function applied once to a specification's final value
#[derive(Clone)]
pub struct Transform(Arc<TransformFn>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(Value<'a>) -> Value<'a> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Transform that maps every text leaf with `f`
    pub fn text<F>(f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        Self::new(move |value| value.map_text(&f))
    }

    /// Built-in transforms addressable by name from JSON specifications
    pub fn named(name: &str) -> Result<Self> {
        let transform = match name {
            "trim" => Self::text(|s| s.trim().to_string()),
            "lowercase" => Self::text(|s| s.to_lowercase()),
            "uppercase" => Self::text(|s| s.to_uppercase()),
            "parse_price" => Self::new(|value| match value {
                Value::Text(text) => parse_price(&text).map_or(Value::Absent, Value::Text),
                Value::List(items) => Value::List(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Value::Text(text) => parse_price(&text).map_or(Value::Absent, Value::Text),
                            other => other,
                        })
                        .collect(),
                ),
                other => other,
            }),
            _ => {
                return Err(ExtractError::UnknownTransform {
                    name: name.to_string(),
                })
            }
        };
        Ok(transform)
    }

    pub fn apply<'a>(&self, value: Value<'a>) -> Value<'a> {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform")
    }
}

// First number in `text`: "€12,99" -> "12.99", "1,234.56" -> "1234.56".
// The last separator is the decimal point unless exactly three digits follow
// it, in which case it groups thousands ("1.234" -> "1234").
fn parse_price(text: &str) -> Option<String> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let number = text[start..]
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .next()?
        .trim_end_matches(['.', ',']);

    let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
    match number.rfind(['.', ',']) {
        Some(pos) if number.len() - pos - 1 != 3 => {
            Some(format!("{}.{}", digits(&number[..pos]), &number[pos + 1..]))
        }
        _ => Some(digits(number)),
    }
}

/// One node of a specification tree
#[derive(Debug, Clone)]
pub struct Spec {
    query: Query,
    range: Range,
    extract: Option<Rule>,
    children: Vec<Spec>,
    shape: Option<Shape>,
    key: Option<String>,
    transform: Option<Transform>,
}

impl Spec {
    /// Start a specification for `selector`
    ///
    /// Defaults: every match as a list, [`Rule::FullTextClean`], no children,
    /// no shape, identity transform.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(selector: impl Into<String>) -> SpecBuilder {
        SpecBuilder {
            selector: selector.into(),
            range: Range::default(),
            extract: Some(Rule::FullTextClean),
            children: Vec::new(),
            shapes: Vec::new(),
            key: None,
            transform: None,
        }
    }

    pub fn selector(&self) -> &str {
        self.query.as_str()
    }

    pub(crate) fn query(&self) -> &Query {
        &self.query
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.extract.as_ref()
    }

    pub fn children(&self) -> &[Spec] {
        &self.children
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Apply the transform, if any
    pub fn finish<'a>(&self, value: Value<'a>) -> Value<'a> {
        match &self.transform {
            Some(transform) => transform.apply(value),
            None => value,
        }
    }
}

/// Builder returned by [`Spec::new`]
#[derive(Debug)]
pub struct SpecBuilder {
    selector: String,
    range: Range,
    extract: Option<Rule>,
    children: Vec<Spec>,
    shapes: Vec<Shape>,
    key: Option<String>,
    transform: Option<Transform>,
}

impl SpecBuilder {
    pub fn range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    /// Shorthand for `range(Range::nth(index))`
    pub fn nth(self, index: isize) -> Self {
        self.range(Range::nth(index))
    }

    pub fn extract(mut self, rule: impl Into<Rule>) -> Self {
        self.extract = Some(rule.into());
        self
    }

    /// Clear the extraction rule; leaf evaluation against elements then fails
    pub fn no_extract(mut self) -> Self {
        self.extract = None;
        self
    }

    pub(crate) fn extract_opt(mut self, rule: Option<Rule>) -> Self {
        self.extract = rule;
        self
    }

    pub fn child(mut self, child: Spec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Spec>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn into_dict(mut self) -> Self {
        self.shapes.push(Shape::Dict);
        self
    }

    pub fn into_list(mut self) -> Self {
        self.shapes.push(Shape::List);
        self
    }

    pub fn into_object<T: Target>(mut self) -> Self {
        self.shapes.push(Shape::Object(Constructor::of::<T>()));
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(Value<'a>) -> Value<'a> + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }

    pub fn transform_with(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Validate and freeze the specification
    pub fn build(self) -> Result<Spec> {
        let query = Query::parse(&self.selector)?;
        let selector = query.as_str().to_string();

        let shape = match self.shapes.as_slice() {
            [] => None,
            [shape] => Some(*shape),
            [first, second, ..] => {
                return Err(ExtractError::ConflictingShapes {
                    selector,
                    first: first.name(),
                    second: second.name(),
                })
            }
        };

        if self.range.end_idx == Some(self.range.start_idx) {
            return Err(ExtractError::EqualIndices {
                selector,
                index: self.range.start_idx,
            });
        }

        validate_keys(&selector, &self.children)?;
        if let Some(shape) = &shape {
            validate_shape(&selector, shape, &self.children)?;
        }

        Ok(Spec {
            query,
            range: self.range,
            extract: self.extract,
            children: self.children,
            shape,
            key: self.key,
            transform: self.transform,
        })
    }
}

fn validate_keys(selector: &str, children: &[Spec]) -> Result<()> {
    if !children.iter().any(|c| c.key().is_some()) {
        return Ok(());
    }
    match children.iter().find(|c| c.key().is_none()) {
        Some(unkeyed) => Err(ExtractError::PartialKeys {
            selector: selector.to_string(),
            child: unkeyed.selector().to_string(),
        }),
        None => Ok(()),
    }
}

fn validate_shape(selector: &str, shape: &Shape, children: &[Spec]) -> Result<()> {
    if children.is_empty() {
        return Err(ExtractError::ShapeWithoutChildren {
            selector: selector.to_string(),
            shape: shape.name(),
        });
    }
    if matches!(shape, Shape::List) {
        return Ok(());
    }

    for child in children {
        let Some(key) = child.key() else {
            return Err(ExtractError::MissingKey {
                selector: selector.to_string(),
                child: child.selector().to_string(),
                shape: shape.name(),
            });
        };
        if let Shape::Object(constructor) = shape {
            if !constructor.has_field(key) {
                return Err(ExtractError::UnknownParameter {
                    target: constructor.type_name(),
                    param: key.to_string(),
                });
            }
        }
    }
    Ok(())
}
