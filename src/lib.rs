//! Declarative HTML extraction
//!
//! Describe what to pull out of a page as a tree of [`Spec`]s and evaluate it
//! against markup:
//! - path queries (CSS selectors, `::text`, `::attr(name)`, `.` for the context node)
//! - Python-style ranges over the matches
//! - leaf rules for text, markup fragments, attributes and link components
//! - results shaped as lists, ordered maps or typed [`Target`] objects
//! - JSON-described requests and a C ABI (see [`ffi`])

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod fragment;
pub mod range;
pub mod rule;
pub mod spec;
pub mod target;
pub mod text;
pub mod urls;
pub mod value;

pub use config::{extract_request, spec_from_json, ExtractionRequest, ExtractionResult, SpecConfig};
pub use document::{Document, Matched, Query};
pub use error::{ExtractError, Result};
pub use ffi::*;
pub use fragment::Fragment;
pub use range::Range;
pub use rule::Rule;
pub use spec::{Shape, Spec, SpecBuilder, Transform};
pub use target::{Arguments, Constructor, Field, FromValue, Object, Tag, Target};
pub use urls::Href;
pub use value::Value;

/// Parse `markup` and evaluate `spec` against it
///
/// Elements in the result are detached into [`Fragment`]s so the value can
/// outlive the parsed document.
pub fn extract(spec: &Spec, markup: &str) -> Result<Value<'static>> {
    Document::parse(markup).extract(spec).map(Value::into_owned)
}
