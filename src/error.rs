//! Error types for specification building and extraction
//!
//! Soft absence (no match, empty range) is never an error; it is carried as
//! [`Value::Absent`](crate::Value::Absent). Everything here is a
//! configuration or caller error and aborts the whole extraction.

/// Errors raised while building a [`Spec`](crate::Spec) or extracting with it
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The selector string was empty or whitespace
    #[error("Selector must not be empty")]
    EmptySelector,

    /// A range whose start and end are the same index can never select anything
    #[error("Selector '{selector}' has a range starting and ending at index {index}")]
    EqualIndices { selector: String, index: isize },

    /// Some children of a specification carry keys and others do not
    #[error("Children of '{selector}' must all have keys or none; '{child}' has none")]
    PartialKeys { selector: String, child: String },

    /// The selector could not be compiled
    #[error("Failed to parse selector '{selector}': {error}")]
    InvalidSelector { selector: String, error: String },

    /// A leaf specification matched an element but declares no extraction rule
    #[error("No extraction rule for leaf selector '{selector}'")]
    UnsupportedRule { selector: String },

    /// More than one target shape was declared on one specification
    #[error("Selector '{selector}' declares both {first} and {second} targets")]
    ConflictingShapes {
        selector: String,
        first: &'static str,
        second: &'static str,
    },

    /// A target shape needs children to supply its values
    #[error("Selector '{selector}' declares a {shape} target without children")]
    ShapeWithoutChildren { selector: String, shape: &'static str },

    /// A child of a dict or object target has no key
    #[error("Child '{child}' of '{selector}' needs a key to build a {shape}")]
    MissingKey {
        selector: String,
        child: String,
        shape: &'static str,
    },

    /// A child key does not name a field of the target type
    #[error("Unknown parameter '{param}' for {target}")]
    UnknownParameter { target: &'static str, param: String },

    /// A required target field was never bound
    #[error("Missing required parameter '{param}' for {target}")]
    MissingParameter { target: &'static str, param: String },

    /// A bound value could not be converted to the field's type
    #[error("Parameter '{param}' of {target} expected {expected}, found {found}")]
    InvalidParameter {
        target: &'static str,
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An href attribute could not be parsed as a URL
    #[error("Failed to parse href '{href}': {error}")]
    InvalidHref {
        href: String,
        #[source]
        error: url::ParseError,
    },

    /// A JSON specification named a transform that does not exist
    #[error("Unknown transform '{name}'")]
    UnknownTransform { name: String },

    /// A JSON specification or request could not be deserialized
    #[error("Invalid specification config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
