//! Extraction results

use indexmap::IndexMap;
use scraper::ElementRef;

use crate::fragment::Fragment;
use crate::target::Object;

/// The result of evaluating a specification
///
/// `Absent` is the soft "nothing here" result: no match, an empty range, or a
/// missing attribute. Element values borrow from the parsed document.
#[derive(Debug, Clone, Default)]
pub enum Value<'a> {
    #[default]
    Absent,
    Bool(bool),
    Text(String),
    Element(ElementRef<'a>),
    Fragment(Fragment),
    List(Vec<Value<'a>>),
    Map(IndexMap<String, Value<'a>>),
    Object(Object),
}

impl<'a> Value<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Element(_) => "element",
            Value::Fragment(_) => "fragment",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            Value::Element(element) => Some(*element),
            _ => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&Fragment> {
        match self {
            Value::Fragment(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value<'a>>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the target instance if this value holds a `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object()?.downcast_ref()
    }

    /// Detach the value from its document
    ///
    /// Borrowed elements become owned [`Fragment`]s; everything else is moved.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Absent => Value::Absent,
            Value::Bool(b) => Value::Bool(b),
            Value::Text(text) => Value::Text(text),
            Value::Element(element) => Value::Fragment(Fragment::from_element(element)),
            Value::Fragment(fragment) => Value::Fragment(fragment),
            Value::List(items) => Value::List(items.into_iter().map(Value::into_owned).collect()),
            Value::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, value.into_owned()))
                    .collect(),
            ),
            Value::Object(object) => Value::Object(object),
        }
    }

    /// Apply `f` to every text leaf, descending into lists and maps
    pub fn map_text(self, f: &impl Fn(String) -> String) -> Value<'a> {
        match self {
            Value::Text(text) => Value::Text(f(text)),
            Value::List(items) => Value::List(items.into_iter().map(|v| v.map_text(f)).collect()),
            Value::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, value.map_text(f)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// JSON view of the value; elements and fragments become their markup
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Absent => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Text(text) => Json::String(text.clone()),
            Value::Element(element) => Json::String(element.html()),
            Value::Fragment(fragment) => Json::String(fragment.html()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Object(object) => object.to_json(),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Element(a), Value::Element(b)) => a == b,
            (Value::Fragment(a), Value::Fragment(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value<'_> {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value<'_> {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<'a, T: Into<Value<'a>>> From<Vec<T>> for Value<'a> {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Absent, Into::into)
    }
}
