//! Typed targets built from child extraction results
//!
//! A target type describes its constructor parameters through
//! [`Target::FIELDS`] and builds itself from the bound [`Arguments`]. A child
//! whose result is absent is left unbound when its field has a default, so
//! `build` can fall back to that default.
//!
//! ```ignore
//! use moss_parser::{Arguments, ExtractError, Field, Target};
//!
//! #[derive(Debug, Clone, serde::Serialize)]
//! struct Link {
//!     text: String,
//!     href: Option<String>,
//!     rel: String,
//! }
//!
//! impl Target for Link {
//!     const FIELDS: &'static [Field] = &[
//!         Field::required("text"),
//!         Field::required("href"),
//!         Field::optional("rel"),
//!     ];
//!
//!     fn build(mut args: Arguments) -> Result<Self, ExtractError> {
//!         Ok(Self {
//!             text: args.required("text")?,
//!             href: args.required("href")?,
//!             rel: args.optional("rel")?.unwrap_or_else(|| "follow".to_string()),
//!         })
//!     }
//! }
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use indexmap::IndexMap;
use scraper::ElementRef;
use serde::Serialize;

use crate::error::{ExtractError, Result};
use crate::fragment::Fragment;
use crate::spec::Spec;
use crate::value::Value;

/// One constructor parameter of a target type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub has_default: bool,
}

impl Field {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            has_default: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            has_default: true,
        }
    }
}

/// A type that can be materialized from a specification's children
pub trait Target: Any + fmt::Debug + Serialize + Send + Sync + Sized {
    /// Constructor parameters, keyed by child spec `key`
    const FIELDS: &'static [Field];

    /// Receive the originating element as a [`Tag`] through [`Arguments::tag`]
    const TAG_AWARE: bool = false;

    fn build(args: Arguments) -> Result<Self>;
}

/// Snapshot of the element a tag-aware target was built from
///
/// The snapshot does not keep the document alive; [`Tag::fragment`] re-parses
/// the element on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    name: String,
    attrs: Vec<(String, String)>,
    html: String,
}

impl Tag {
    pub fn from_element(element: ElementRef<'_>) -> Self {
        Self {
            name: element.value().name().to_string(),
            attrs: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            html: element.html(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn fragment(&self) -> Fragment {
        Fragment::parse(&self.html)
    }

    /// Run another specification against the tagged element
    pub fn extract(&self, spec: &Spec) -> Result<Value<'static>> {
        let fragment = self.fragment();
        match fragment.element() {
            Some(element) => crate::engine::evaluate(spec, element).map(Value::into_owned),
            None => Ok(Value::Absent),
        }
    }
}

/// Values bound to a target's parameters
#[derive(Debug)]
pub struct Arguments {
    target: &'static str,
    values: IndexMap<String, Value<'static>>,
    tag: Option<Tag>,
}

impl Arguments {
    pub(crate) fn new(target: &'static str) -> Self {
        Self {
            target,
            values: IndexMap::new(),
            tag: None,
        }
    }

    pub(crate) fn insert(&mut self, name: String, value: Value<'static>) {
        self.values.insert(name, value);
    }

    pub(crate) fn set_tag(&mut self, tag: Tag) {
        self.tag = Some(tag);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Take a bound parameter; unbound is a [`ExtractError::MissingParameter`]
    pub fn required<T: FromValue>(&mut self, name: &str) -> Result<T> {
        let value = self
            .values
            .shift_remove(name)
            .ok_or_else(|| ExtractError::MissingParameter {
                target: self.target,
                param: name.to_string(),
            })?;
        self.convert(name, value)
    }

    /// Take a parameter that may have been left unbound
    ///
    /// Returns `None` when it is unbound or bound to [`Value::Absent`].
    pub fn optional<T: FromValue>(&mut self, name: &str) -> Result<Option<T>> {
        match self.values.shift_remove(name) {
            None | Some(Value::Absent) => Ok(None),
            Some(value) => self.convert(name, value).map(Some),
        }
    }

    /// Take a parameter holding another target instance
    pub fn object<T: Target + Clone>(&mut self, name: &str) -> Result<T> {
        let object: Object = self.required(name)?;
        object
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ExtractError::InvalidParameter {
                target: self.target,
                param: name.to_string(),
                expected: type_name::<T>(),
                found: object.type_name(),
            })
    }

    /// Take a parameter holding a list of target instances
    pub fn objects<T: Target + Clone>(&mut self, name: &str) -> Result<Vec<T>> {
        let objects: Vec<Object> = self.required(name)?;
        objects
            .iter()
            .map(|object| {
                object
                    .downcast_ref::<T>()
                    .cloned()
                    .ok_or_else(|| ExtractError::InvalidParameter {
                        target: self.target,
                        param: name.to_string(),
                        expected: type_name::<T>(),
                        found: object.type_name(),
                    })
            })
            .collect()
    }

    /// The originating element, set for tag-aware targets
    pub fn tag(&mut self) -> Option<Tag> {
        self.tag.take()
    }

    fn convert<T: FromValue>(&self, name: &str, value: Value<'static>) -> Result<T> {
        T::from_value(value).map_err(|value| ExtractError::InvalidParameter {
            target: self.target,
            param: name.to_string(),
            expected: T::EXPECTED,
            found: value.kind(),
        })
    }
}

/// Conversion from an extracted value into a parameter type
///
/// On mismatch the offending value is handed back for error reporting.
pub trait FromValue: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>>;
}

impl FromValue for Value<'static> {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        Ok(value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(other),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer text";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Text(text) => text.trim().parse().map_err(|_| Value::Text(text)),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "numeric text";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Text(text) => text.trim().parse().map_err(|_| Value::Text(text)),
            other => Err(other),
        }
    }
}

impl FromValue for Object {
    const EXPECTED: &'static str = "object";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Absent => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(other),
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    const EXPECTED: &'static str = "map";

    fn from_value(value: Value<'static>) -> Result<Self, Value<'static>> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| T::from_value(value).map(|v| (key, v)))
                .collect(),
            other => Err(other),
        }
    }
}

/// A built target instance, type-erased
#[derive(Clone)]
pub struct Object {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
    to_json: fn(&(dyn Any + Send + Sync)) -> serde_json::Value,
    debug: fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Object {
    pub fn new<T: Target>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            inner: Arc::new(value),
            to_json: object_to_json::<T>,
            debug: object_debug::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn to_json(&self) -> serde_json::Value {
        (self.to_json)(&*self.inner)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.type_name == other.type_name && self.to_json() == other.to_json())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(&*self.inner, f)
    }
}

fn object_to_json<T: Target>(inner: &(dyn Any + Send + Sync)) -> serde_json::Value {
    inner
        .downcast_ref::<T>()
        .and_then(|value| serde_json::to_value(value).ok())
        .unwrap_or(serde_json::Value::Null)
}

fn object_debug<T: Target>(
    inner: &(dyn Any + Send + Sync),
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match inner.downcast_ref::<T>() {
        Some(value) => value.fmt(f),
        None => f.write_str(type_name::<T>()),
    }
}

/// Type-erased handle on a [`Target`] implementation
#[derive(Clone, Copy)]
pub struct Constructor {
    type_id: TypeId,
    type_name: &'static str,
    fields: &'static [Field],
    tag_aware: bool,
    build: fn(Arguments) -> Result<Object>,
}

impl Constructor {
    pub fn of<T: Target>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            fields: T::FIELDS,
            tag_aware: T::TAG_AWARE,
            build: build_object::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    pub fn is_tag_aware(&self) -> bool {
        self.tag_aware
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Names of the fields that declare a default, computed once per type
    pub fn optional_params(&self) -> Arc<BTreeSet<&'static str>> {
        optional_params(self)
    }

    pub(crate) fn arguments(&self) -> Arguments {
        Arguments::new(self.type_name)
    }

    /// Check required fields are bound, then build the instance
    pub(crate) fn construct(&self, args: Arguments) -> Result<Object> {
        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| !f.has_default && !args.contains(f.name))
        {
            return Err(ExtractError::MissingParameter {
                target: self.type_name,
                param: missing.name.to_string(),
            });
        }
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("type_name", &self.type_name)
            .field("tag_aware", &self.tag_aware)
            .finish()
    }
}

fn build_object<T: Target>(args: Arguments) -> Result<Object> {
    T::build(args).map(Object::new)
}

type ParamCache = RwLock<HashMap<TypeId, Arc<BTreeSet<&'static str>>>>;

fn param_cache() -> &'static ParamCache {
    static CACHE: OnceLock<ParamCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn optional_params(constructor: &Constructor) -> Arc<BTreeSet<&'static str>> {
    if let Ok(cache) = param_cache().read() {
        if let Some(params) = cache.get(&constructor.type_id) {
            return Arc::clone(params);
        }
    }

    let params: Arc<BTreeSet<&'static str>> = Arc::new(
        constructor
            .fields
            .iter()
            .filter(|f| f.has_default)
            .map(|f| f.name)
            .collect(),
    );

    if let Ok(mut cache) = param_cache().write() {
        return Arc::clone(
            cache
                .entry(constructor.type_id)
                .or_insert_with(|| Arc::clone(&params)),
        );
    }
    params
}
