//! Recursive evaluation of specification trees

use indexmap::IndexMap;
use scraper::ElementRef;
use tracing::debug;

use crate::document::Matched;
use crate::error::{ExtractError, Result};
use crate::rule::{self, Rule};
use crate::spec::{Shape, Spec};
use crate::target::Tag;
use crate::value::Value;

/// Evaluate `spec` against `node`
///
/// No match yields [`Value::Absent`] (or `false` under [`Rule::Found`]); a
/// range that selects nothing yields [`Value::Absent`]. Errors are
/// configuration errors and abort the whole evaluation.
pub fn evaluate<'a>(spec: &Spec, node: ElementRef<'a>) -> Result<Value<'a>> {
    let matched = spec.query().run(node);
    if matched.is_empty() {
        debug!(selector = spec.selector(), "No match");
        return Ok(no_match(spec));
    }

    let total = matched.len();
    let selected = spec.range().select(matched);
    debug!(
        selector = spec.selector(),
        matched = total,
        selected = selected.len(),
        "Evaluated selector"
    );
    if selected.is_empty() {
        return Ok(Value::Absent);
    }

    let values = if spec.children().is_empty() {
        selected
            .into_iter()
            .map(|m| rule::interpret(spec.rule(), m, spec.selector()))
            .collect::<Result<Vec<_>>>()?
    } else if let Some(shape) = spec.shape() {
        selected
            .iter()
            .map(|m| materialize(spec, shape, m))
            .collect::<Result<Vec<_>>>()?
    } else {
        let mut values = Vec::with_capacity(spec.children().len() * selected.len());
        for child in spec.children() {
            for m in &selected {
                values.push(evaluate_matched(child, m)?);
            }
        }
        values
    };

    Ok(spec.finish(resolve(values, spec.range().find_single)))
}

/// Build the target shape of `spec` for one selected node
pub fn materialize<'a>(spec: &Spec, shape: &Shape, matched: &Matched<'a>) -> Result<Value<'a>> {
    match shape {
        Shape::Dict => {
            let mut map = IndexMap::with_capacity(spec.children().len());
            for child in spec.children() {
                map.insert(child_key(spec, child, shape)?.to_string(), evaluate_matched(child, matched)?);
            }
            Ok(Value::Map(map))
        }
        Shape::List => spec
            .children()
            .iter()
            .map(|child| evaluate_matched(child, matched))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Shape::Object(constructor) => {
            let optional = constructor.optional_params();
            let mut args = constructor.arguments();
            for child in spec.children() {
                let key = child_key(spec, child, shape)?;
                let value = evaluate_matched(child, matched)?;
                if value.is_absent() && optional.contains(key) {
                    continue;
                }
                args.insert(key.to_string(), value.into_owned());
            }
            if constructor.is_tag_aware() {
                if let Some(element) = matched.as_element() {
                    args.set_tag(Tag::from_element(element));
                }
            }
            constructor.construct(args).map(Value::Object)
        }
    }
}

// Text matches have no sub-tree, so children see them as matching nothing.
fn evaluate_matched<'a>(spec: &Spec, matched: &Matched<'a>) -> Result<Value<'a>> {
    match matched.as_element() {
        Some(element) => evaluate(spec, element),
        None => Ok(no_match(spec)),
    }
}

fn no_match<'a>(spec: &Spec) -> Value<'a> {
    if matches!(spec.rule(), Some(Rule::Found)) {
        Value::Bool(false)
    } else {
        Value::Absent
    }
}

fn child_key<'s>(parent: &Spec, child: &'s Spec, shape: &Shape) -> Result<&'s str> {
    child.key().ok_or_else(|| ExtractError::MissingKey {
        selector: parent.selector().to_string(),
        child: child.selector().to_string(),
        shape: shape.name(),
    })
}

fn resolve(mut values: Vec<Value<'_>>, find_single: bool) -> Value<'_> {
    if !find_single {
        return Value::List(values);
    }
    if values.is_empty() {
        Value::Absent
    } else {
        values.swap_remove(0)
    }
}
