//! Renders parsed templates against a JSON document.

use std::borrow::Cow;
use std::fmt::Write;

use dockmeta_common::error::{DockmetaError, Result};
use serde_json::Value;

use crate::parser::ast::{Expr, Node};

fn exec_err(name: &str, message: String) -> DockmetaError {
    DockmetaError::TemplateExec {
        name: name.to_string(),
        message,
    }
}

/// Executes `nodes` against `data`, returning the rendered text.
///
/// # Errors
///
/// Returns [`DockmetaError::TemplateExec`] when a field or key is missing,
/// an index is out of range, or a value cannot be indexed.
pub fn execute(name: &str, nodes: &[Node], data: &Value) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Action(expr) => {
                let value = evaluate(name, expr, data)?;
                write_value(&mut out, &value);
            }
        }
    }
    Ok(out)
}

fn evaluate<'v>(name: &str, expr: &Expr, data: &'v Value) -> Result<Cow<'v, Value>> {
    match expr {
        Expr::Field(path) => resolve_field(name, data, path).map(Cow::Borrowed),
        Expr::String(s) => Ok(Cow::Owned(Value::String(s.clone()))),
        Expr::Integer(n) => Ok(Cow::Owned(Value::from(*n))),
        Expr::Index { target, keys } => {
            let mut current = evaluate(name, target, data)?;
            for key in keys {
                let key = evaluate(name, key, data)?;
                current = index(name, current, &key)?;
            }
            Ok(current)
        }
    }
}

fn resolve_field<'v>(name: &str, root: &'v Value, path: &[String]) -> Result<&'v Value> {
    path.iter().try_fold(root, |current, field| match current {
        Value::Object(map) => map
            .get(field)
            .ok_or_else(|| exec_err(name, format!("can't evaluate field {field}: no such key"))),
        other => Err(exec_err(
            name,
            format!("can't evaluate field {field} in type {}", type_name(other)),
        )),
    })
}

fn index<'v>(name: &str, container: Cow<'v, Value>, key: &Value) -> Result<Cow<'v, Value>> {
    let container = match container {
        Cow::Borrowed(value) => value,
        Cow::Owned(value) => {
            return Err(exec_err(
                name,
                format!("can't index item of type {}", type_name(&value)),
            ));
        }
    };

    match (container, key) {
        (Value::Object(map), Value::String(k)) => map
            .get(k)
            .map(Cow::Borrowed)
            .ok_or_else(|| exec_err(name, format!("map has no entry for key {k:?}"))),
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i))
            .map(Cow::Borrowed)
            .ok_or_else(|| exec_err(name, format!("index out of range: {n}"))),
        (other, key) => Err(exec_err(
            name,
            format!(
                "can't index item of type {} with {}",
                type_name(other),
                type_name(key)
            ),
        )),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings render verbatim, `null` as nothing, containers as compact JSON.
fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => {
            let _ = write!(out, "{other}");
        }
    }
}
