//! Command argument binding.
//!
//! A command handler declares the parameters it wants (name + kind). At
//! dispatch time the declared names are intersected with the options the
//! user supplied. Binding is deliberately lenient:
//! - declared parameters the user did not supply are simply absent;
//! - a supplied value that cannot be cast to the declared kind is passed
//!   through unchanged as `ArgValue::Raw`.

use std::collections::HashMap;

use serde_json::Value;

use sleet_types::interaction::CommandOption;

/// Declared kind of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    /// No cast; the raw JSON value is handed over.
    Raw,
}

/// One declared command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A bound argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    /// The value as supplied, when no cast was requested or the cast failed.
    Raw(Value),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Raw(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Raw(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            Self::Raw(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Raw(v) => v.as_bool(),
            _ => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Arguments bound for one command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    values: HashMap<String, ArgValue>,
}

impl CommandArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Bind supplied options to declared parameters.
pub fn bind_args(params: &[ParamSpec], options: &[CommandOption]) -> CommandArgs {
    let values = params
        .iter()
        .filter_map(|param| {
            let option = options.iter().find(|o| o.name == param.name)?;
            let raw = option.value.clone().unwrap_or(Value::Null);
            let value = coerce(param.kind, &raw).unwrap_or(ArgValue::Raw(raw));
            Some((param.name.clone(), value))
        })
        .collect();

    CommandArgs { values }
}

/// Best-effort cast of a raw option value. `None` means the cast failed.
fn coerce(kind: ParamKind, raw: &Value) -> Option<ArgValue> {
    match kind {
        ParamKind::Raw => None,
        ParamKind::String => match raw {
            Value::String(s) => Some(ArgValue::String(s.clone())),
            Value::Number(n) => Some(ArgValue::String(n.to_string())),
            Value::Bool(b) => Some(ArgValue::String(b.to_string())),
            _ => None,
        },
        ParamKind::Integer => match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                        .map(|f| f.trunc() as i64)
                })
                .map(ArgValue::Integer),
            Value::String(s) => s.trim().parse().ok().map(ArgValue::Integer),
            Value::Bool(b) => Some(ArgValue::Integer(i64::from(*b))),
            _ => None,
        },
        ParamKind::Number => match raw {
            Value::Number(n) => n.as_f64().map(ArgValue::Number),
            Value::String(s) => s.trim().parse().ok().map(ArgValue::Number),
            _ => None,
        },
        ParamKind::Boolean => match raw {
            Value::Bool(b) => Some(ArgValue::Boolean(*b)),
            Value::String(s) => s.trim().parse().ok().map(ArgValue::Boolean),
            _ => None,
        },
    }
}
