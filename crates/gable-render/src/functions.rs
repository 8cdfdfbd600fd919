//! Host functions and filters callable from templates.
//!
//! A function is called as `name(args)`, a filter as `input|name(args)`.
//! Either can be registered as *safe* for a strategy: string results are
//! then marked safe for that strategy and are not escaped again when printed
//! in the same format.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gable_escape::SafeString;

use crate::error::ErrorKind;
use crate::value::{Map, Value};

type FunctionFn = dyn Fn(&[Value]) -> Result<Value, ErrorKind> + Send + Sync;
type FilterFn = dyn Fn(&Value, &[Value]) -> Result<Value, ErrorKind> + Send + Sync;

/// A registered function.
#[derive(Clone)]
pub struct Function {
    callable: Arc<FunctionFn>,
    safe_for: Option<String>,
}

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ErrorKind> + Send + Sync + 'static,
    {
        Self {
            callable: Arc::new(f),
            safe_for: None,
        }
    }

    /// Marks string results as safe for `strategy`.
    pub fn safe_for(mut self, strategy: impl Into<String>) -> Self {
        self.safe_for = Some(strategy.into());
        self
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, ErrorKind> {
        let value = (self.callable)(args)?;
        Ok(mark_safe(value, self.safe_for.as_deref()))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("safe_for", &self.safe_for)
            .finish_non_exhaustive()
    }
}

/// A registered filter.
#[derive(Clone)]
pub struct Filter {
    callable: Arc<FilterFn>,
    safe_for: Option<String>,
}

impl Filter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ErrorKind> + Send + Sync + 'static,
    {
        Self {
            callable: Arc::new(f),
            safe_for: None,
        }
    }

    /// Marks string results as safe for `strategy`.
    pub fn safe_for(mut self, strategy: impl Into<String>) -> Self {
        self.safe_for = Some(strategy.into());
        self
    }

    pub fn apply(&self, input: &Value, args: &[Value]) -> Result<Value, ErrorKind> {
        let value = (self.callable)(input, args)?;
        Ok(mark_safe(value, self.safe_for.as_deref()))
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("safe_for", &self.safe_for)
            .finish_non_exhaustive()
    }
}

fn mark_safe(value: Value, strategy: Option<&str>) -> Value {
    match (strategy, value) {
        (Some(strategy), Value::String(text)) => {
            Value::Safe(SafeString::new(strategy, &*text))
        }
        (_, value) => value,
    }
}

/// Functions and filters known to an engine.
#[derive(Debug, Clone)]
pub struct Functions {
    functions: HashMap<String, Function>,
    filters: HashMap<String, Filter>,
}

impl Functions {
    /// No functions, built-in filters only.
    pub fn new() -> Self {
        let mut set = Self {
            functions: HashMap::new(),
            filters: HashMap::new(),
        };
        set.add_filter("join", Filter::new(join));
        set.add_filter("length", Filter::new(length));
        set.add_filter("default", Filter::new(default));
        set.add_filter("upper", Filter::new(|v, _| Ok(Value::from(v.to_string().to_uppercase()))));
        set.add_filter("lower", Filter::new(|v, _| Ok(Value::from(v.to_string().to_lowercase()))));
        set.add_filter("trim", Filter::new(|v, _| Ok(Value::from(v.to_string().trim()))));
        set.add_filter("first", Filter::new(|v, _| Ok(edge(v, false))));
        set.add_filter("last", Filter::new(|v, _| Ok(edge(v, true))));
        set.add_filter("keys", Filter::new(keys));
        set.add_filter("json_encode", Filter::new(json_encode));
        set
    }

    pub fn add_function(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    pub fn add_filter(&mut self, name: impl Into<String>, filter: Filter) {
        self.filters.insert(name.into(), filter);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }
}

impl Default for Functions {
    fn default() -> Self {
        Self::new()
    }
}

fn join(input: &Value, args: &[Value]) -> Result<Value, ErrorKind> {
    let glue = args.first().map(Value::to_string).unwrap_or_default();
    let parts: Vec<String> = input
        .iterate()
        .into_iter()
        .map(|(_, item)| item.to_string())
        .collect();
    Ok(Value::from(parts.join(&glue)))
}

fn length(input: &Value, _args: &[Value]) -> Result<Value, ErrorKind> {
    let len = match input {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => input.to_string().chars().count(),
        _ => input.len().unwrap_or(0),
    };
    Ok(Value::from(len))
}

fn default(input: &Value, args: &[Value]) -> Result<Value, ErrorKind> {
    if input.is_empty() {
        Ok(args.first().cloned().unwrap_or_else(|| Value::from("")))
    } else {
        Ok(input.clone())
    }
}

fn edge(input: &Value, last: bool) -> Value {
    if let Some(text) = input.as_str() {
        let ch = if last {
            text.chars().next_back()
        } else {
            text.chars().next()
        };
        return ch.map(|c| Value::from(c.to_string())).unwrap_or_default();
    }
    let items = input.iterate();
    let picked = if last { items.last() } else { items.first() };
    picked.map(|(_, item)| item.clone()).unwrap_or_default()
}

fn keys(input: &Value, _args: &[Value]) -> Result<Value, ErrorKind> {
    Ok(input.iterate().into_iter().map(|(key, _)| key).collect())
}

fn json_encode(input: &Value, _args: &[Value]) -> Result<Value, ErrorKind> {
    let encoded = match input {
        Value::Undefined => "null".to_string(),
        other => serde_json::to_string(other)?,
    };
    Ok(Value::from(encoded))
}

/// Builds a mapping value from `(key, value)` pairs.
pub fn map_value<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
    Value::from(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<Map>(),
    )
}
