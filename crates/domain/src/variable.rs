//! Variables and the environment binding them.
//!
//! Names are case-insensitive: every lookup goes through the lowercase
//! form of the name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::StepId;
use crate::step::walk;
use crate::tree::StepTree;

/// Declared shape of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Value,
    List,
}

/// A bound value. Persisted files may hold anything here, so shapes other
/// than text and lists are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Text(String),
    List(Vec<VariableValue>),
    Null,
    Other(serde_json::Value),
}

impl VariableValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[VariableValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the shape, for error messages.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Null => "null",
            Self::Other(_) => "other",
        }
    }

    /// Numeric reading used by ordering comparisons.
    ///
    /// Text is trimmed; empty text and `null` read as `0`; decimal,
    /// exponent, `Infinity` and `0x`/`0o`/`0b` forms are accepted; anything
    /// else, lists included, reads as `NaN`.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Text(text) => parse_number(text),
            Self::Null => 0.0,
            Self::Other(serde_json::Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
            Self::Other(serde_json::Value::Bool(flag)) => f64::from(u8::from(*flag)),
            Self::List(_) | Self::Other(_) => f64::NAN,
        }
    }
}

impl From<&str> for VariableValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

#[allow(clippy::cast_precision_loss)]
fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |value| value as f64);
        }
    }
    let decimal = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if decimal {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// An entry of the [`Environment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// The step whose action created this variable.
    pub owner_id: StepId,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    pub value: VariableValue,
}

impl Variable {
    /// A `value` variable holding `text`.
    #[must_use]
    pub fn value(owner_id: StepId, text: impl Into<String>) -> Self {
        Self {
            owner_id,
            kind: VariableKind::Value,
            value: VariableValue::Text(text.into()),
        }
    }

    /// A `list` variable holding `items`.
    #[must_use]
    pub fn list<I, T>(owner_id: StepId, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<VariableValue>,
    {
        Self {
            owner_id,
            kind: VariableKind::List,
            value: VariableValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

/// Exact-match predicate used by [`Environment::names`] and
/// [`Environment::entries`]. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableFilter {
    pub kind: Option<VariableKind>,
    pub owner_id: Option<StepId>,
}

impl VariableFilter {
    #[must_use]
    pub fn kind(mut self, kind: VariableKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn owner(mut self, owner_id: StepId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    #[must_use]
    pub fn matches(&self, variable: &Variable) -> bool {
        self.kind.is_none_or(|kind| kind == variable.kind)
            && self.owner_id.is_none_or(|owner| owner == variable.owner_id)
    }
}

/// Case-insensitive mapping from variable name to [`Variable`].
///
/// Besides the persistent bindings, the environment carries a stack of
/// *shadows*: temporary bindings pushed by a running `cycle` for its item
/// variable. Lookups see the innermost shadow first; writes to a shadowed
/// name stay in the shadow and vanish with it; every other write lands in
/// the persistent bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Variable>",
    into = "BTreeMap<String, Variable>"
)]
pub struct Environment {
    variables: BTreeMap<String, Variable>,
    shadows: Vec<(String, Variable)>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        let key = key(name);
        self.shadows
            .iter()
            .rev()
            .find(|(shadowed, _)| *shadowed == key)
            .map(|(_, variable)| variable)
            .or_else(|| self.variables.get(&key))
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind `name`, overwriting any previous binding.
    pub fn set(&mut self, name: &str, variable: Variable) {
        let key = key(name);
        if let Some((_, shadow)) = self.shadows.iter_mut().rev().find(|(s, _)| *s == key) {
            *shadow = variable;
        } else {
            self.variables.insert(key, variable);
        }
    }

    /// Remove a persistent binding, returning it.
    pub fn delete(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(&key(name))
    }

    /// Names (lowercase) of the persistent bindings matching `filter`.
    #[must_use]
    pub fn names(&self, filter: VariableFilter) -> Vec<&str> {
        self.entries(filter).into_iter().map(|(name, _)| name).collect()
    }

    /// Persistent bindings matching `filter`, ordered by name.
    #[must_use]
    pub fn entries(&self, filter: VariableFilter) -> Vec<(&str, &Variable)> {
        self.variables
            .iter()
            .filter(|(_, variable)| filter.matches(variable))
            .map(|(name, variable)| (name.as_str(), variable))
            .collect()
    }

    /// Delete every variable declared by step `id` or by any step nested
    /// below it. `id` is located in `tree`; nothing happens when absent.
    ///
    /// Returns the deleted names.
    pub fn delete_by_owner_step(&mut self, tree: &StepTree, id: StepId) -> Vec<String> {
        let Some(step) = tree.find(id) else {
            return Vec::new();
        };
        walk(std::slice::from_ref(step))
            .flat_map(|step| step.declared_names())
            .filter_map(|name| self.delete(name).map(|_| key(name)))
            .collect()
    }

    /// Drop every persistent binding.
    pub fn clear(&mut self) {
        self.variables.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Push a temporary binding hiding any binding with the same name.
    pub fn shadow(&mut self, name: &str, variable: Variable) {
        self.shadows.push((key(name), variable));
    }

    /// Pop the innermost temporary binding.
    pub fn unshadow(&mut self) -> Option<Variable> {
        self.shadows.pop().map(|(_, variable)| variable)
    }
}

impl From<BTreeMap<String, Variable>> for Environment {
    fn from(map: BTreeMap<String, Variable>) -> Self {
        Self {
            variables: map
                .into_iter()
                .map(|(name, variable)| (key(&name), variable))
                .collect(),
            shadows: Vec::new(),
        }
    }
}

impl From<Environment> for BTreeMap<String, Variable> {
    fn from(env: Environment) -> Self {
        env.variables
    }
}
