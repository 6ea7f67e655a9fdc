//! One node of an automation.
//!
//! Steps come in three families:
//! - **actions**: leaves that drive the input backend (`move`, `click`,
//!   `write`, `pressKeyboard`) or the clock (`sleep`), plus `parseString`;
//! - **statements**: containers owning an ordered sequence of nested steps
//!   (`cycle`, `conditional`);
//! - **variable operations**: leaves that only touch the environment
//!   (`setVariable`, `destructVariable`).
//!
//! The persisted shape is `{ "id": 1, "type": "move", "data": { … } }`.

mod action;
mod condition;

pub use action::{KeyCombination, MouseButton, PointerPosition};
pub use condition::{Condition, ConditionSide, Operator};

use serde::{Deserialize, Serialize};

use crate::id::StepId;
use crate::variable::{Variable, VariableKind, VariableValue};

/// A node of the automation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// The closed catalog of step types and their payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum StepKind {
    /// Move the pointer to an absolute screen position.
    Move { x: u64, y: u64 },
    /// Click a mouse button at the current pointer position.
    Click { button: MouseButton },
    /// Type `text`, or the text variable `read_from` when `text` is empty.
    #[serde(rename_all = "camelCase")]
    Write { text: String, read_from: String },
    /// Split `parse_string` (or the text variable `read_from`) on the
    /// literal `divider` and store the pieces as the list `save_as`.
    #[serde(rename_all = "camelCase")]
    ParseString {
        parse_string: String,
        read_from: String,
        divider: String,
        save_as: String,
    },
    /// Wait for `time` milliseconds.
    Sleep { time: u64 },
    /// Press a key with optional modifiers.
    PressKeyboard(KeyCombination),
    /// Run `steps` once per item of the list `iterable`, binding the item
    /// to `save_items_as`.
    #[serde(rename_all = "camelCase")]
    Cycle {
        iterable: String,
        save_items_as: String,
        steps: Vec<Step>,
    },
    /// Run `steps` when `condition` holds.
    Conditional { condition: Condition, steps: Vec<Step> },
    /// Store a literal text as the variable `save_as`.
    #[serde(rename_all = "camelCase")]
    SetVariable { save_as: String, value: String },
    /// Store element `index` of the list `read_from` as the variable `save_as`.
    #[serde(rename_all = "camelCase")]
    DestructVariable {
        read_from: String,
        index: u64,
        save_as: String,
    },
}

impl StepKind {
    /// The persisted `type` tag.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Click { .. } => "click",
            Self::Write { .. } => "write",
            Self::ParseString { .. } => "parseString",
            Self::Sleep { .. } => "sleep",
            Self::PressKeyboard(_) => "pressKeyboard",
            Self::Cycle { .. } => "cycle",
            Self::Conditional { .. } => "conditional",
            Self::SetVariable { .. } => "setVariable",
            Self::DestructVariable { .. } => "destructVariable",
        }
    }

    /// Whether both kinds are the same container type.
    #[must_use]
    pub fn same_container_as(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Cycle { .. }, Self::Cycle { .. })
                | (Self::Conditional { .. }, Self::Conditional { .. })
        )
    }
}

impl Step {
    #[must_use]
    pub fn new(id: StepId, kind: StepKind) -> Self {
        Self { id, kind }
    }

    /// Statements own nested steps; every other kind is a leaf.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.children().is_some()
    }

    /// Nested steps of a statement, `None` for leaves.
    #[must_use]
    pub fn children(&self) -> Option<&[Step]> {
        match &self.kind {
            StepKind::Cycle { steps, .. } | StepKind::Conditional { steps, .. } => Some(steps),
            _ => None,
        }
    }

    /// Mutable access to the nested steps of a statement.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Step>> {
        match &mut self.kind {
            StepKind::Cycle { steps, .. } | StepKind::Conditional { steps, .. } => Some(steps),
            _ => None,
        }
    }

    /// Variables this step creates, as registered by the editor when the
    /// step is saved. The bound values are placeholders until a run
    /// produces the real ones (except for `setVariable`).
    #[must_use]
    pub fn declarations(&self) -> Vec<(&str, Variable)> {
        let declared = |kind| Variable {
            owner_id: self.id,
            kind,
            value: VariableValue::Null,
        };
        match &self.kind {
            StepKind::ParseString { save_as, .. } => {
                vec![(save_as.as_str(), declared(VariableKind::List))]
            }
            StepKind::DestructVariable { save_as, .. } => {
                vec![(save_as.as_str(), declared(VariableKind::Value))]
            }
            StepKind::Cycle { save_items_as, .. } => {
                vec![(save_items_as.as_str(), declared(VariableKind::Value))]
            }
            StepKind::SetVariable { save_as, value } => {
                vec![(save_as.as_str(), Variable::value(self.id, value.clone()))]
            }
            _ => Vec::new(),
        }
    }

    /// Names of the variables this step creates (`saveAs` / `saveItemsAs`).
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        let name = match &self.kind {
            StepKind::ParseString { save_as, .. }
            | StepKind::DestructVariable { save_as, .. }
            | StepKind::SetVariable { save_as, .. } => Some(save_as.as_str()),
            StepKind::Cycle { save_items_as, .. } => Some(save_items_as.as_str()),
            _ => None,
        };
        name.into_iter()
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            StepKind::Move { x, y } => write!(f, "move({x}, {y})"),
            StepKind::Click { button } => write!(f, "click({button})"),
            StepKind::Write { text, read_from } if text.is_empty() => {
                write!(f, "write(${read_from})")
            }
            StepKind::Write { text, .. } => write!(f, "write({})", truncate(text, 50)),
            StepKind::ParseString {
                divider, save_as, ..
            } => write!(f, "parseString({divider:?} -> {save_as})"),
            StepKind::Sleep { time } => write!(f, "sleep({time}ms)"),
            StepKind::PressKeyboard(combination) => write!(f, "pressKeyboard({combination})"),
            StepKind::Cycle {
                iterable,
                save_items_as,
                steps,
            } => write!(
                f,
                "cycle({save_items_as} in ${iterable}, {} steps)",
                steps.len()
            ),
            StepKind::Conditional { condition, steps } => {
                write!(f, "conditional({condition}, {} steps)", steps.len())
            }
            StepKind::SetVariable { save_as, .. } => write!(f, "setVariable({save_as})"),
            StepKind::DestructVariable {
                read_from,
                index,
                save_as,
            } => write!(f, "destructVariable(${read_from}[{index}] -> {save_as})"),
        }
    }
}

/// Shorten `text` to at most `limit` characters for log output.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> std::borrow::Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]).into(),
        None => text.into(),
    }
}

/// Depth-first, pre-order walk over a step sequence and every nested
/// sequence below it.
#[must_use]
pub fn walk(steps: &[Step]) -> Walk<'_> {
    Walk {
        stack: vec![steps.iter()],
    }
}

/// Iterator returned by [`walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<std::slice::Iter<'a, Step>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Step;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            if let Some(step) = level.next() {
                if let Some(children) = step.children() {
                    self.stack.push(children.iter());
                }
                return Some(step);
            }
            self.stack.pop();
        }
    }
}
