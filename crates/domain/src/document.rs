//! Automation document: the persisted unit, and its validator.
//!
//! Loading is all-or-nothing. A document with any structural deviation at
//! any nesting depth is rejected as a whole, never partially recovered.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::id::MAX_SAFE_INTEGER;
use crate::slug;
use crate::step::StepKind;
use crate::time::Timestamp;
use crate::tree::StepTree;
use crate::variable::{Environment, VariableFilter};

/// Descriptive header of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub title: String,
    pub created_at: Timestamp,
}

/// Executable content of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationData {
    pub steps: StepTree,
    pub variables: Environment,
}

/// One automation, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationDocument {
    pub meta: Meta,
    pub data: AutomationData,
}

impl AutomationDocument {
    #[must_use]
    pub fn new(title: impl Into<String>, created_at: Timestamp, data: AutomationData) -> Self {
        Self {
            meta: Meta {
                title: title.into(),
                created_at,
            },
            data,
        }
    }

    /// Parse and validate `raw`, discarding the rejection reason.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::try_parse(raw).ok()
    }

    /// Parse and validate `raw`.
    ///
    /// On top of the shape checks done while decoding (required fields,
    /// field types, known step types and literals), every integer must lie
    /// in the safe range and step ids must be unique across the tree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn try_parse(raw: &str) -> Result<Self, DocumentError> {
        let document: Self = serde_json::from_str(raw)?;
        document.validate()?;
        Ok(document)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// File name this document is stored under.
    #[must_use]
    pub fn file_name(&self) -> String {
        slug::file_name(&self.meta.title)
    }

    fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for step in self.data.steps.iter() {
            safe("id", step.id.get())?;
            if !seen.insert(step.id) {
                return Err(DocumentError::DuplicateStepId(step.id));
            }
            match &step.kind {
                StepKind::Move { x, y } => {
                    safe("move.x", *x)?;
                    safe("move.y", *y)?;
                }
                StepKind::Sleep { time } => safe("sleep.time", *time)?,
                StepKind::PressKeyboard(combination) => {
                    safe("pressKeyboard.keyCode", combination.key_code)?;
                }
                StepKind::DestructVariable { index, .. } => {
                    safe("destructVariable.index", *index)?;
                }
                _ => {}
            }
        }
        for (_, variable) in self.data.variables.entries(VariableFilter::default()) {
            safe("ownerId", variable.owner_id.get())?;
        }
        Ok(())
    }
}

fn safe(field: &'static str, value: u64) -> Result<(), DocumentError> {
    if value > MAX_SAFE_INTEGER {
        return Err(DocumentError::UnsafeInteger { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::StepId;
    use crate::step::{Step, StepKind};
    use crate::variable::{Variable, VariableKind};

    fn ids(document: &AutomationDocument) -> Vec<StepId> {
        document.data.steps.iter().map(|step| step.id).collect()
    }

    fn raw(steps: &serde_json::Value, variables: &serde_json::Value) -> String {
        serde_json::json!({
            "meta": { "title": "Fill form", "createdAt": "2024-03-01T10:20:30.000Z" },
            "data": { "steps": steps, "variables": variables }
        })
        .to_string()
    }

    fn valid() -> String {
        raw(
            &serde_json::json!([
                { "id": 0, "type": "setVariable", "data": { "saveAs": "names", "value": "a,b" } },
                { "id": 1, "type": "parseString", "data": {
                    "parseString": "", "readFrom": "names", "divider": ",", "saveAs": "list"
                } },
                { "id": 2, "type": "cycle", "data": {
                    "iterable": "list", "saveItemsAs": "item", "steps": [
                        { "id": 3, "type": "move", "data": { "x": 10, "y": 20 } },
                        { "id": 4, "type": "click", "data": { "button": "left" } },
                        { "id": 5, "type": "write", "data": { "text": "", "readFrom": "item" } },
                        { "id": 6, "type": "conditional", "data": {
                            "condition": {
                                "leftSide": { "origin": "variable", "readFrom": "item" },
                                "operator": "equal",
                                "rightSide": { "origin": "value", "value": "b" }
                            },
                            "steps": [
                                { "id": 7, "type": "pressKeyboard", "data": {
                                    "holdCtrl": false, "holdShift": false, "holdAlt": false,
                                    "keyCode": 13, "keyName": "Enter"
                                } }
                            ]
                        } }
                    ]
                } },
                { "id": 8, "type": "sleep", "data": { "time": 250 } },
                { "id": 9, "type": "destructVariable", "data": {
                    "readFrom": "list", "index": 1, "saveAs": "second"
                } }
            ]),
            &serde_json::json!({
                "names": { "ownerId": 0, "type": "value", "value": "a,b" },
                "list": { "ownerId": 1, "type": "list", "value": null },
                "item": { "ownerId": 2, "type": "value", "value": null },
                "second": { "ownerId": 9, "type": "value", "value": null }
            }),
        )
    }

    fn with_step(step: serde_json::Value) -> String {
        raw(&serde_json::json!([step]), &serde_json::json!({}))
    }

    #[test]
    fn should_parse_document_with_every_step_type() {
        let document = AutomationDocument::parse(&valid()).unwrap();
        assert_eq!(document.meta.title, "Fill form");
        assert_eq!(ids(&document).len(), 10);
        assert_eq!(document.data.variables.len(), 4);
        assert_eq!(
            document.data.variables.get("LIST").unwrap().kind,
            VariableKind::List
        );
    }

    #[test]
    fn should_roundtrip_through_pretty_json() {
        let document = AutomationDocument::parse(&valid()).unwrap();
        let json = document.to_json().unwrap();
        assert!(json.contains("\n  \"meta\""));
        assert_eq!(AutomationDocument::parse(&json), Some(document));
    }

    #[test]
    fn should_reject_non_json() {
        assert!(AutomationDocument::parse("not json").is_none());
        assert!(AutomationDocument::parse("").is_none());
    }

    #[test]
    fn should_reject_missing_meta_field() {
        let json = serde_json::json!({
            "meta": { "title": "x" },
            "data": { "steps": [], "variables": {} }
        });
        assert!(AutomationDocument::parse(&json.to_string()).is_none());
    }

    #[test]
    fn should_reject_invalid_timestamp() {
        let json = serde_json::json!({
            "meta": { "title": "x", "createdAt": "yesterday" },
            "data": { "steps": [], "variables": {} }
        });
        assert!(AutomationDocument::parse(&json.to_string()).is_none());
    }

    #[test]
    fn should_reject_unknown_step_type() {
        let raw = with_step(serde_json::json!({ "id": 1, "type": "shell", "data": {} }));
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_reject_wrong_field_type_in_nested_step() {
        let raw = with_step(serde_json::json!({
            "id": 1, "type": "cycle", "data": {
                "iterable": "l", "saveItemsAs": "i", "steps": [
                    { "id": 2, "type": "move", "data": { "x": "10", "y": 2 } }
                ]
            }
        }));
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_reject_negative_or_fractional_coordinates() {
        for x in [serde_json::json!(-1), serde_json::json!(1.5)] {
            let raw = with_step(serde_json::json!({
                "id": 1, "type": "move", "data": { "x": x, "y": 2 }
            }));
            assert!(AutomationDocument::parse(&raw).is_none(), "{x}");
        }
    }

    #[test]
    fn should_reject_integers_above_safe_range() {
        let raw = with_step(serde_json::json!({
            "id": 1, "type": "sleep", "data": { "time": MAX_SAFE_INTEGER + 1 }
        }));
        let err = AutomationDocument::try_parse(&raw).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnsafeInteger { field: "sleep.time", .. }
        ));
    }

    #[test]
    fn should_reject_unknown_click_button() {
        let raw = with_step(serde_json::json!({
            "id": 1, "type": "click", "data": { "button": "back" }
        }));
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_reject_condition_side_without_origin() {
        let raw = with_step(serde_json::json!({
            "id": 1, "type": "conditional", "data": {
                "condition": {
                    "leftSide": { "value": "1" },
                    "operator": "equal",
                    "rightSide": { "origin": "value", "value": "1" }
                },
                "steps": []
            }
        }));
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_reject_duplicate_step_ids() {
        let raw = raw(
            &serde_json::json!([
                { "id": 1, "type": "sleep", "data": { "time": 1 } },
                { "id": 2, "type": "cycle", "data": {
                    "iterable": "l", "saveItemsAs": "i", "steps": [
                        { "id": 1, "type": "sleep", "data": { "time": 1 } }
                    ]
                } }
            ]),
            &serde_json::json!({}),
        );
        let err = AutomationDocument::try_parse(&raw).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateStepId(id) if id == StepId::new(1)));
    }

    #[test]
    fn should_reject_variable_without_value_key() {
        let raw = raw(
            &serde_json::json!([]),
            &serde_json::json!({ "x": { "ownerId": 1, "type": "value" } }),
        );
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_reject_variable_with_negative_owner() {
        let raw = raw(
            &serde_json::json!([]),
            &serde_json::json!({ "x": { "ownerId": -1, "type": "value", "value": "" } }),
        );
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_reject_missing_data_key_on_step() {
        let raw = with_step(serde_json::json!({ "id": 1, "type": "sleep" }));
        assert!(AutomationDocument::parse(&raw).is_none());
    }

    #[test]
    fn should_tolerate_unknown_extra_fields() {
        let raw = with_step(serde_json::json!({
            "id": 1, "type": "sleep", "data": { "time": 5, "note": "x" }, "collapsed": true
        }));
        assert!(AutomationDocument::parse(&raw).is_some());
    }

    #[test]
    fn should_derive_file_name_from_title() {
        let mut variables = Environment::new();
        variables.set("x", Variable::value(StepId::new(0), "1"));
        let data = AutomationData {
            steps: StepTree::from(vec![Step::new(
                StepId::new(0),
                StepKind::SetVariable {
                    save_as: "x".to_string(),
                    value: "1".to_string(),
                },
            )]),
            variables,
        };
        let document = AutomationDocument::new("Daily Report, v2", Timestamp::UNIX_EPOCH, data);
        assert_eq!(document.file_name(), "daily-report.-v2.json");
    }
}
