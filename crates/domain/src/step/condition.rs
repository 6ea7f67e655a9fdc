//! Guard of a `conditional` step.

use serde::{Deserialize, Serialize};

use crate::variable::VariableValue;

/// One operand of a [`Condition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "camelCase")]
pub enum ConditionSide {
    /// A literal text.
    Value { value: String },
    /// The current value of a variable.
    #[serde(rename_all = "camelCase")]
    Variable { read_from: String },
}

/// Comparison applied to the two sides of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LesserThan,
    GreaterOrEqualThan,
    LesserOrEqualThan,
}

impl Operator {
    /// Ordering operators compare both sides as numbers.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Equal | Self::NotEqual)
    }

    /// Apply the operator to two resolved operands.
    ///
    /// Equality is structural. Ordering coerces both sides with
    /// [`VariableValue::to_number`]; any `NaN` makes the comparison false.
    #[must_use]
    pub fn apply(self, left: &VariableValue, right: &VariableValue) -> bool {
        match self {
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            Self::GreaterThan => left.to_number() > right.to_number(),
            Self::LesserThan => left.to_number() < right.to_number(),
            Self::GreaterOrEqualThan => left.to_number() >= right.to_number(),
            Self::LesserOrEqualThan => left.to_number() <= right.to_number(),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::LesserThan => "<",
            Self::GreaterOrEqualThan => ">=",
            Self::LesserOrEqualThan => "<=",
        }
    }
}

/// `left <operator> right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub left_side: ConditionSide,
    pub operator: Operator,
    pub right_side: ConditionSide,
}

impl std::fmt::Display for ConditionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value { value } => write!(f, "{value:?}"),
            Self::Variable { read_from } => write!(f, "${read_from}"),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.left_side,
            self.operator.symbol(),
            self.right_side
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> VariableValue {
        VariableValue::Text(value.to_string())
    }

    #[test]
    fn should_compare_numerically_when_operator_is_ordering() {
        assert!(Operator::GreaterThan.apply(&text("10"), &text("9")));
        assert!(!Operator::LesserThan.apply(&text("10"), &text("9")));
        assert!(Operator::GreaterOrEqualThan.apply(&text("2.5"), &text("2.50")));
        assert!(Operator::LesserOrEqualThan.apply(&text(" -3 "), &text("0")));
    }

    #[test]
    fn should_be_false_when_a_side_is_not_numeric() {
        for operator in [
            Operator::GreaterThan,
            Operator::LesserThan,
            Operator::GreaterOrEqualThan,
            Operator::LesserOrEqualThan,
        ] {
            assert!(!operator.apply(&text("abc"), &text("9")), "{operator:?}");
        }
    }

    #[test]
    fn should_compare_text_exactly_when_operator_is_equality() {
        assert!(Operator::Equal.apply(&text("10"), &text("10")));
        assert!(!Operator::Equal.apply(&text("10"), &text("10.0")));
        assert!(Operator::NotEqual.apply(&text("a"), &text("A")));
    }

    #[test]
    fn should_compare_lists_structurally() {
        let left = VariableValue::List(vec![text("a"), text("b")]);
        let right = VariableValue::List(vec![text("a"), text("b")]);
        assert!(Operator::Equal.apply(&left, &right));
        assert!(!Operator::Equal.apply(&left, &text("a,b")));
    }

    #[test]
    fn should_deserialize_both_side_origins() {
        let json = serde_json::json!({
            "leftSide": { "origin": "variable", "readFrom": "count" },
            "operator": "greaterOrEqualThan",
            "rightSide": { "origin": "value", "value": "3" }
        });
        let condition: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(
            condition.left_side,
            ConditionSide::Variable {
                read_from: "count".to_string()
            }
        );
        assert_eq!(condition.operator, Operator::GreaterOrEqualThan);
        assert_eq!(condition.to_string(), "$count >= \"3\"");
    }

    #[test]
    fn should_reject_side_with_unknown_origin() {
        let json = serde_json::json!({ "origin": "constant", "value": "3" });
        assert!(serde_json::from_value::<ConditionSide>(json).is_err());
    }

    #[test]
    fn should_reject_variable_side_without_read_from() {
        let json = serde_json::json!({ "origin": "variable", "value": "3" });
        assert!(serde_json::from_value::<ConditionSide>(json).is_err());
    }

    #[test]
    fn should_flag_numeric_operators() {
        assert!(!Operator::Equal.is_numeric());
        assert!(!Operator::NotEqual.is_numeric());
        assert!(Operator::GreaterThan.is_numeric());
        assert!(Operator::LesserOrEqualThan.is_numeric());
    }
}
