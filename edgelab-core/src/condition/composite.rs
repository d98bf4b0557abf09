//! AND / OR / NOT composition of conditions.

use serde::{Deserialize, Serialize};

use super::{Condition, ConditionError, ConditionEvaluation, EvalContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl LogicalOperator {
    /// Parse an operator name case-insensitively; an empty string yields `default`.
    pub fn parse(s: &str, default: Self) -> Result<Self, ConditionError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" => Ok(default),
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            "NOT" => Ok(Self::Not),
            _ => Err(ConditionError::UnknownOperator(s.to_string())),
        }
    }

    fn joiner(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
            Self::Not => "NOT ",
        }
    }
}

/// A validated composite node.
///
/// An empty AND or OR is allowed and always evaluates to `false`, so an
/// unconfigured entry strategy never fires. NOT wraps exactly one child.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    operator: LogicalOperator,
    children: Vec<Condition>,
}

impl Composite {
    pub fn new(operator: LogicalOperator, children: Vec<Condition>) -> Result<Self, ConditionError> {
        if operator == LogicalOperator::Not && children.len() != 1 {
            return Err(ConditionError::NotArity(children.len()));
        }
        Ok(Self { operator, children })
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Self {
            operator: LogicalOperator::And,
            children,
        }
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Self {
            operator: LogicalOperator::Or,
            children,
        }
    }

    pub fn not(child: Condition) -> Self {
        Self {
            operator: LogicalOperator::Not,
            children: vec![child],
        }
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn children(&self) -> &[Condition] {
        &self.children
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        if self.children.is_empty() {
            return false;
        }
        match self.operator {
            LogicalOperator::And => self.children.iter().all(|c| c.evaluate(ctx)),
            LogicalOperator::Or => self.children.iter().any(|c| c.evaluate(ctx)),
            LogicalOperator::Not => !self.children[0].evaluate(ctx),
        }
    }

    /// Verdict over already-evaluated child results; mirrors [`Self::evaluate`].
    pub fn combine(&self, results: &[ConditionEvaluation]) -> bool {
        if results.is_empty() {
            return false;
        }
        match self.operator {
            LogicalOperator::And => results.iter().all(|r| r.passed),
            LogicalOperator::Or => results.iter().any(|r| r.passed),
            LogicalOperator::Not => !results[0].passed,
        }
    }

    /// Nested composites are parenthesized.
    pub fn description(&self) -> String {
        let parts: Vec<String> = self
            .children
            .iter()
            .map(|c| match c {
                Condition::Composite(_) => format!("({})", c.description()),
                _ => c.description(),
            })
            .collect();
        match self.operator {
            LogicalOperator::Not => format!("NOT {}", parts.join(", ")),
            op => parts.join(op.joiner()),
        }
    }

    /// Reason of the first child that holds, once the composite itself holds.
    pub fn matching_reason(&self, ctx: &EvalContext<'_>) -> Option<String> {
        if !self.evaluate(ctx) {
            return None;
        }
        match self.operator {
            LogicalOperator::Not => Some(format!("Not: {}", self.children[0].description())),
            _ => self.children.iter().find_map(|c| c.matching_reason(ctx)),
        }
    }

    pub fn evaluate_detailed(&self, ctx: &EvalContext<'_>) -> ConditionEvaluation {
        let results: Vec<ConditionEvaluation> = self
            .children
            .iter()
            .map(|c| c.evaluate_detailed(ctx))
            .collect();
        let passed = self.combine(&results);
        let message = results
            .iter()
            .map(|r| r.message.as_str())
            .collect::<Vec<_>>()
            .join(self.operator.joiner());
        ConditionEvaluation {
            condition_type: format!("{:?}", self.operator).to_uppercase(),
            description: self.description(),
            passed,
            actual_value: None,
            threshold: None,
            message,
        }
    }
}
