//! Entry and exit strategies built from a root composite.
//!
//! Entry strategies default to AND (every condition must hold), exit
//! strategies to OR (any condition triggers the exit).

use serde::{Deserialize, Serialize};

use crate::condition::{Composite, Condition, ConditionError, ConditionEvaluation, EvalContext, LogicalOperator};
use crate::domain::{BreadthContext, Quote, Stock};

/// Per-condition breakdown of an entry decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignalDetails {
    pub strategy_name: String,
    pub strategy_description: String,
    pub conditions: Vec<ConditionEvaluation>,
    pub all_conditions_met: bool,
}

/// Per-condition breakdown of an exit decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSignalDetails {
    pub strategy_name: String,
    pub strategy_description: String,
    pub conditions: Vec<ConditionEvaluation>,
    pub any_condition_met: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryStrategy {
    name: String,
    root: Composite,
    description: Option<String>,
}

impl EntryStrategy {
    pub fn new(
        name: impl Into<String>,
        operator: LogicalOperator,
        conditions: Vec<Condition>,
        description: Option<String>,
    ) -> Result<Self, ConditionError> {
        Ok(Self {
            name: name.into(),
            root: Composite::new(operator, conditions)?,
            description,
        })
    }

    /// AND of `conditions` with a synthesized description.
    pub fn all_of(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            root: Composite::and(conditions),
            description: None,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> LogicalOperator {
        self.root.operator()
    }

    pub fn conditions(&self) -> &[Condition] {
        self.root.children()
    }

    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.root.description())
    }

    pub fn test(&self, stock: &Stock, quote: &Quote, breadth: Option<&BreadthContext>) -> bool {
        self.root
            .evaluate(&EvalContext::new(stock, quote).with_breadth(breadth))
    }

    pub fn test_detailed(
        &self,
        stock: &Stock,
        quote: &Quote,
        breadth: Option<&BreadthContext>,
    ) -> EntrySignalDetails {
        let ctx = EvalContext::new(stock, quote).with_breadth(breadth);
        let conditions: Vec<ConditionEvaluation> = self
            .root
            .children()
            .iter()
            .map(|c| c.evaluate_detailed(&ctx))
            .collect();
        EntrySignalDetails {
            strategy_name: self.name.clone(),
            strategy_description: self.description(),
            all_conditions_met: self.root.combine(&conditions),
            conditions,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitStrategy {
    name: String,
    root: Composite,
    description: Option<String>,
}

impl ExitStrategy {
    pub fn new(
        name: impl Into<String>,
        operator: LogicalOperator,
        conditions: Vec<Condition>,
        description: Option<String>,
    ) -> Result<Self, ConditionError> {
        Ok(Self {
            name: name.into(),
            root: Composite::new(operator, conditions)?,
            description,
        })
    }

    /// OR of `conditions` with a synthesized description.
    pub fn any_of(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            root: Composite::or(conditions),
            description: None,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> LogicalOperator {
        self.root.operator()
    }

    pub fn conditions(&self) -> &[Condition] {
        self.root.children()
    }

    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.root.description())
    }

    fn context<'a>(
        stock: &'a Stock,
        entry: &'a Quote,
        quote: &'a Quote,
        breadth: Option<&'a BreadthContext>,
    ) -> EvalContext<'a> {
        EvalContext::new(stock, quote)
            .with_entry(entry)
            .with_breadth(breadth)
    }

    pub fn test(
        &self,
        stock: &Stock,
        entry: &Quote,
        quote: &Quote,
        breadth: Option<&BreadthContext>,
    ) -> bool {
        self.root
            .evaluate(&Self::context(stock, entry, quote, breadth))
    }

    /// The exit reason when the strategy fires on `quote`, `None` otherwise.
    pub fn check(
        &self,
        stock: &Stock,
        entry: &Quote,
        quote: &Quote,
        breadth: Option<&BreadthContext>,
    ) -> Option<String> {
        self.root
            .matching_reason(&Self::context(stock, entry, quote, breadth))
    }

    pub fn test_detailed(
        &self,
        stock: &Stock,
        entry: &Quote,
        quote: &Quote,
        breadth: Option<&BreadthContext>,
    ) -> ExitSignalDetails {
        let ctx = Self::context(stock, entry, quote, breadth);
        let conditions: Vec<ConditionEvaluation> = self
            .root
            .children()
            .iter()
            .map(|c| c.evaluate_detailed(&ctx))
            .collect();
        ExitSignalDetails {
            strategy_name: self.name.clone(),
            strategy_description: self.description(),
            any_condition_met: self.root.combine(&conditions),
            conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::test_support::stock_from_closes;

    #[test]
    fn empty_entry_strategy_never_fires() {
        let stock = stock_from_closes(&[10.0]);
        let entry = EntryStrategy::all_of("empty", vec![]);
        assert!(!entry.test(&stock, &stock.quotes()[0], None));
        assert!(!entry.test_detailed(&stock, &stock.quotes()[0], None).all_conditions_met);
    }

    #[test]
    fn explicit_description_wins() {
        let s = EntryStrategy::new(
            "e",
            LogicalOperator::And,
            vec![Condition::Always],
            Some("my entry".into()),
        )
        .unwrap();
        assert_eq!(s.description(), "my entry");
        let synthesized = EntryStrategy::all_of(
            "e",
            vec![Condition::MinimumPrice { price: 5.0 }, Condition::Uptrend],
        );
        assert_eq!(
            synthesized.description(),
            "Price at least 5.00 AND Stock in uptrend (EMA10 > EMA20, price > EMA50)"
        );
    }

    #[test]
    fn detailed_entry_lists_every_condition() {
        let stock = stock_from_closes(&[10.0]);
        let s = EntryStrategy::all_of(
            "e",
            vec![
                Condition::MinimumPrice { price: 5.0 },
                Condition::MinimumPrice { price: 50.0 },
            ],
        );
        let d = s.test_detailed(&stock, &stock.quotes()[0], None);
        assert_eq!(d.conditions.len(), 2);
        assert!(d.conditions[0].passed);
        assert!(!d.conditions[1].passed);
        assert!(!d.all_conditions_met);
        assert_eq!(d.strategy_name, "e");
    }

    #[test]
    fn exit_reason_from_first_matching_condition() {
        let stock = stock_from_closes(&[10.0, 11.0, 12.0]);
        let exit = ExitStrategy::any_of(
            "x",
            vec![Condition::Never, Condition::BarsHeld { bars: 2 }, Condition::Always],
        );
        let q = stock.quotes();
        assert_eq!(exit.check(&stock, &q[0], &q[1], None), Some("Always".into()));
        assert_eq!(
            exit.check(&stock, &q[0], &q[2], None),
            Some("Time exit after 2 bars".into())
        );
        assert!(exit.test(&stock, &q[0], &q[1], None));
        assert!(exit.test_detailed(&stock, &q[0], &q[1], None).any_condition_met);
    }

    #[test]
    fn not_with_two_children_is_rejected() {
        assert!(ExitStrategy::new(
            "x",
            LogicalOperator::Not,
            vec![Condition::Always, Condition::Never],
            None
        )
        .is_err());
    }
}
