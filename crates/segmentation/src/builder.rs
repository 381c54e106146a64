//! Rule builder — fluent API for constructing perk rule criteria.

use perks_core::Perk;

use crate::engine::PerkRule;
use crate::predicates::{ComparisonOperator, LogicalOperator, MetricField, Predicate, PredicateGroup};

pub struct PerkRuleBuilder {
    name: String,
    perk: Perk,
    predicates: Vec<Predicate>,
    operator: LogicalOperator,
}

impl PerkRuleBuilder {
    pub fn new(name: impl Into<String>, perk: Perk) -> Self {
        Self {
            name: name.into(),
            perk,
            predicates: Vec::new(),
            operator: LogicalOperator::And,
        }
    }

    pub fn with_or(mut self) -> Self {
        self.operator = LogicalOperator::Or;
        self
    }

    pub fn when(mut self, metric: MetricField, operator: ComparisonOperator, value: f64) -> Self {
        self.predicates.push(Predicate {
            metric,
            operator,
            value,
        });
        self
    }

    pub fn equals(self, metric: MetricField, value: f64) -> Self {
        self.when(metric, ComparisonOperator::Equals, value)
    }

    pub fn gt(self, metric: MetricField, value: f64) -> Self {
        self.when(metric, ComparisonOperator::GreaterThan, value)
    }

    pub fn lt(self, metric: MetricField, value: f64) -> Self {
        self.when(metric, ComparisonOperator::LessThan, value)
    }

    pub fn build(self) -> PerkRule {
        PerkRule {
            name: self.name,
            perk: self.perk,
            criteria: PredicateGroup {
                operator: self.operator,
                predicates: self.predicates,
            },
        }
    }
}
