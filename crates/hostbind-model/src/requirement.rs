//! Requirement trees: what a unit of work asks for.
//!
//! A [`Requirement`] is one node of the ask. It is built through
//! [`RequirementBuilder`], which enforces every structural rule up front so
//! the binder never has to re-check shape while matching.

use bigdecimal::{BigDecimal, Zero};

use crate::error::{ExpressionError, ModelError, ModelResult};
use crate::expression::Expression;
use crate::kind::ResourceKind;
use crate::property::ValueType;
use crate::range::{Cardinality, CardinalityPolicy, NumberRange};

/// One node of a requirement tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    kind: ResourceKind,
    count: Cardinality,
    policy: CardinalityPolicy,
    condition: Expression,
    capacity: Option<NumberRange>,
    children: Vec<Requirement>,
}

impl Requirement {
    pub fn builder(kind: ResourceKind) -> RequirementBuilder {
        RequirementBuilder::new(kind)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn count(&self) -> &Cardinality {
        &self.count
    }

    pub fn policy(&self) -> CardinalityPolicy {
        self.policy
    }

    /// The where-condition, `true` when none was given.
    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    /// Capacity wanted from each matched leaf. Present exactly on leaves.
    pub fn capacity(&self) -> Option<&NumberRange> {
        self.capacity.as_ref()
    }

    /// Child entries in declaration order.
    pub fn children(&self) -> &[Requirement] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_capacity()
    }
}

/// Builder for [`Requirement`].
///
/// Defaults: count `[1,1]`, policy EACH, condition `true`.
#[derive(Debug, Clone)]
pub struct RequirementBuilder {
    kind: ResourceKind,
    count: Cardinality,
    policy: CardinalityPolicy,
    condition: Expression,
    capacity: Option<NumberRange>,
    children: Vec<Requirement>,
}

impl RequirementBuilder {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            count: Cardinality::default(),
            policy: CardinalityPolicy::default(),
            condition: Expression::always(),
            capacity: None,
            children: Vec::new(),
        }
    }

    pub fn count(mut self, count: Cardinality) -> Self {
        self.count = count;
        self
    }

    /// Shorthand for `count(Cardinality::Range(range))`.
    pub fn range(self, range: NumberRange) -> Self {
        self.count(Cardinality::Range(range))
    }

    pub fn any(self) -> Self {
        self.count(Cardinality::Any)
    }

    pub fn policy(mut self, policy: CardinalityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn condition(mut self, condition: Expression) -> Self {
        self.condition = condition;
        self
    }

    pub fn capacity(mut self, capacity: NumberRange) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn child(mut self, child: Requirement) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Requirement>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> ModelResult<Requirement> {
        let kind = self.kind;
        let invalid = |reason: &str| ModelError::InvalidRequirement {
            kind,
            reason: reason.to_string(),
        };

        match &self.count {
            Cardinality::Any if !kind.allows_any() => {
                return Err(invalid("only socket and core requirements may use any"));
            }
            Cardinality::Any => {}
            Cardinality::Range(range) => {
                if !range.is_non_fractional() {
                    return Err(invalid(&format!("count {range} is fractional")));
                }
                if kind == ResourceKind::Host && *range.start() < BigDecimal::from(1) {
                    return Err(invalid("host count must start at 1 or more"));
                }
            }
        }

        if self.condition.value_type() != ValueType::Boolean {
            return Err(ExpressionError::NotBoolean(self.condition.value_type()).into());
        }

        match (&self.capacity, kind.is_capacity()) {
            (None, true) => {
                return Err(ModelError::InvalidCapacity {
                    kind,
                    reason: "leaf requirement needs a capacity range".into(),
                });
            }
            (Some(_), false) => {
                return Err(ModelError::InvalidCapacity {
                    kind,
                    reason: "only leaf requirements carry capacity".into(),
                });
            }
            (Some(capacity), true) => {
                if capacity.end().is_some_and(|end| end.is_zero()) {
                    return Err(ModelError::InvalidCapacity {
                        kind,
                        reason: format!("capacity {capacity} asks for nothing"),
                    });
                }
            }
            (None, false) => {}
        }

        if let Some(child) = self.children.iter().find(|c| !kind.allows_child(c.kind)) {
            return Err(ModelError::IllegalChild {
                parent: kind,
                child: child.kind,
            });
        }

        Ok(Requirement {
            kind,
            count: self.count,
            policy: self.policy,
            condition: self.condition,
            capacity: self.capacity,
            children: self.children,
        })
    }
}
