//! The result of a successful bind.
//!
//! Partitions serialize as `{kind, key, capacity?, children}`. Decimals,
//! both numeric key properties and consumed capacity, are written as JSON
//! strings (`"n_cpu_id": "0"`, `"capacity": "0.5"`) so no reader parses
//! them through a float.

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use crate::kind::ResourceKind;
use crate::property::Properties;
use crate::specification::{SpecId, Specification};

/// Which specification nodes a requirement took, and how much of each leaf.
///
/// Serializes as `{kind, key, capacity?, children}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    #[serde(skip)]
    spec_id: SpecId,
    kind: ResourceKind,
    key: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    capacity: Option<BigDecimal>,
    children: Vec<Partition>,
}

impl Partition {
    /// A leaf that consumed `amount` from `spec`.
    pub fn leaf(spec: &Specification, amount: BigDecimal) -> Self {
        Partition {
            spec_id: spec.id().clone(),
            kind: spec.kind(),
            key: spec.key_properties(),
            capacity: Some(amount.normalized()),
            children: Vec::new(),
        }
    }

    pub fn branch(spec: &Specification, children: Vec<Partition>) -> Self {
        Partition {
            spec_id: spec.id().clone(),
            kind: spec.kind(),
            key: spec.key_properties(),
            capacity: None,
            children,
        }
    }

    /// Id of the specification node this partition was cut from.
    pub fn spec_id(&self) -> &SpecId {
        &self.spec_id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn key(&self) -> &Properties {
        &self.key
    }

    pub fn capacity(&self) -> Option<&BigDecimal> {
        self.capacity.as_ref()
    }

    pub fn children(&self) -> &[Partition] {
        &self.children
    }

    /// Capacity consumed by every node of `kind` in this subtree.
    pub fn total_consumed(&self, kind: ResourceKind) -> BigDecimal {
        let own = match (&self.capacity, self.kind == kind) {
            (Some(amount), true) => amount.clone(),
            _ => BigDecimal::zero(),
        };
        self.children
            .iter()
            .fold(own, |sum, child| sum + child.total_consumed(kind))
    }

    /// Number of nodes of `kind` in this subtree.
    pub fn count(&self, kind: ResourceKind) -> usize {
        usize::from(self.kind == kind)
            + self.children.iter().map(|child| child.count(kind)).sum::<usize>()
    }
}
