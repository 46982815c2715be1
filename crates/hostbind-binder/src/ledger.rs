//! Remaining capacity per specification leaf.
//!
//! The ledger is the only mutable state of a bind. Leaves it has not seen
//! yet are read from their specification's available capacity, so an empty
//! ledger means "nothing consumed".
//!
//! ```text
//! caller ledger ──fork──▶ attempt ──(success)──▶ commit into caller
//!                           │
//!                           └──(failure)──▶ dropped, caller untouched
//! ```

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use hostbind_model::{SpecId, Specification};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityLedger {
    remaining: HashMap<SpecId, BigDecimal>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger with every leaf under `spec` filled in explicitly.
    pub fn seeded(spec: &Specification) -> Self {
        let remaining = spec
            .descendants()
            .into_iter()
            .filter_map(|node| node.capacity().map(|c| (node.id().clone(), c.clone())))
            .collect();
        Self { remaining }
    }

    /// Capacity still available on `spec`, `None` for non-leaf nodes.
    pub fn available(&self, spec: &Specification) -> Option<BigDecimal> {
        let initial = spec.capacity()?;
        Some(
            self.remaining
                .get(spec.id())
                .cloned()
                .unwrap_or_else(|| initial.clone()),
        )
    }

    /// Recorded remaining capacity, `None` for leaves never touched.
    pub fn remaining(&self, id: &SpecId) -> Option<&BigDecimal> {
        self.remaining.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SpecId, &BigDecimal)> {
        self.remaining.iter()
    }

    /// Take `amount` from `spec`. The caller has already checked availability.
    pub(crate) fn consume(&mut self, spec: &Specification, amount: &BigDecimal) {
        if let Some(available) = self.available(spec) {
            self.remaining
                .insert(spec.id().clone(), (available - amount).normalized());
        }
    }

    /// A copy to make tentative changes on.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Adopt the state of a successful attempt forked from this ledger.
    pub fn commit(&mut self, attempt: CapacityLedger) {
        *self = attempt;
    }
}
