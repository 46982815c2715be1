//! Matching a requirement tree against a specification tree.
//!
//! The binder walks both trees top down. For each child entry of a
//! requirement it picks matching specification children in declared order
//! and recurses; leaves consume capacity from the ledger.
//!
//! ```text
//! entry count           strategy
//! ───────────────────   ──────────────────────────────────────────────
//! [start, end] EACH     pick up to `end` children, at least `start`
//! [start, end] TOTAL    as EACH, but `end` is one budget shared by every
//!                       parent matched for the enclosing entry
//! any                   pool all qualifying children and match the
//!                       entry's own children across the whole pool
//! ```
//!
//! All tentative consumption happens on forked ledgers that are only
//! committed once the enclosing node is accepted, so a rejected branch
//! never leaves a trace.

use std::cmp::Ordering;

use bigdecimal::{BigDecimal, Zero};
use hostbind_model::{
    Cardinality, CardinalityPolicy, NumberRange, Partition, Properties, Requirement, Specification,
};
use tracing::debug;

use crate::error::{BindError, BindResult};
use crate::ledger::CapacityLedger;
use crate::scope::SpecScope;

/// Binds requirements for one unit of work.
///
/// The work's tags are visible to every where-condition.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'t> {
    tags: &'t Properties,
}

/// A specification node together with the scope its conditions see.
struct Candidate<'a> {
    spec: &'a Specification,
    scope: SpecScope<'a>,
}

impl<'a> Candidate<'a> {
    fn under(parent: &SpecScope<'a>, spec: &'a Specification) -> Self {
        Candidate {
            spec,
            scope: parent.with(spec),
        }
    }
}

/// Shared budgets for TOTAL entries, one slot per child entry.
#[derive(Debug, Clone, Default)]
struct TotalBudgets {
    slots: Vec<Option<Budget>>,
}

#[derive(Debug, Clone)]
struct Budget {
    original: NumberRange,
    taken: usize,
}

impl Budget {
    /// What is left to hand out, `None` once the upper bound is used up.
    fn remaining(&self) -> Option<NumberRange> {
        if self.original.is_reached_by(self.taken) {
            None
        } else if self.taken == 0 {
            Some(self.original.clone())
        } else {
            self.original.subtract_count(self.taken)
        }
    }

    fn is_met(&self) -> bool {
        self.original.compare_start(&BigDecimal::from(self.taken as u64)) != Ordering::Greater
    }
}

impl TotalBudgets {
    fn for_entries(entries: &[Requirement]) -> Self {
        let slots = entries
            .iter()
            .map(|entry| match (entry.policy(), entry.count()) {
                (CardinalityPolicy::Total, Cardinality::Range(range)) => Some(Budget {
                    original: range.clone(),
                    taken: 0,
                }),
                _ => None,
            })
            .collect();
        Self { slots }
    }

    fn satisfied(&self) -> bool {
        self.slots.iter().flatten().all(Budget::is_met)
    }
}

impl<'t> Binder<'t> {
    pub fn new(tags: &'t Properties) -> Self {
        Self { tags }
    }

    /// Bind `requirement` against `spec`, drawing capacity from `ledger`.
    ///
    /// Returns `Ok(None)` when the specification cannot satisfy the
    /// requirement; `ledger` is then left exactly as it was. On success the
    /// consumed capacity is committed to `ledger`.
    ///
    /// The root's own where-condition is not evaluated here.
    pub fn bind(
        &self,
        requirement: &Requirement,
        spec: &Specification,
        ledger: &mut CapacityLedger,
    ) -> BindResult<Option<Partition>> {
        if requirement.kind() != spec.kind() {
            return Err(BindError::KindMismatch {
                requirement: requirement.kind(),
                specification: spec.kind(),
            });
        }

        let root = Candidate::under(&SpecScope::new(self.tags), spec);
        let mut attempt = ledger.fork();
        let mut budgets = TotalBudgets::for_entries(requirement.children());
        let Some(partition) = self.bind_individual(requirement, &root, &mut attempt, &mut budgets)? else {
            return Ok(None);
        };
        if !budgets.satisfied() {
            debug!(spec = %spec.id(), "total quota unmet");
            return Ok(None);
        }
        ledger.commit(attempt);
        Ok(Some(partition))
    }

    fn bind_individual(
        &self,
        requirement: &Requirement,
        candidate: &Candidate<'_>,
        attempt: &mut CapacityLedger,
        budgets: &mut TotalBudgets,
    ) -> BindResult<Option<Partition>> {
        let spec = candidate.spec;

        if let Some(wanted) = requirement.capacity() {
            let available = attempt.available(spec).unwrap_or_else(BigDecimal::zero);
            let Some(amount) = consumable(&available, wanted) else {
                debug!(
                    spec = %spec.id(),
                    %available,
                    wanted = %wanted,
                    "capacity insufficient"
                );
                return Ok(None);
            };
            attempt.consume(spec, &amount);
            return Ok(Some(Partition::leaf(spec, amount)));
        }

        let mut local = attempt.fork();
        let mut local_budgets = budgets.clone();
        let mut children = Vec::new();

        for (index, entry) in requirement.children().iter().enumerate() {
            let candidates: Vec<Candidate<'_>> = spec
                .children_of(entry.kind())
                .map(|child| Candidate::under(&candidate.scope, child))
                .collect();

            let found = match (entry.count(), entry.policy()) {
                (Cardinality::Any, _) => self.pool(entry, &candidates, &mut local)?,
                (Cardinality::Range(range), CardinalityPolicy::Each) => {
                    self.select(entry, &candidates, range.clone(), range.start(), &mut local)?
                }
                (Cardinality::Range(range), CardinalityPolicy::Total) => {
                    let budget = local_budgets.slots.get_mut(index).and_then(Option::as_mut);
                    let Some(budget) = budget else {
                        return Ok(None);
                    };
                    match budget.remaining() {
                        None => Some(Vec::new()),
                        Some(left) => {
                            let min = if range.start().is_zero() {
                                BigDecimal::zero()
                            } else {
                                BigDecimal::from(1)
                            };
                            let found = self.select(entry, &candidates, left, &min, &mut local)?;
                            if let Some(found) = &found {
                                budget.taken += found.len();
                            }
                            found
                        }
                    }
                }
            };

            let Some(found) = found else {
                debug!(spec = %spec.id(), entry = %entry.kind(), "child entry unmet");
                return Ok(None);
            };
            children.extend(found.into_iter().map(|(_, partition)| partition));
        }

        attempt.commit(local);
        *budgets = local_budgets;
        Ok(Some(Partition::branch(spec, children)))
    }

    /// Bind `entry` against candidates one by one, each at most once.
    ///
    /// Stops once `range`'s upper bound is reached, before binding anything
    /// when that bound is zero. Fails unless at least `min`
    /// candidates were bound. Returns the bound candidates' indices with
    /// their partitions.
    fn select(
        &self,
        entry: &Requirement,
        candidates: &[Candidate<'_>],
        range: NumberRange,
        min: &BigDecimal,
        attempt: &mut CapacityLedger,
    ) -> BindResult<Option<Vec<(usize, Partition)>>> {
        let mut local = attempt.fork();
        let mut budgets = TotalBudgets::for_entries(entry.children());
        let mut found = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            if range.is_reached_by(found.len()) {
                break;
            }
            let spec = candidate.spec;
            if local.available(spec).is_some_and(|left| left <= BigDecimal::zero()) {
                debug!(spec = %spec.id(), "skipping exhausted leaf");
                continue;
            }
            if !entry.condition().is_satisfied(&candidate.scope)? {
                debug!(spec = %spec.id(), condition = %entry.condition(), "where condition not met");
                continue;
            }
            if let Some(partition) = self.bind_individual(entry, candidate, &mut local, &mut budgets)? {
                found.push((index, partition));
            }
        }

        if !found.is_empty() && !budgets.satisfied() {
            debug!(entry = %entry.kind(), "total quota unmet");
            return Ok(None);
        }
        if BigDecimal::from(found.len() as u64) < *min {
            debug!(
                entry = %entry.kind(),
                found = found.len(),
                %min,
                "quota unmet"
            );
            return Ok(None);
        }
        attempt.commit(local);
        Ok(Some(found))
    }

    /// Treat every qualifying candidate as one pooled instance of `entry`.
    ///
    /// The entry's children are matched against the union of the pool's
    /// children, so capacity is drawn across siblings. Every pool member
    /// that contributed gets a partition; when none did (an entry without
    /// children) the first member stands for the pool.
    fn pool(
        &self,
        entry: &Requirement,
        candidates: &[Candidate<'_>],
        attempt: &mut CapacityLedger,
    ) -> BindResult<Option<Vec<(usize, Partition)>>> {
        let mut members = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            if entry.condition().is_satisfied(&candidate.scope)? {
                members.push(index);
            }
        }
        if members.is_empty() {
            debug!(entry = %entry.kind(), "nothing to pool");
            return Ok(None);
        }

        let mut local = attempt.fork();
        let mut gathered: Vec<Vec<Partition>> = vec![Vec::new(); members.len()];

        for child in entry.children() {
            let mut owners = Vec::new();
            let mut pooled = Vec::new();
            for (slot, &member) in members.iter().enumerate() {
                let owner = &candidates[member];
                for grandchild in owner.spec.children_of(child.kind()) {
                    owners.push(slot);
                    pooled.push(Candidate::under(&owner.scope, grandchild));
                }
            }

            let found = match child.count() {
                Cardinality::Any => self.pool(child, &pooled, &mut local)?,
                Cardinality::Range(range) => {
                    self.select(child, &pooled, range.clone(), range.start(), &mut local)?
                }
            };
            let Some(found) = found else {
                debug!(entry = %entry.kind(), child = %child.kind(), "pooled entry unmet");
                return Ok(None);
            };
            for (index, partition) in found {
                gathered[owners[index]].push(partition);
            }
        }

        attempt.commit(local);
        let mut partitions: Vec<(usize, Partition)> = members
            .iter()
            .zip(gathered)
            .filter(|(_, children)| !children.is_empty())
            .map(|(&member, children)| (member, Partition::branch(candidates[member].spec, children)))
            .collect();
        if partitions.is_empty() {
            let first = members[0];
            partitions.push((first, Partition::branch(candidates[first].spec, Vec::new())));
        }
        Ok(Some(partitions))
    }
}

/// How much a leaf gives up: everything up to the range's end, or nothing
/// if it cannot cover the range's start.
fn consumable(available: &BigDecimal, wanted: &NumberRange) -> Option<BigDecimal> {
    if wanted.compare_start(available) == Ordering::Greater {
        return None;
    }
    match wanted.end() {
        Some(end) if available >= end => Some(end.clone()),
        _ => Some(available.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_model::{Expression, ResourceKind};

    fn cpu(id: u64, capacity: u64) -> Specification {
        Specification::leaf(
            ResourceKind::Cpu,
            Properties::new().with("n_cpu_id", id).unwrap(),
            BigDecimal::from(capacity),
        )
        .unwrap()
    }

    fn core(id: u64, cpus: Vec<Specification>) -> Specification {
        Specification::branch(
            ResourceKind::Core,
            Properties::new().with("n_core_id", id).unwrap(),
            cpus,
        )
        .unwrap()
    }

    fn cpu_req(count: NumberRange, capacity: NumberRange) -> Requirement {
        Requirement::builder(ResourceKind::Cpu)
            .range(count)
            .capacity(capacity)
            .build()
            .unwrap()
    }

    fn core_req(children: Vec<Requirement>) -> Requirement {
        Requirement::builder(ResourceKind::Core).children(children).build().unwrap()
    }

    #[test]
    fn consumable_takes_up_to_end() {
        let exact = NumberRange::of(50, 50).unwrap();
        assert_eq!(consumable(&BigDecimal::from(100), &exact), Some(BigDecimal::from(50)));
        assert_eq!(consumable(&BigDecimal::from(49), &exact), None);

        let open = NumberRange::at_least(BigDecimal::from(10)).unwrap();
        assert_eq!(consumable(&BigDecimal::from(70), &open), Some(BigDecimal::from(70)));

        let wide = NumberRange::of(10, 60).unwrap();
        assert_eq!(consumable(&BigDecimal::from(30), &wide), Some(BigDecimal::from(30)));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let tags = Properties::new();
        let spec = core(0, vec![cpu(0, 10)]);
        let req = cpu_req(NumberRange::of(1, 1).unwrap(), NumberRange::of(1, 1).unwrap());
        let result = Binder::new(&tags).bind(&req, &spec, &mut CapacityLedger::new());
        assert!(matches!(result, Err(BindError::KindMismatch { .. })));
    }

    #[test]
    fn skips_exhausted_leaves() {
        let tags = Properties::new();
        let spec = core(0, vec![cpu(0, 100), cpu(1, 100)]);
        let req = core_req(vec![cpu_req(
            NumberRange::of(1, 1).unwrap(),
            NumberRange::of(100, 100).unwrap(),
        )]);
        let binder = Binder::new(&tags);
        let mut ledger = CapacityLedger::new();

        let first = binder.bind(&req, &spec, &mut ledger).unwrap().unwrap();
        let second = binder.bind(&req, &spec, &mut ledger).unwrap().unwrap();
        assert_eq!(first.children()[0].spec_id(), spec.children()[0].id());
        assert_eq!(second.children()[0].spec_id(), spec.children()[1].id());
        assert!(binder.bind(&req, &spec, &mut ledger).unwrap().is_none());
    }

    #[test]
    fn where_condition_filters_children() {
        let tags = Properties::new();
        let spec = core(0, vec![cpu(0, 100), cpu(1, 100)]);
        let odd = Expression::call(
            "equal",
            vec![Expression::variable("cpu.n_cpu_id").unwrap(), Expression::literal(1)],
        )
        .unwrap();
        let entry = Requirement::builder(ResourceKind::Cpu)
            .range(NumberRange::of(1, 2).unwrap())
            .capacity(NumberRange::of(10, 10).unwrap())
            .condition(odd)
            .build()
            .unwrap();
        let partition = Binder::new(&tags)
            .bind(&core_req(vec![entry]), &spec, &mut CapacityLedger::new())
            .unwrap()
            .unwrap();
        assert_eq!(partition.count(ResourceKind::Cpu), 1);
        assert_eq!(partition.children()[0].spec_id(), spec.children()[1].id());
    }

    #[test]
    fn zero_minimum_entry_may_match_nothing() {
        let tags = Properties::new();
        let spec = core(0, vec![cpu(0, 5)]);
        let req = core_req(vec![cpu_req(
            NumberRange::of(0, 1).unwrap(),
            NumberRange::of(10, 10).unwrap(),
        )]);
        let partition = Binder::new(&tags)
            .bind(&req, &spec, &mut CapacityLedger::new())
            .unwrap()
            .unwrap();
        assert!(partition.children().is_empty());
    }
}
