//! Units of work and the bind records produced for them.

use std::collections::BTreeSet;

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use crate::error::{ModelError, ModelResult};
use crate::kind::ResourceKind;
use crate::partition::Partition;
use crate::property::Properties;
use crate::requirement::Requirement;

/// A schedulable unit: identity, ordering hints, tags visible to
/// where-conditions, and the host requirement it must be placed against.
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    id: String,
    priority: BigDecimal,
    parents: BTreeSet<String>,
    tags: Properties,
    requirement: Requirement,
}

impl Work {
    pub fn new(
        id: impl Into<String>,
        priority: BigDecimal,
        parents: impl IntoIterator<Item = String>,
        tags: Properties,
        requirement: Requirement,
    ) -> ModelResult<Self> {
        let id = id.into();
        check_id(&id)?;
        if priority < BigDecimal::zero() || priority > BigDecimal::from(1) {
            return Err(ModelError::InvalidWork(format!(
                "priority {priority} is outside [0, 1]"
            )));
        }
        let parents: BTreeSet<String> = parents.into_iter().collect();
        for parent in &parents {
            check_id(parent)?;
        }
        if parents.contains(&id) {
            return Err(ModelError::InvalidWork(format!("{id} lists itself as a parent")));
        }
        if requirement.kind() != ResourceKind::Host {
            return Err(ModelError::InvalidWork(format!(
                "top-level requirement must be host, got {}",
                requirement.kind()
            )));
        }
        Ok(Work {
            id,
            priority: priority.normalized(),
            parents,
            tags,
            requirement,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> &BigDecimal {
        &self.priority
    }

    pub fn parents(&self) -> &BTreeSet<String> {
        &self.parents
    }

    pub fn tags(&self) -> &Properties {
        &self.tags
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

fn check_id(id: &str) -> ModelResult<()> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(ModelError::InvalidWork(format!("bad id `{id}`")))
    }
}

/// A work item placed on a host, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bind {
    pub work_id: String,
    pub host: Properties,
    pub partition: Partition,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_requirement() -> Requirement {
        Requirement::builder(ResourceKind::Host).build().unwrap()
    }

    fn work(id: &str, priority: &str, parents: &[&str]) -> ModelResult<Work> {
        Work::new(
            id,
            priority.parse().unwrap(),
            parents.iter().map(|p| p.to_string()),
            Properties::new(),
            host_requirement(),
        )
    }

    #[test]
    fn accepts_valid_work() {
        let w = work("train_42", "0.5", &["prep_1"]).unwrap();
        assert_eq!(w.id(), "train_42");
        assert!(w.parents().contains("prep_1"));
    }

    #[test]
    fn rejects_bad_ids_and_priority() {
        assert!(work("Train", "0.5", &[]).is_err());
        assert!(work("", "0.5", &[]).is_err());
        assert!(work("a", "1.01", &[]).is_err());
        assert!(work("a", "-0.1", &[]).is_err());
        assert!(work("a", "0", &["bad-id"]).is_err());
    }

    #[test]
    fn rejects_self_parent() {
        let err = work("a", "1", &["a"]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidWork(_)));
    }

    #[test]
    fn requirement_must_be_host() {
        let socket = Requirement::builder(ResourceKind::Socket).build().unwrap();
        assert!(Work::new("a", BigDecimal::zero(), Vec::new(), Properties::new(), socket).is_err());
    }
}
