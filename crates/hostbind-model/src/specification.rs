//! Specification trees: the hardware a host actually has.
//!
//! Every node gets a [`SpecId`] built from the key properties of itself and
//! its ancestors, e.g.
//!
//! ```text
//! host[s_host="db1",n_port=22]/socket[n_socket_id=0]/core[n_core_id=3]/cpu[n_cpu_id=7]
//! ```
//!
//! Ids are stable across loads of the same inventory, which is what lets a
//! capacity ledger outlive a single tree instance.

use std::collections::HashSet;
use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use crate::error::{ModelError, ModelResult};
use crate::kind::ResourceKind;
use crate::property::{Properties, PropertyValue};

/// Stable identifier of a specification node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpecId(String);

impl SpecId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segment(kind: ResourceKind, properties: &Properties) -> String {
        let keys: Vec<String> = kind
            .key_names()
            .iter()
            .filter_map(|name| properties.get(name).map(|value| format!("{name}={value}")))
            .collect();
        format!("{kind}[{}]", keys.join(","))
    }

    fn child(&self, segment: &str) -> SpecId {
        SpecId(format!("{}/{segment}", self.0))
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node of a specification tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    id: SpecId,
    kind: ResourceKind,
    properties: Properties,
    capacity: Option<BigDecimal>,
    children: Vec<Specification>,
}

impl Specification {
    /// Validate and assemble a node.
    ///
    /// Leaves must have `capacity`, grouping kinds must not. Children are
    /// re-identified under this node.
    pub fn new(
        kind: ResourceKind,
        properties: Properties,
        capacity: Option<BigDecimal>,
        children: Vec<Specification>,
    ) -> ModelResult<Self> {
        validate_keys(kind, &properties)?;

        let capacity = match (capacity, kind.is_capacity()) {
            (Some(amount), true) if amount < BigDecimal::zero() => {
                return Err(ModelError::InvalidCapacity {
                    kind,
                    reason: format!("available capacity {amount} is negative"),
                });
            }
            (Some(amount), true) => Some(amount.normalized()),
            (None, true) => {
                return Err(ModelError::InvalidCapacity {
                    kind,
                    reason: "leaf specification needs an available capacity".into(),
                });
            }
            (Some(_), false) => {
                return Err(ModelError::InvalidCapacity {
                    kind,
                    reason: "only leaf specifications carry capacity".into(),
                });
            }
            (None, false) => None,
        };

        let mut seen = HashSet::new();
        for child in &children {
            if !kind.allows_child(child.kind) {
                return Err(ModelError::IllegalChild {
                    parent: kind,
                    child: child.kind,
                });
            }
            if !seen.insert((child.kind, child.key_properties())) {
                return Err(ModelError::DuplicateSibling {
                    kind: child.kind,
                    key: SpecId::segment(child.kind, &child.properties),
                });
            }
        }

        if kind == ResourceKind::Host {
            let rams = children.iter().filter(|c| c.kind == ResourceKind::Ram).count();
            if rams != 1 {
                return Err(ModelError::InvalidSpecification {
                    kind,
                    reason: format!("a host needs exactly one ram specification, found {rams}"),
                });
            }
        }

        let mut spec = Specification {
            id: SpecId(SpecId::segment(kind, &properties)),
            kind,
            properties,
            capacity,
            children,
        };
        let id = spec.id.clone();
        for child in &mut spec.children {
            child.rebase(&id);
        }
        Ok(spec)
    }

    pub fn leaf(kind: ResourceKind, properties: Properties, capacity: BigDecimal) -> ModelResult<Self> {
        Self::new(kind, properties, Some(capacity), Vec::new())
    }

    pub fn branch(
        kind: ResourceKind,
        properties: Properties,
        children: Vec<Specification>,
    ) -> ModelResult<Self> {
        Self::new(kind, properties, None, children)
    }

    fn rebase(&mut self, parent: &SpecId) {
        self.id = parent.child(&SpecId::segment(self.kind, &self.properties));
        let id = self.id.clone();
        for child in &mut self.children {
            child.rebase(&id);
        }
    }

    pub fn id(&self) -> &SpecId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Key properties plus every other tag on the node.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Available capacity; `Some` exactly on leaves.
    pub fn capacity(&self) -> Option<&BigDecimal> {
        self.capacity.as_ref()
    }

    pub fn children(&self) -> &[Specification] {
        &self.children
    }

    pub fn children_of(&self, kind: ResourceKind) -> impl Iterator<Item = &Specification> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    pub fn key_properties(&self) -> Properties {
        self.properties.select(self.kind.key_names())
    }

    /// This node and everything below it, depth first.
    pub fn descendants(&self) -> Vec<&Specification> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

fn validate_keys(kind: ResourceKind, properties: &Properties) -> ModelResult<()> {
    for &name in kind.key_names() {
        let value = properties
            .get(name)
            .ok_or(ModelError::MissingKey { kind, name })?;
        let invalid = |reason: &str| ModelError::InvalidKey {
            kind,
            name,
            reason: reason.to_string(),
        };
        match value {
            PropertyValue::Number(n) => {
                if !n.is_integer() || *n < BigDecimal::zero() {
                    return Err(invalid("must be a non-negative whole number"));
                }
                if name == "n_port" && (*n < BigDecimal::from(1) || *n > BigDecimal::from(65535)) {
                    return Err(invalid("must be between 1 and 65535"));
                }
            }
            PropertyValue::String(s) if s.is_empty() => return Err(invalid("must not be empty")),
            PropertyValue::String(_) => {}
            PropertyValue::Boolean(_) => return Err(invalid("must not be boolean")),
        }
    }
    Ok(())
}
