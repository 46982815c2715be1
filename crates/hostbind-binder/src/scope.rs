//! Variable scope for where-conditions.
//!
//! A candidate sees the work tags unqualified and the properties of every
//! specification node on its path qualified by kind. When the same kind
//! appears twice on a path the nearest node wins.

use hostbind_model::{Properties, PropertyValue, Scope, Specification};

#[derive(Debug, Clone)]
pub struct SpecScope<'a> {
    tags: &'a Properties,
    layers: Vec<&'a Specification>,
}

impl<'a> SpecScope<'a> {
    pub fn new(tags: &'a Properties) -> Self {
        Self {
            tags,
            layers: Vec::new(),
        }
    }

    /// A scope one level deeper, with `spec` as the innermost node.
    pub fn with(&self, spec: &'a Specification) -> SpecScope<'a> {
        let mut layers = self.layers.clone();
        layers.push(spec);
        SpecScope {
            tags: self.tags,
            layers,
        }
    }
}

impl Scope for SpecScope<'_> {
    fn lookup(&self, name: &str) -> Option<&PropertyValue> {
        match name.split_once('.') {
            Some((kind, property)) => self
                .layers
                .iter()
                .rev()
                .find(|spec| spec.kind().name() == kind)
                .and_then(|spec| spec.properties().get(property)),
            None => self.tags.get(name),
        }
    }
}
