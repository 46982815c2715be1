use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use hostbind_binder::{Binder, CapacityLedger, SpecScope};
use hostbind_model::{Properties, document};
use serde::Serialize;
use tracing::info;

use crate::config::HostbindConfig;

#[derive(Serialize)]
struct BindReport<'a> {
    partition: &'a hostbind_model::Partition,
    /// Remaining capacity per leaf id after the bind.
    remaining: BTreeMap<String, String>,
}

pub fn bind(
    requirement: &Path,
    host: &Path,
    tags: Option<&Path>,
    config: &HostbindConfig,
) -> anyhow::Result<()> {
    let requirement = document::load_requirement(requirement)
        .with_context(|| format!("loading requirement {}", requirement.display()))?;
    let host = document::load_specification(host)
        .with_context(|| format!("loading host {}", host.display()))?;
    let tags = match tags {
        Some(path) => document::load_properties(path)
            .with_context(|| format!("loading tags {}", path.display()))?,
        None => Properties::new(),
    };

    let scope = SpecScope::new(&tags).with(&host);
    if !requirement.condition().is_satisfied(&scope)? {
        anyhow::bail!("{} does not satisfy the host where condition", host.id());
    }

    let mut ledger = CapacityLedger::seeded(&host);
    let Some(partition) = Binder::new(&tags).bind(&requirement, &host, &mut ledger)? else {
        anyhow::bail!("{} cannot satisfy the requirement", host.id());
    };
    info!(host = %host.id(), "bound");

    let remaining = ledger
        .iter()
        .map(|(id, left)| (id.to_string(), left.to_string()))
        .collect();
    super::print_json(
        &BindReport {
            partition: &partition,
            remaining,
        },
        config.output.pretty,
    )
}
