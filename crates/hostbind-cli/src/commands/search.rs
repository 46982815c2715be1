use std::path::Path;

use anyhow::Context;
use hostbind_binder::{PagedCandidates, SearchOutcome, search_work};
use hostbind_model::document;
use tracing::info;

use crate::config::HostbindConfig;

pub fn search(
    work: &Path,
    hosts: &Path,
    page_size: Option<usize>,
    config: &HostbindConfig,
) -> anyhow::Result<()> {
    let work = document::load_work(work)
        .with_context(|| format!("loading work {}", work.display()))?;
    let hosts = document::load_hosts(hosts)
        .with_context(|| format!("loading hosts {}", hosts.display()))?;
    let page_size = page_size.unwrap_or(config.search.page_size);

    info!(work = work.id(), hosts = hosts.len(), page_size, "searching inventory");
    let mut source = PagedCandidates::new(hosts, page_size);
    let outcome = search_work(&work, &mut source)?;

    if let SearchOutcome::Insufficient { found, required } = &outcome {
        anyhow::bail!(
            "only {found} host(s) can take {}, {required} required",
            work.id()
        );
    }
    super::print_json(&outcome.binds(&work), config.output.pretty)
}
