//! Host search: find enough hosts for a host requirement.
//!
//! Candidates arrive in pages from a [`CandidateSource`]. Each host is
//! screened by the requirement's where-condition, then bound against a
//! fresh ledger. The scan stops as soon as the host count's upper bound is
//! reached, without pulling further pages.

use std::cmp::Ordering;
use std::collections::HashSet;

use bigdecimal::BigDecimal;
use hostbind_model::{
    Bind, NumberRange, Partition, Properties, Requirement, ResourceKind, SpecId, Specification,
    Work,
};
use tracing::{debug, info, warn};

use crate::binder::Binder;
use crate::error::{SearchError, SearchResult};
use crate::ledger::CapacityLedger;
use crate::scope::SpecScope;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Forward-only supplier of candidate hosts.
pub trait CandidateSource {
    /// Next page of hosts. An empty page ends the scan.
    fn next_page(&mut self) -> SearchResult<Vec<Specification>>;
}

/// In-memory [`CandidateSource`] serving a fixed host list.
#[derive(Debug, Clone)]
pub struct PagedCandidates {
    hosts: Vec<Specification>,
    page_size: usize,
    cursor: usize,
    pages_served: usize,
}

impl PagedCandidates {
    pub fn new(hosts: Vec<Specification>, page_size: usize) -> Self {
        Self {
            hosts,
            page_size: page_size.max(1),
            cursor: 0,
            pages_served: 0,
        }
    }

    /// Non-empty pages handed out so far.
    pub fn pages_served(&self) -> usize {
        self.pages_served
    }
}

impl CandidateSource for PagedCandidates {
    fn next_page(&mut self) -> SearchResult<Vec<Specification>> {
        let end = (self.cursor + self.page_size).min(self.hosts.len());
        let page = self.hosts[self.cursor..end].to_vec();
        self.cursor = end;
        if !page.is_empty() {
            self.pages_served += 1;
        }
        Ok(page)
    }
}

/// A host that satisfied the requirement.
#[derive(Debug, Clone)]
pub struct HostMatch {
    pub host_id: SpecId,
    /// Key properties of the host (`s_host`, `n_port`).
    pub host: Properties,
    pub partition: Partition,
    /// Ledger after the bind, relative to the host's advertised capacity.
    pub ledger: CapacityLedger,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Matched(Vec<HostMatch>),
    Insufficient { found: usize, required: NumberRange },
}

impl SearchOutcome {
    /// Bind records for `work`, empty when the search came up short.
    pub fn binds(&self, work: &Work) -> Vec<Bind> {
        match self {
            SearchOutcome::Matched(matches) => matches
                .iter()
                .map(|m| Bind {
                    work_id: work.id().to_string(),
                    host: m.host.clone(),
                    partition: m.partition.clone(),
                })
                .collect(),
            SearchOutcome::Insufficient { .. } => Vec::new(),
        }
    }
}

/// Search `source` for hosts satisfying `requirement`.
pub fn search(
    requirement: &Requirement,
    tags: &Properties,
    source: &mut dyn CandidateSource,
) -> SearchResult<SearchOutcome> {
    if requirement.kind() != ResourceKind::Host {
        return Err(SearchError::NotHostRequirement(requirement.kind()));
    }
    let Some(wanted) = requirement.count().range() else {
        return Err(SearchError::NotHostRequirement(requirement.kind()));
    };

    let binder = Binder::new(tags);
    let mut seen: HashSet<SpecId> = HashSet::new();
    let mut matched: Vec<HostMatch> = Vec::new();
    let mut scanned = 0usize;

    'pages: loop {
        let page = source.next_page()?;
        if page.is_empty() {
            break;
        }
        for host in &page {
            scanned += 1;
            if host.kind() != ResourceKind::Host {
                warn!(spec = %host.id(), kind = %host.kind(), "candidate is not a host, skipping");
                continue;
            }
            if !seen.insert(host.id().clone()) {
                debug!(host = %host.id(), "host already considered");
                continue;
            }
            let scope = SpecScope::new(tags).with(host);
            if !requirement.condition().is_satisfied(&scope)? {
                debug!(host = %host.id(), "host where condition not met");
                continue;
            }
            let mut ledger = CapacityLedger::new();
            match binder.bind(requirement, host, &mut ledger)? {
                Some(partition) => {
                    debug!(host = %host.id(), "host bound");
                    matched.push(HostMatch {
                        host_id: host.id().clone(),
                        host: host.key_properties(),
                        partition,
                        ledger,
                    });
                    if wanted.is_reached_by(matched.len()) {
                        break 'pages;
                    }
                }
                None => debug!(host = %host.id(), "host cannot satisfy requirement"),
            }
        }
    }

    let found = matched.len();
    if wanted.compare_start(&BigDecimal::from(found as u64)) == Ordering::Greater {
        info!(found, scanned, required = %wanted, "not enough hosts");
        return Ok(SearchOutcome::Insufficient {
            found,
            required: wanted.clone(),
        });
    }
    info!(found, scanned, required = %wanted, "hosts matched");
    Ok(SearchOutcome::Matched(matched))
}

/// [`search`] for a unit of work, using its tags and requirement.
pub fn search_work(work: &Work, source: &mut dyn CandidateSource) -> SearchResult<SearchOutcome> {
    debug!(work = work.id(), "searching hosts");
    search(work.requirement(), work.tags(), source)
}
