//! hostbind-binder: fits requirement trees onto specification trees.
//!
//! Given what a unit of work asks for and what a host has, the binder
//! decides whether the host fits and exactly which capacity it gives up.
//! Host search runs the binder over a paged inventory until enough hosts
//! are found.
//!
//! ```text
//! CandidateSource ──page──▶ search ──where──▶ Binder::bind ──▶ HostMatch
//!                                               │
//!                                     CapacityLedger (fork/commit)
//! ```
//!
//! # Components
//!
//! - **`binder`**: recursive matching with EACH, TOTAL, and pooled counts
//! - **`ledger`**: remaining capacity per leaf, forked per attempt
//! - **`scope`**: variable lookup for where-conditions along a tree path
//! - **`search`**: paged host search under a host-count range

pub mod binder;
pub mod error;
pub mod ledger;
pub mod scope;
pub mod search;

pub use binder::Binder;
pub use error::{BindError, BindResult, SearchError, SearchResult};
pub use ledger::CapacityLedger;
pub use scope::SpecScope;
pub use search::{
    CandidateSource, DEFAULT_PAGE_SIZE, HostMatch, PagedCandidates, SearchOutcome, search,
    search_work,
};
