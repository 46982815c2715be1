//! The closed set of resource kinds.
//!
//! Every per-kind rule (legal children, key properties, whether the kind
//! carries capacity) is answered by a match on [`ResourceKind`], so adding a
//! kind is a compile error everywhere a rule is missing.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Host,
    Socket,
    Core,
    Cpu,
    Gpu,
    Mount,
    Ram,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Host,
        ResourceKind::Socket,
        ResourceKind::Core,
        ResourceKind::Cpu,
        ResourceKind::Gpu,
        ResourceKind::Mount,
        ResourceKind::Ram,
    ];

    /// Lower-case name, also the qualifier used for variables (`cpu.n_cpu_id`).
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Host => "host",
            ResourceKind::Socket => "socket",
            ResourceKind::Core => "core",
            ResourceKind::Cpu => "cpu",
            ResourceKind::Gpu => "gpu",
            ResourceKind::Mount => "mount",
            ResourceKind::Ram => "ram",
        }
    }

    pub fn from_name(name: &str) -> Option<ResourceKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Leaves carry capacity; everything else groups children.
    pub fn is_capacity(self) -> bool {
        matches!(
            self,
            ResourceKind::Cpu | ResourceKind::Gpu | ResourceKind::Mount | ResourceKind::Ram
        )
    }

    pub fn child_kinds(self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::Host => &[
                ResourceKind::Socket,
                ResourceKind::Gpu,
                ResourceKind::Mount,
                ResourceKind::Ram,
            ],
            ResourceKind::Socket => &[ResourceKind::Core],
            ResourceKind::Core => &[ResourceKind::Cpu],
            ResourceKind::Cpu | ResourceKind::Gpu | ResourceKind::Mount | ResourceKind::Ram => &[],
        }
    }

    pub fn allows_child(self, child: ResourceKind) -> bool {
        self.child_kinds().contains(&child)
    }

    /// Property names that identify a node of this kind among its siblings.
    pub fn key_names(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Host => &["s_host", "n_port"],
            ResourceKind::Socket => &["n_socket_id"],
            ResourceKind::Core => &["n_core_id"],
            ResourceKind::Cpu => &["n_cpu_id"],
            ResourceKind::Gpu => &["s_gpu_id"],
            ResourceKind::Mount => &["s_target"],
            ResourceKind::Ram => &["n_ram_id"],
        }
    }

    /// Only grouping kinds below the host may pool across siblings.
    pub fn allows_any(self) -> bool {
        matches!(self, ResourceKind::Socket | ResourceKind::Core)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_name("disk"), None);
    }

    #[test]
    fn leaves_have_no_children() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.is_capacity(), kind.child_kinds().is_empty(), "{kind}");
        }
    }

    #[test]
    fn host_children() {
        assert!(ResourceKind::Host.allows_child(ResourceKind::Ram));
        assert!(!ResourceKind::Host.allows_child(ResourceKind::Cpu));
        assert!(ResourceKind::Core.allows_child(ResourceKind::Cpu));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ResourceKind::Mount).unwrap();
        assert_eq!(json, r#""mount""#);
    }
}
