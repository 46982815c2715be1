//! hostbind-model: the data model shared by the binder and the CLI.
//!
//! Two mirrored trees describe a match:
//!
//! ```text
//! Requirement (the ask)           Specification (the have)
//!   host [1,1]                      host {s_host, n_port}
//!   ├── socket ?                    ├── socket {n_socket_id}
//!   │   └── core [1,2]              │   └── core {n_core_id}
//!   │       └── cpu [1,∞) 50000     │       └── cpu {n_cpu_id}  capacity 100000
//!   ├── gpu / mount / ram           └── gpu / mount / ram       capacity …
//! ```
//!
//! A successful bind yields a [`Partition`] tree recording which
//! specification nodes were chosen and how much capacity each leaf gave up.
//!
//! # Components
//!
//! - **`range`**: inclusive decimal ranges and cardinalities
//! - **`property`**: prefix-typed property values (`b_`, `n_`, `s_`)
//! - **`expression`**: the where-condition DSL and its evaluator
//! - **`kind`**: the closed set of resource kinds and their dispatch table
//! - **`requirement`** / **`specification`** / **`partition`**: the trees
//! - **`work`**: the unit of work and the bind record handed downstream
//! - **`document`**: JSON/TOML documents converted into validated trees

mod decimal;
pub mod document;
pub mod error;
pub mod expression;
pub mod kind;
pub mod partition;
pub mod property;
pub mod range;
pub mod requirement;
pub mod specification;
pub mod work;

pub use error::{ExpressionError, ModelError, ModelResult};
pub use expression::{Builtin, Expression};
pub use kind::ResourceKind;
pub use partition::Partition;
pub use property::{Properties, PropertyValue, Scope, ValueType};
pub use range::{Cardinality, CardinalityPolicy, NumberRange};
pub use requirement::{Requirement, RequirementBuilder};
pub use specification::{SpecId, Specification};
pub use work::{Bind, Work};
