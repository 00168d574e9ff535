//! Declarative resource graph for a Neptune cluster behind a Lambda front door
//!
//! This crate declares a VPC, a security group, a graph database cluster, a
//! function and an HTTP front door as a typed resource graph, checks the
//! structural properties of that graph, synthesizes it into a template and
//! applies it through a pluggable provisioner in dependency order.
//!
//! ```text
//! StackConfig ──build_stack──> Stack ──DependencyGraph──> waves
//!                                │
//!                                ├──synthesize──> Template ──plan──> ChangeSet
//!                                ├──analyze──> reachability findings
//!                                └──apply(Provisioner)──> ApplyReport
//! ```

pub mod app;
pub mod apply;
pub mod config;
pub mod constructs;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod plan;
pub mod reachability;
pub mod stack;
pub mod synth;

// Re-export commonly used types
pub use app::{build_stack, NeptuneStack};
pub use apply::{apply, ApplyContext, ApplyError, ApplyReport, Provisioner};
pub use config::StackConfig;
pub use errors::{StackError, StackResult};
pub use graph::{DependencyGraph, EdgeKind};
pub use plan::{plan, ChangeSet};
pub use reachability::{analyze, Finding};
pub use stack::{Resource, Stack, Value};
pub use synth::{synthesize, Template};
