//! Context-dependent rewrite rules over fstkit transducers.
//!
//! [`cdrewrite`] compiles a rule "rewrite τ when preceded by λ and followed
//! by ρ" into a single weighted transducer; the [`rewrite`] functions apply
//! compiled rules to strings or lattices and read off the results.
//!
//! # Architecture
//!
//! - [`markers`] -- Boundary acceptors, Σ* helpers and the internal marker labels
//! - [`cdrewrite`] -- The rule compiler (left-to-right, right-to-left, simultaneous)
//! - [`rewrite`] -- Applying rules: all, n-best, optimal and single best outputs
//! - [`utils`] -- Insertion, deletion, weighting, joining, priority union, cascades
//! - [`paradigm`] -- Inflectional paradigms with flattened inheritance
//! - [`batch`] -- Parallel compilation and application with cancellation
//! - [`error`] -- [`RewriteError`]

pub mod batch;
pub mod cdrewrite;
pub mod error;
pub mod markers;
pub mod paradigm;
pub mod rewrite;
pub mod utils;

pub use batch::{
    BatchOptions, CancellationToken, RuleParts, compile_rules, rewrite_batch, top_rewrite_batch,
};
pub use cdrewrite::{Direction, Mode, RewriteMode, RuleOptions, cdrewrite};
pub use error::RewriteError;
pub use markers::{bos, eos, sigma_star, sigma_star_labels};
pub use paradigm::{FormEntry, Paradigm, Slot};
pub use rewrite::{
    RewriteInput, matches, one_top_rewrite, optimal_rewrites, rewrite_lattice, rewrites,
    top_rewrite, top_rewrites,
};
pub use utils::{add_weight, cascade, delete, insert, join, priority_union};
