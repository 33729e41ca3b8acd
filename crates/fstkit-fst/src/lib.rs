//! Mutable weighted finite-state transducers.
//!
//! This crate provides the [`VectorFst`] store and the algorithms built on
//! it: rational operations, composition, epsilon removal, determinization,
//! minimization, shortest paths and path enumeration. Weights come from any
//! [`Semiring`] in `fstkit-core`.
//!
//! # Architecture
//!
//! - [`fst`] -- The automaton store: states, arcs, final weights
//! - [`properties`] -- Cached structural property bits
//! - [`compile`] -- String compilation (`accep`, `cross_strings`, `string_map`)
//! - [`rational`] -- Union, concatenation, closure and bounded repetition
//! - [`compose`] -- Epsilon-filtered composition and intersection
//! - [`difference`] -- Difference of unweighted acceptors
//! - [`transform`] -- Project, invert, reverse, cross, weight conversion
//! - [`connect`] -- Trimming and topological order
//! - [`rmepsilon`] -- Epsilon removal
//! - [`encode`] -- Label/weight encoding into acceptor labels
//! - [`determinize`] -- Weighted determinization with pruning and a state ceiling
//! - [`minimize`] -- Partition-refinement minimization
//! - [`optimize`] -- Canonical optimization pipeline
//! - [`prune`] -- Weight-threshold pruning
//! - [`shortest_distance`] -- Single-source distances over acyclic automata
//! - [`shortest_path`] -- N-best paths with deterministic tie-breaking
//! - [`paths`] -- Path enumeration (explicit DFS stack)
//! - [`format`] / [`records`] / [`io`] -- Binary serialization
//! - [`export`] -- AT&T text and Graphviz output

pub mod compile;
pub mod compose;
pub mod connect;
pub mod determinize;
pub mod difference;
pub mod encode;
pub mod export;
pub mod format;
pub mod fst;
pub mod io;
pub mod minimize;
pub mod optimize;
pub mod paths;
pub mod properties;
pub mod prune;
pub mod rational;
pub mod records;
pub mod rmepsilon;
pub mod shortest_distance;
pub mod shortest_path;
pub mod transform;

pub use compile::{
    StringMapEntry, accep, accep_labels, cross_strings, epsilon_machine, sigma_star_labels,
    string_map,
};
pub use compose::{ComposeOptions, compose, compose_with_options, intersect};
pub use determinize::{DeterminizeOptions, Determinized, determinize, determinize_with_options};
pub use difference::difference;
pub use encode::{EncodeTable, EncodeType};
pub use export::{to_dot, to_text};
pub use fst::{Arc, ArcSortType, VectorFst};
pub use fstkit_core::{
    BOS, DELTA, EOS, EPSILON, FstError, Label, LogWeight, NO_STATE_ID, Semiring, SemiringKind,
    StateId, SymbolTable, TropicalWeight,
};
pub use io::{LoadedFst, read_fst};
pub use minimize::minimize;
pub use optimize::optimize;
pub use paths::PathIterator;
pub use properties::Properties;
pub use prune::prune;
pub use rational::{ClosureType, closure, closure_range, concat, union, union_all};
pub use rmepsilon::rm_epsilon;
pub use shortest_distance::{shortest_distance, total_weight};
pub use shortest_path::{ShortestPathOptions, WeightedPath, n_best, shortest_path};
pub use transform::{ProjectType, convert_weights, cross, invert, project, reverse};

/// Upper bound on queue relaxations in the generic distance loops
/// (epsilon closure, pruning distances). Acts as a safety limit for
/// cycles whose weights never converge.
pub const MAX_RELAXATIONS: usize = 1 << 22;
