// Error taxonomy shared by the automaton store, the algorithms and the
// binary format.

use crate::label::{Label, StateId};

/// Error type for automaton construction, algorithms and (de)serialization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FstError {
    /// A weight outside the semiring's domain (NaN or negative infinity).
    #[error("invalid weight {0}: outside the semiring domain")]
    InvalidWeight(f32),

    /// Mixing semirings, or converting a value the target cannot represent.
    #[error("incompatible semiring: expected {expected}, got {actual}")]
    IncompatibleSemiring { expected: String, actual: String },

    /// Difference or complement requested on an automaton with non-trivial weights.
    #[error("operation is only defined for unweighted automata")]
    UnsupportedForWeighted,

    /// Shortest distance or path enumeration over a cycle on a successful path.
    #[error("automaton has a cycle on a successful path")]
    CyclicAutomaton,

    /// A state index that does not exist in the automaton.
    #[error("state {state} out of range (automaton has {num_states} states)")]
    StateIndexOutOfRange { state: StateId, num_states: usize },

    /// A single best path was requested but several paths share the best weight.
    #[error("{count} outputs tie for the best weight")]
    AmbiguousTie { count: usize },

    /// Bounded determinization stopped at its state ceiling.
    #[error("determinization truncated at {max_states} states")]
    Truncated { max_states: usize },

    /// The operation requires identical input and output labels on every arc.
    #[error("operation requires an acceptor")]
    NotAnAcceptor,

    /// The automaton does not encode exactly one linear string.
    #[error("automaton is not a single string")]
    NotAString,

    /// A label that has no character or symbol table entry.
    #[error("label {0} cannot be rendered as text")]
    UnrepresentableLabel(Label),

    /// The automaton has no start state.
    #[error("automaton is empty")]
    EmptyAutomaton,

    #[error("invalid magic number in binary header")]
    InvalidMagic,

    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("invalid symbol table: {0}")]
    InvalidSymbolTable(String),
}
