//! Shared types for the fstkit weighted finite-state transducer toolkit.
//!
//! # Architecture
//!
//! - [`label`] -- Label and state identifiers, reserved boundary labels
//! - [`semiring`] -- The [`Semiring`] trait with tropical and log weights
//! - [`symbols`] -- Bidirectional symbol table (string <-> label)
//! - [`error`] -- The [`FstError`] taxonomy shared by every crate

pub mod error;
pub mod label;
pub mod semiring;
pub mod symbols;

pub use error::FstError;
pub use label::{
    BOS, EOS, EPSILON, Label, NO_STATE_ID, RESERVED_LABEL_BASE, StateId, char_label,
    label_char, labels_to_string, string_labels,
};
pub use semiring::{DELTA, LogWeight, Semiring, SemiringKind, TropicalWeight, convert_weight};
pub use symbols::SymbolTable;
