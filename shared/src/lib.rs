//! Shared domain types and the stock reconstruction engine
//!
//! This crate is pure: it performs no IO and is used by the backend service
//! and by any other component that needs to derive bin balances from counts
//! and ledger transactions.

pub mod engine;
pub mod models;
pub mod types;
pub mod validation;

pub use engine::{reconstruct, ReconstructionOptions, TransactionCutoff};
pub use models::*;
pub use types::*;
pub use validation::*;
