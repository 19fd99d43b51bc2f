//! Domain models for stock reconstruction

mod balance;
mod count;
mod transaction;

pub use balance::*;
pub use count::*;
pub use transaction::*;
