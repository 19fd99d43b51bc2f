//! HTTP handlers for the stock backend

mod health;
mod stock;

pub use health::*;
pub use stock::*;
