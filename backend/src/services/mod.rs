//! Business logic services for the stock backend

pub mod stock;

pub use stock::StockService;
