pub mod context;
pub mod error;
pub mod models;
pub mod ports;
pub mod prompt;
