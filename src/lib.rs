pub mod config;
pub mod error;
pub mod history;
pub mod ops;
pub mod output;
pub mod pdf;
pub mod pipeline;
