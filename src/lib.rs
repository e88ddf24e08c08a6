pub mod config;
pub mod dates;
pub mod export;
pub mod facebook;
pub mod mail;
pub mod pipeline;
pub mod tracing;
