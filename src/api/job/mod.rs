pub mod models;
pub mod dto;
pub mod handlers;
pub mod query;
pub mod service;
pub mod stats;

// Re-export commonly used types
pub use service::{JobService, ServiceSettings};
