//! Request middleware and extractors

pub mod client_id;
pub mod rate_limit;
pub mod request_metrics;

pub use client_id::ClientId;
