//! Core ingestion: configuration, running metrics, and the poll loop.

pub mod config;
pub mod ingestor;
pub mod metrics;
