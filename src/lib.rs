pub mod chain_client;
pub mod event_sink;
pub mod ingest_core;
pub mod repository;
