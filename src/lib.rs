#![deny(missing_docs)]

//! Core library for the inventory scan ingestion server.

/// HTTP routing, request logging middleware, and REST handlers.
pub mod api;
/// API-key extraction and the configurable key gate.
pub mod auth;
/// Timestamp formatting helpers.
pub mod clock;
/// Environment-driven configuration management.
pub mod config;
/// CSV and JSON export renderers.
pub mod export;
/// Ingest payload validation and application.
pub mod ingest;
/// Inventory records, the store abstraction, and read-side queries.
pub mod inventory;
/// Structured logging and tracing setup.
pub mod logging;
/// In-memory log of inbound requests.
pub mod request_log;
