//! reviewstream module tree
//!
//! Dependency order, leaves first: model and tokenizer feed the
//! aggregation core (aggregate, topn), which the window store, scheduler,
//! and batch runner build on; datasource holds the transport-facing
//! abstractions; pipeline wires the streaming path together.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod datasource;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod scheduler;
pub mod shutdown;
pub mod tokenizer;
pub mod topn;
pub mod window;
