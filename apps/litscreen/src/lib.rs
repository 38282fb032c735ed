//! # litscreen
//!
//! File, CLI and HTTP surfaces around `litscreen-core`.
//!
//! - [`sources`] turns downloaded database payloads into canonical records
//! - [`store`] serves abstracts from a local JSON file
//! - [`report`] writes the JSONL/CSV/PRISMA outputs
//! - [`cli`] and [`api`] drive the pipeline from a terminal or over HTTP

pub mod api;
pub mod cli;
pub mod pacer;
pub mod report;
pub mod settings;
pub mod sources;
pub mod store;
