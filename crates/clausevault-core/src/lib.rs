//! # Clausevault Core
//!
//! Shared, runtime-free logic for Clausevault: data models, the sentence
//! chunker, PII redaction, the store abstraction, and the three retrieval
//! engines (semantic, keyword, hybrid).
//!
//! This crate contains no tokio, sqlx, network I/O, or other native-only
//! dependencies. Chunking, redaction, and similarity arithmetic are pure
//! CPU-bound computations and never block.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod redact;
pub mod search;
pub mod store;
