//! Caching and invocation-lifecycle layer
//!
//! This module provides the in-memory query cache that sits between the
//! endpoint clients and the presentation layer (freshness windows,
//! in-flight deduplication, retained errors) and the mutation runner for
//! one-shot operations. Nothing here survives a process restart.

pub mod mutation;
pub mod query;

pub use mutation::{MutationRunner, MutationStatus, MutationView};
pub use query::{EntryView, QueryCache};
