//! Incremental, persisted symbol index for source workspaces.
//!
//! An [`indexer::Indexer`] owns the [`index::store::IndexStore`] of one
//! workspace, rebuilds it from tree-sitter extractions of changed files, and
//! persists it as a JSON document. [`query::QueryEngine`] answers lookups
//! against it; [`mcp`] exposes both over JSON-RPC on stdio.

pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod mcp;
pub mod query;

pub use error::{IndexError, Result};
