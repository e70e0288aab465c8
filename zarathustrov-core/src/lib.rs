//! Word-level Markov text generation library.
//!
//! This crate provides the whole model side of the bot:
//! - Corpus tokenization into a weighted successor table (`Tree`)
//! - Weighted random sampling over that table
//! - Sentence-aware, length-bounded text generation
//! - JSON snapshots and a binary cache of a built tree
//!
//! Posting and scheduling live in the binaries; nothing here touches the network.

/// Core Markov model and generation logic.
///
/// Exposes the tree, its builder, and the generator. The sampling
/// primitive stays internal.
pub mod model;

/// Error type shared by every operation of the crate.
pub mod error;

/// I/O utilities (corpus loading, path helpers).
pub mod io;

pub use error::ModelError;
pub use model::builder::{CorpusRange, ModelBuilder};
pub use model::generator::{Generator, GeneratorConfig};
pub use model::tree::Tree;
