//! Top-level module for the Markov model.
//!
//! This module provides a first-order word model, including:
//! - Token classification (`TokenClass`)
//! - Per-word successor counts (`Node`)
//! - The full model with its global counter (`Tree`)
//! - Corpus ingestion (`ModelBuilder`)
//! - Sentence-aware generation (`Generator`)
//! - JSON snapshots and the binary cache

/// Classification of tokens into words, terminators and separators.
pub mod token;

/// Successor counts for a single key.
///
/// Keeps its total as an explicit field so updates stay O(1).
pub mod node;

/// The full key → node table plus the global appearance counter.
pub mod tree;

/// Streaming tokenizer feeding a `Tree`.
pub mod builder;

/// Length-bounded, sentence-terminated text generation.
pub mod generator;

/// JSON snapshot format of a tree (inspection only).
pub mod snapshot;

/// Binary cache of a built tree, stored next to the corpus.
pub mod cache;

/// Linear weighted choice shared by nodes and the tree top level.
///
/// Not exposed publicly.
mod sampler;
