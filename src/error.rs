//! Rich diagnostic error types for the porsa engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text so callers know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the porsa engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum PorsaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Seed(#[from] crate::seeds::SeedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

/// Input rejection, the only error surface of `Engine::process_question`.
/// Every accepted question produces an answer; these variants cover the
/// inputs the pipeline refuses to look at.
#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("empty question: input contains no text")]
    #[diagnostic(
        code(porsa::query::empty),
        help("Provide a non-empty question. Whitespace-only input counts as empty.")
    )]
    Empty,

    #[error("question too long: {length} characters, maximum is {max}")]
    #[diagnostic(
        code(porsa::query::too_long),
        help(
            "Shorten the question or raise `max_question_len` in EngineConfig. \
             Length is counted in Unicode scalar values, not bytes."
        )
    )]
    TooLong { length: usize, max: usize },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("unknown node: {id}")]
    #[diagnostic(
        code(porsa::graph::unknown_node),
        help(
            "No node with this identifier exists in the knowledge graph. \
             Declare the node in the seed pack before referencing it from \
             an edge or a rule condition."
        )
    )]
    UnknownNode { id: String },

    #[error("duplicate node: {id}")]
    #[diagnostic(
        code(porsa::graph::duplicate_node),
        help("Node identifiers must be unique. Remove or rename the second declaration.")
    )]
    DuplicateNode { id: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(porsa::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },
}

/// Convenience alias for functions returning porsa results.
pub type PorsaResult<T> = std::result::Result<T, PorsaError>;
