//! # porsa
//!
//! A rule-based Persian question-answering engine: intent detection,
//! entity extraction, knowledge-graph activation, and bounded chained
//! inference over a seeded concept graph.
//!
//! ## Architecture
//!
//! - **Text** (`text`): Persian normalization and stop-word tokenization
//! - **Intent** (`intent`): ordered pattern table, first match wins
//! - **Entities** (`entity`): lexicon and capture rules for person, topic, action, location
//! - **Knowledge graph** (`graph`): weighted concept graph (petgraph + dashmap) with activation spreading
//! - **Reasoning** (`reason`): closed-vocabulary rule conditions, bounded multi-step chaining
//! - **Responses** (`respond`): data-driven Persian templates with entity slots
//! - **Seeds** (`seeds`): TOML knowledge packs, one bundled into the binary
//!
//! ## Library usage
//!
//! ```no_run
//! use porsa::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let answer = engine.process_question("سلام").unwrap();
//! println!("{} ({:.2})", answer.text, answer.confidence);
//! ```

pub mod engine;
pub mod entity;
pub mod error;
pub mod evidence;
pub mod export;
pub mod graph;
pub mod history;
pub mod intent;
pub mod reason;
pub mod respond;
pub mod seeds;
pub mod text;
