//! # askdb-generator
//!
//! Turns natural-language questions into SQL by prompting a generative text
//! model with the target database's schema.
//!
//! The model sits behind the [`TextModel`] trait. [`GeminiModel`] talks to the
//! Google Gemini API; tests and embedders can supply their own.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use askdb_core::{DatabaseSchema, Dialect};
//! use askdb_generator::{GeminiConfig, GeminiModel, QueryGenerator};
//!
//! let model = GeminiModel::new(GeminiConfig::new("my-api-key")).unwrap();
//! let generator = QueryGenerator::new(Arc::new(model));
//! let schema = DatabaseSchema::new(Dialect::Sqlite, Vec::new());
//! let sql = generator.generate_query("List every table", &schema).unwrap();
//! println!("{sql}");
//! ```

pub mod error;
pub mod gemini;
pub mod generator;
pub mod model;
pub mod prompt;

pub use error::{GeneratorError, Result};
pub use gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT, GeminiConfig, GeminiModel};
pub use generator::{QueryGenerator, clean_reply};
pub use model::TextModel;
