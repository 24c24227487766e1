//! Key Template Evaluator
//!
//! Compiles a key-format string such as `events:{{user_id}}` once at startup
//! and evaluates it against decoded message bodies to produce list keys.
//!
//! # Syntax
//!
//! - Placeholders are written `{{ path }}`; whitespace inside the braces is ignored
//! - A path is a `.` separated list of segments (`user.id`)
//! - A segment may carry array indexes (`items[0]`, `matrix[1][2]`)
//! - A purely numeric segment indexes arrays (`items.0.id`) and names fields on objects
//! - Everything outside placeholders is copied verbatim
//!
//! # Example
//!
//! ```rust
//! use caplist::template::KeyTemplate;
//! use serde_json::json;
//!
//! let template = KeyTemplate::compile("events:{{user_id}}").unwrap();
//! let key = template.evaluate(&json!({"user_id": "u1", "type": "click"})).unwrap();
//! assert_eq!(key, "events:u1");
//! ```
//!
//! A compiled template is immutable, so a single instance can be shared
//! across any number of concurrent message handlers.

mod error;
mod eval;
mod parser;

pub use error::{EvaluationError, EvaluationResult, TemplateSyntaxError};
pub use parser::{FieldPath, Segment};

use serde_json::Value;

/// A single compiled piece of a key template
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Literal(String),
    Placeholder(FieldPath),
}

/// Compiled key-format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    format: String,
    pieces: Vec<Piece>,
}

impl KeyTemplate {
    /// Compile a key-format string, validating every placeholder
    pub fn compile(format: &str) -> Result<Self, TemplateSyntaxError> {
        let pieces = parser::parse(format)?;
        Ok(Self {
            format: format.to_string(),
            pieces,
        })
    }

    /// Resolve every placeholder against `document` and return the concrete key
    pub fn evaluate(&self, document: &Value) -> EvaluationResult<String> {
        let mut key = String::with_capacity(self.format.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => key.push_str(text),
                Piece::Placeholder(path) => {
                    let value = path.resolve(document)?;
                    key.push_str(&eval::interpolate(path, value)?);
                }
            }
        }
        Ok(key)
    }

    /// The format string this template was compiled from
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Paths referenced by the template, in order of appearance
    pub fn fields(&self) -> impl Iterator<Item = &FieldPath> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Placeholder(path) => Some(path),
            Piece::Literal(_) => None,
        })
    }

    /// True when the template has no placeholders and always yields the same key
    pub fn is_static(&self) -> bool {
        self.fields().next().is_none()
    }
}

impl std::str::FromStr for KeyTemplate {
    type Err = TemplateSyntaxError;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        Self::compile(format)
    }
}

impl std::fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format)
    }
}
