//! Template Error Types

/// Malformed key-format configuration, fatal at startup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateSyntaxError {
    #[error("unterminated placeholder starting at byte {position}")]
    Unterminated { position: usize },

    #[error("empty placeholder at byte {position}")]
    EmptyPlaceholder { position: usize },

    #[error("empty segment in path '{path}' at byte {position}")]
    EmptySegment { path: String, position: usize },

    #[error("invalid character {character:?} in path '{path}' at byte {position}")]
    InvalidCharacter {
        character: char,
        path: String,
        position: usize,
    },

    #[error("invalid index '{index}' in path '{path}' at byte {position}")]
    InvalidIndex {
        index: String,
        path: String,
        position: usize,
    },
}

/// A document that does not satisfy the template's placeholders
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("missing field '{path}'")]
    MissingField { path: String },

    #[error("field '{path}' expected {expected} but found {found}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{path}' is {found} and cannot be interpolated")]
    NotInterpolatable { path: String, found: &'static str },
}

/// Result type for template evaluation
pub type EvaluationResult<T> = Result<T, EvaluationError>;
