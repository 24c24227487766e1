//! Key-format string parsing
//!
//! Splits a format string into literal text and placeholder paths. All syntax
//! checking happens here so that evaluation only has to deal with documents.

use super::error::TemplateSyntaxError;
use super::Piece;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object field, or array position when the name is numeric
    Field(String),
    /// Explicit `[N]` array index
    Index(usize),
}

/// Parsed placeholder path such as `user.devices[0].id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The path as written in the format string (without braces)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split `format` into literal and placeholder pieces
pub(crate) fn parse(format: &str) -> Result<Vec<Piece>, TemplateSyntaxError> {
    let mut pieces = Vec::new();
    let mut rest = format;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            pieces.push(Piece::Literal(rest[..start].to_string()));
        }

        let position = offset + start;
        let body = &rest[start + OPEN.len()..];
        let end = body
            .find(CLOSE)
            .ok_or(TemplateSyntaxError::Unterminated { position })?;

        let path = parse_path(body[..end].trim(), position)?;
        pieces.push(Piece::Placeholder(path));

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest.to_string()));
    }

    Ok(pieces)
}

fn parse_path(expr: &str, position: usize) -> Result<FieldPath, TemplateSyntaxError> {
    if expr.is_empty() {
        return Err(TemplateSyntaxError::EmptyPlaceholder { position });
    }

    let mut segments = Vec::new();
    for part in expr.split('.') {
        let (name, mut indexes) = match part.find('[') {
            Some(bracket) => (&part[..bracket], &part[bracket..]),
            None => (part, ""),
        };

        if name.is_empty() && indexes.is_empty() {
            return Err(TemplateSyntaxError::EmptySegment {
                path: expr.to_string(),
                position,
            });
        }

        if let Some(character) = name.chars().find(|c| !is_name_char(*c)) {
            return Err(TemplateSyntaxError::InvalidCharacter {
                character,
                path: expr.to_string(),
                position,
            });
        }

        if !name.is_empty() {
            segments.push(Segment::Field(name.to_string()));
        }

        while !indexes.is_empty() {
            let invalid = |index: &str| TemplateSyntaxError::InvalidIndex {
                index: index.to_string(),
                path: expr.to_string(),
                position,
            };

            let inner = indexes.strip_prefix('[').ok_or_else(|| invalid(indexes))?;
            let close = inner.find(']').ok_or_else(|| invalid(indexes))?;
            let index = inner[..close]
                .parse::<usize>()
                .map_err(|_| invalid(&inner[..close]))?;

            segments.push(Segment::Index(index));
            indexes = &inner[close + 1..];
        }
    }

    Ok(FieldPath {
        raw: expr.to_string(),
        segments,
    })
}

fn is_name_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']'))
}
