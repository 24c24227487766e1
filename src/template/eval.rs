//! Path resolution over decoded documents

use super::error::{EvaluationError, EvaluationResult};
use super::parser::{FieldPath, Segment};
use serde_json::Value;
use std::borrow::Cow;

impl FieldPath {
    /// Walk `document` along this path
    pub fn resolve<'a>(&self, document: &'a Value) -> EvaluationResult<&'a Value> {
        let mut current = document;

        for segment in self.segments() {
            current = match (segment, current) {
                (Segment::Field(name), Value::Object(map)) => {
                    map.get(name).ok_or_else(|| self.missing())?
                }
                (Segment::Field(name), Value::Array(items)) => match name.parse::<usize>() {
                    Ok(index) => items.get(index).ok_or_else(|| self.missing())?,
                    Err(_) => return Err(self.mismatch("object", current)),
                },
                (Segment::Field(_), other) => return Err(self.mismatch("object", other)),
                (Segment::Index(index), Value::Array(items)) => {
                    items.get(*index).ok_or_else(|| self.missing())?
                }
                (Segment::Index(_), other) => return Err(self.mismatch("array", other)),
            };
        }

        Ok(current)
    }

    fn missing(&self) -> EvaluationError {
        EvaluationError::MissingField {
            path: self.as_str().to_string(),
        }
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> EvaluationError {
        EvaluationError::ShapeMismatch {
            path: self.as_str().to_string(),
            expected,
            found: kind(found),
        }
    }
}

/// Render a resolved scalar for inclusion in a key
pub(crate) fn interpolate<'a>(path: &FieldPath, value: &'a Value) -> EvaluationResult<Cow<'a, str>> {
    match value {
        Value::String(text) => Ok(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Ok(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Ok(Cow::Owned(flag.to_string())),
        other => Err(EvaluationError::NotInterpolatable {
            path: path.as_str().to_string(),
            found: kind(other),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
