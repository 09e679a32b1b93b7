//! Deferred string templates.
//!
//! An [`Expression`] is parsed when an automation is decoded but only
//! evaluated when the step that owns it runs, so it can reference values
//! bound by earlier steps (`https://example.com/${user.id}`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExpressionError;

/// Read access to the variables an expression may reference.
pub trait Variables {
    fn get(&self, name: &str) -> Option<&Value>;
}

impl Variables for std::collections::HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<&Value> {
        std::collections::HashMap::get(self, name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Accessor {
    Key(String),
    Index(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Reference {
    root: String,
    path: Vec<Accessor>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Reference(Reference),
}

/// Template made of literal text and `${name.key[0]}` references.
///
/// `$${` produces a literal `${`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression {
    source: String,
    segments: Vec<Segment>,
}

impl Expression {
    pub fn parse(source: impl Into<String>) -> Result<Self, ExpressionError> {
        let source = source.into();
        let segments = parse_segments(&source)?;
        Ok(Self { source, segments })
    }

    /// Expression that always yields `text` verbatim.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let source = text.replace("${", "$${");
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Literal(text)]
        };
        Self { source, segments }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root variable names referenced by the template, in order of appearance.
    pub fn variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Reference(reference) => Some(reference.root.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Evaluate against `vars`.
    ///
    /// A template consisting of a single reference yields the referenced
    /// value unchanged; anything else is rendered into a string.
    pub fn evaluate(&self, vars: &dyn Variables) -> Result<Value, ExpressionError> {
        if let [Segment::Reference(reference)] = self.segments.as_slice() {
            return resolve(reference, vars).cloned();
        }

        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Reference(reference) => {
                    let value = resolve(reference, vars)?;
                    rendered.push_str(&render_scalar(value, &reference.to_string())?);
                }
            }
        }
        Ok(Value::String(rendered))
    }

    /// Evaluate and require a string-compatible result.
    pub fn evaluate_string(&self, vars: &dyn Variables) -> Result<String, ExpressionError> {
        let value = self.evaluate(vars)?;
        render_scalar(&value, &self.source)
    }
}

impl TryFrom<String> for Expression {
    type Error = ExpressionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Expression::parse(value)
    }
}

impl From<Expression> for String {
    fn from(value: Expression) -> Self {
        value.source
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for accessor in &self.path {
            match accessor {
                Accessor::Key(key) => write!(f, ".{key}")?,
                Accessor::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn parse_segments(source: &str) -> Result<Vec<Segment>, ExpressionError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(pos) = rest.find('$') {
        let offset = source.len() - rest.len() + pos;
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("$${") {
            literal.push_str("${");
            rest = &tail[3..];
        } else if let Some(body) = tail.strip_prefix("${") {
            let end = body
                .find('}')
                .ok_or(ExpressionError::Unterminated(offset))?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Reference(parse_reference(&body[..end])?));
            rest = &body[end + 1..];
        } else {
            literal.push('$');
            rest = &tail[1..];
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn parse_reference(raw: &str) -> Result<Reference, ExpressionError> {
    let invalid = || ExpressionError::InvalidReference(raw.trim().to_string());
    let text = raw.trim();

    let (root, mut rest) = split_identifier(text).ok_or_else(invalid)?;
    let mut path = Vec::new();

    while !rest.is_empty() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            let (key, remaining) = split_identifier(after_dot).ok_or_else(invalid)?;
            path.push(Accessor::Key(key.to_string()));
            rest = remaining;
        } else if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket.find(']').ok_or_else(invalid)?;
            let index = after_bracket[..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid())?;
            path.push(Accessor::Index(index));
            rest = &after_bracket[close + 1..];
        } else {
            return Err(invalid());
        }
    }

    Ok(Reference {
        root: root.to_string(),
        path,
    })
}

fn split_identifier(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    Some((&text[..end], &text[end..]))
}

fn resolve<'a>(reference: &Reference, vars: &'a dyn Variables) -> Result<&'a Value, ExpressionError> {
    let mut current = vars
        .get(&reference.root)
        .ok_or_else(|| ExpressionError::UnknownVariable(reference.root.clone()))?;
    let mut walked = reference.root.clone();

    for accessor in &reference.path {
        let next = match (accessor, current) {
            (Accessor::Key(key), Value::Object(map)) => map.get(key),
            (Accessor::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        };
        let attribute = match accessor {
            Accessor::Key(key) => key.clone(),
            Accessor::Index(index) => format!("[{index}]"),
        };
        current = next.ok_or_else(|| ExpressionError::UnknownAttribute {
            path: walked.clone(),
            attribute: attribute.clone(),
        })?;
        match accessor {
            Accessor::Key(_) => {
                walked.push('.');
                walked.push_str(&attribute);
            }
            Accessor::Index(_) => walked.push_str(&attribute),
        }
    }
    Ok(current)
}

fn render_scalar(value: &Value, label: &str) -> Result<String, ExpressionError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            Err(ExpressionError::NotRenderable(label.to_string()))
        }
    }
}
