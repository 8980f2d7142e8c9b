//! Path templates with optional groups.
//!
//! # Grammar
//! ```text
//! template := ( literal | ":" name | "(" literal* ":" name ")" )*
//! name     := [A-Za-z0-9_]+
//! ```
//! A bare `:name` is required and must have a value. A parenthesized group
//! is optional: its literal prefix and its value are emitted together when
//! the value is set, and dropped together when it is not. For example
//! `lists(/:listId)(/roster/:action)` renders as `lists`, `lists/a`, or
//! `lists/a/roster/member`.
//!
//! Values are checked against the segment validators before substitution
//! and percent-encoded as single path segments afterwards.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

use crate::error::PathError;

/// Characters escaped inside one path segment. `@` and `.` stay literal
/// so list ids and member addresses read naturally in the URI.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Segment name to value; `None` marks a known segment with no value.
pub type PathValues = BTreeMap<String, Option<String>>;

/// Segment name to the pattern its value must match.
pub type SegmentValidators = BTreeMap<&'static str, &'static Regex>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Literal(String),
    Required(String),
    Optional { prefix: String, name: String },
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    nodes: Vec<Node>,
}

impl PathTemplate {
    pub fn parse(source: &str) -> Result<Self, PathError> {
        let malformed = |reason: &str| PathError::MalformedTemplate {
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut nodes = Vec::new();
        let mut chars = source.chars().peekable();
        let mut literal = String::new();

        while let Some(c) = chars.next() {
            match c {
                ':' => {
                    let name = take_name(&mut chars);
                    if name.is_empty() {
                        return Err(malformed("placeholder without a name"));
                    }
                    if !literal.is_empty() {
                        nodes.push(Node::Literal(std::mem::take(&mut literal)));
                    }
                    nodes.push(Node::Required(name));
                }
                '(' => {
                    if !literal.is_empty() {
                        nodes.push(Node::Literal(std::mem::take(&mut literal)));
                    }
                    let mut prefix = String::new();
                    let mut name = None;
                    loop {
                        match chars.next() {
                            None => return Err(malformed("unclosed optional group")),
                            Some('(') => return Err(malformed("nested optional group")),
                            Some(')') => break,
                            Some(':') if name.is_none() => {
                                let n = take_name(&mut chars);
                                if n.is_empty() {
                                    return Err(malformed("placeholder without a name"));
                                }
                                name = Some(n);
                            }
                            Some(_) if name.is_some() => {
                                return Err(malformed("text after placeholder in optional group"))
                            }
                            Some(other) => prefix.push(other),
                        }
                    }
                    let name = name.ok_or_else(|| malformed("optional group without a placeholder"))?;
                    nodes.push(Node::Optional { prefix, name });
                }
                ')' => return Err(malformed("unbalanced `)`")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            nodes.push(Node::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of every placeholder, in template order.
    pub fn segment_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Literal(_) => None,
            Node::Required(name) | Node::Optional { name, .. } => Some(name.as_str()),
        })
    }

    /// A `PathValues` map with every segment present and unset.
    pub fn empty_values(&self) -> PathValues {
        self.segment_names().map(|name| (name.to_string(), None)).collect()
    }

    /// Expand the template left to right.
    pub fn render(
        &self,
        values: &PathValues,
        validators: &SegmentValidators,
    ) -> Result<String, PathError> {
        let mut path = String::new();
        for node in &self.nodes {
            match node {
                Node::Literal(text) => path.push_str(text),
                Node::Required(name) => {
                    let value = lookup(values, name).ok_or_else(|| PathError::MissingSegment {
                        segment: name.clone(),
                    })?;
                    push_segment(&mut path, name, value, validators)?;
                }
                Node::Optional { prefix, name } => {
                    if let Some(value) = lookup(values, name) {
                        path.push_str(prefix);
                        push_segment(&mut path, name, value, validators)?;
                    }
                }
            }
        }
        Ok(path)
    }
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn lookup<'a>(values: &'a PathValues, name: &str) -> Option<&'a str> {
    values.get(name).and_then(|v| v.as_deref())
}

fn push_segment(
    path: &mut String,
    name: &str,
    value: &str,
    validators: &SegmentValidators,
) -> Result<(), PathError> {
    // `.` and `..` survive encoding and would be resolved away as dot segments.
    let dot_segment = value == "." || value == "..";
    if let Some(pattern) = validators.get(name).filter(|_| !dot_segment) {
        if !pattern.is_match(value) {
            tracing::warn!(segment = name, value, "path segment failed validation");
            return Err(PathError::InvalidSegment {
                segment: name.to_string(),
                value: value.to_string(),
            });
        }
    }
    if dot_segment {
        tracing::warn!(segment = name, value, "dot segment refused");
        return Err(PathError::InvalidSegment {
            segment: name.to_string(),
            value: value.to_string(),
        });
    }
    path.extend(utf8_percent_encode(value, SEGMENT));
    Ok(())
}
