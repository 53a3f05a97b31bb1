//! Route path templates, e.g. `/widgets/:id(.:format)` or `/files/*path`.
//!
//! Parenthesised groups are optional: a group is emitted only when every
//! parameter inside it is supplied. Parameters outside a group are required
//! and formatting fails when one is missing.

use std::collections::HashMap;

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Glob(String),
    Optional(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut stack: Vec<Vec<Segment>> = vec![Vec::new()];
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '(' => {
                    flush_literal(&mut literal, &mut stack);
                    stack.push(Vec::new());
                }
                ')' => {
                    flush_literal(&mut literal, &mut stack);
                    if stack.len() < 2 {
                        return Err(unbalanced(raw));
                    }
                    let group = stack.pop().unwrap_or_default();
                    push_segment(&mut stack, Segment::Optional(group));
                }
                ':' | '*' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        literal.push(c);
                        continue;
                    }
                    flush_literal(&mut literal, &mut stack);
                    let segment = if c == ':' {
                        Segment::Param(name)
                    } else {
                        Segment::Glob(name)
                    };
                    push_segment(&mut stack, segment);
                }
                _ => literal.push(c),
            }
        }

        flush_literal(&mut literal, &mut stack);
        if stack.len() != 1 {
            return Err(unbalanced(raw));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments: stack.pop().unwrap_or_default(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parameters that must be supplied for [`PathTemplate::format`] to succeed
    pub fn required_params(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) | Segment::Glob(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn format(&self, params: &HashMap<String, String>) -> Result<String> {
        format_segments(&self.segments, params).map_err(|param| {
            HarnessError::MissingRouteParameter {
                path: self.raw.clone(),
                param,
            }
        })
    }
}

fn unbalanced(raw: &str) -> HarnessError {
    HarnessError::InvalidArgument(format!("Unbalanced parentheses in route '{}'", raw))
}

fn push_segment(stack: &mut [Vec<Segment>], segment: Segment) {
    if let Some(top) = stack.last_mut() {
        top.push(segment);
    }
}

fn flush_literal(literal: &mut String, stack: &mut [Vec<Segment>]) {
    if !literal.is_empty() {
        push_segment(stack, Segment::Literal(std::mem::take(literal)));
    }
}

/// Err carries the name of the first missing required parameter
fn format_segments(
    segments: &[Segment],
    params: &HashMap<String, String>,
) -> std::result::Result<String, String> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Param(name) => {
                let value = params.get(name).ok_or_else(|| name.clone())?;
                out.push_str(&urlencoding::encode(value));
            }
            Segment::Glob(name) => {
                let value = params.get(name).ok_or_else(|| name.clone())?;
                out.push_str(value);
            }
            Segment::Optional(inner) => {
                if let Ok(formatted) = format_segments(inner, params) {
                    out.push_str(&formatted);
                }
            }
        }
    }
    Ok(out)
}
