//! Formatter template parsing.
//!
//! Templates are literal text with `{field}` substitutions; `{{` and `}}`
//! stand for literal braces.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("template token regex is valid")
});

/// A field a formatter may substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Timestamp,
    Level,
    Logger,
    File,
    Function,
    Line,
    Message,
}

impl Field {
    pub const ALL: &'static [Field] = &[
        Field::Timestamp,
        Field::Level,
        Field::Logger,
        Field::File,
        Field::Function,
        Field::Line,
        Field::Message,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Level => "level",
            Field::Logger => "logger",
            Field::File => "file",
            Field::Function => "function",
            Field::Line => "line",
            Field::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownField {
                name: s.to_string(),
            })
    }
}

/// Why a template was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown field `{{{name}}}`")]
    UnknownField { name: String },

    #[error("unmatched `{brace}` at byte {offset}")]
    UnbalancedBrace { brace: char, offset: usize },

    #[error("empty field `{{}}` at byte {offset}")]
    EmptyField { offset: usize },
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed formatter template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, stopping at the first error.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TOKEN.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            literal.push_str(&text[last..whole.start()]);
            last = whole.end();

            match whole.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" | "}" => {
                    return Err(TemplateError::UnbalancedBrace {
                        brace: whole.as_str().chars().next().unwrap_or('{'),
                        offset: whole.start(),
                    });
                }
                _ => {
                    let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyField {
                            offset: whole.start(),
                        });
                    }
                    let field: Field = name.parse()?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
            }
        }

        literal.push_str(&text[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template { segments })
    }

    /// Fields referenced, in order of appearance.
    pub fn fields(&self) -> Vec<Field> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field(f) => Some(*f),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}
