//! Filter-query mini-language: a single equality clause
//!
//! ```text
//! <field> = "<literal>"
//! ```
//!
//! where `field` is one of `name`, `external_id` or `type`, and the literal
//! escapes `"` and `\` with a backslash.

use std::fmt;
use std::str::FromStr;

/// Fields a filter clause can test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    ExternalId,
    Type,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ExternalId => "external_id",
            Self::Type => "type",
        }
    }
}

impl FromStr for FilterField {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "external_id" => Ok(Self::ExternalId),
            "type" => Ok(Self::Type),
            other => Err(FilterParseError(format!("unknown filter field '{}'", other))),
        }
    }
}

/// A parsed `field = "value"` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub field: FilterField,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid filter query: {0}")]
pub struct FilterParseError(String);

impl FilterQuery {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            field: FilterField::Name,
            value: value.into(),
        }
    }

    pub fn external_id(value: impl Into<String>) -> Self {
        Self {
            field: FilterField::ExternalId,
            value: value.into(),
        }
    }

    pub fn type_name(value: impl Into<String>) -> Self {
        Self {
            field: FilterField::Type,
            value: value.into(),
        }
    }

    /// Parse a rendered clause back into a predicate
    pub fn parse(input: &str) -> Result<Self, FilterParseError> {
        let (field, rest) = input
            .split_once('=')
            .ok_or_else(|| FilterParseError(format!("missing '=' in '{}'", input)))?;
        let field: FilterField = field.trim().parse()?;

        let literal = rest.trim();
        let body = literal
            .strip_prefix('"')
            .ok_or_else(|| FilterParseError(format!("expected quoted literal in '{}'", input)))?;

        let mut value = String::with_capacity(body.len());
        let mut chars = body.chars();
        loop {
            match chars.next() {
                Some('\\') => match chars.next() {
                    Some(c @ ('"' | '\\')) => value.push(c),
                    Some(c) => {
                        return Err(FilterParseError(format!("unsupported escape '\\{}'", c)))
                    }
                    None => return Err(FilterParseError("dangling escape".into())),
                },
                Some('"') => break,
                Some(c) => value.push(c),
                None => return Err(FilterParseError(format!("unterminated literal in '{}'", input))),
            }
        }
        if !chars.as_str().trim().is_empty() {
            return Err(FilterParseError(format!(
                "trailing input after literal: '{}'",
                chars.as_str()
            )));
        }

        Ok(Self { field, value })
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"", self.field.as_str())?;
        for c in self.value.chars() {
            if c == '"' || c == '\\' {
                write!(f, "\\")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "\"")
    }
}
