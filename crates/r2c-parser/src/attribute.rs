//! Attribute metadata declared in the r2c header.

use std::fmt;

/// Declared value type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    Float,
    Integer,
    /// Any other declared type, kept verbatim.
    Other(String),
}

impl AttributeType {
    /// Parse a declared type, case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "float" | "real" | "double" => AttributeType::Float,
            "integer" | "int" => AttributeType::Integer,
            _ => AttributeType::Other(s.to_string()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::Float => f.write_str("float"),
            AttributeType::Integer => f.write_str("integer"),
            AttributeType::Other(s) => f.write_str(s),
        }
    }
}

/// Name, type and units of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: Option<AttributeType>,
    pub units: Option<String>,
}

impl AttributeSpec {
    /// Attribute with a name and no declared type or units.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            units: None,
        }
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(AttributeType::Float)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(AttributeType::Integer)
    }

    pub fn with_kind(mut self, kind: AttributeType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Name to write for the attribute at 0-based `position`.
    pub fn display_name(&self, position: usize) -> String {
        if self.name.trim().is_empty() {
            format!("Attribute{}", position + 1)
        } else {
            self.name.clone()
        }
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Split the value tokens of an `AttributeName/Type/Units` line into an
/// optional 1-based index and the value.
///
/// A leading all-digit token is an index only when more tokens follow it;
/// a lone numeric token is the value itself.
pub fn split_indexed(tokens: &[String]) -> (Option<usize>, String) {
    match tokens {
        [] => (None, String::new()),
        [first, rest @ ..] if !rest.is_empty() && is_digits(first) => {
            (first.parse().ok(), rest.join(" "))
        }
        _ => (None, tokens.join(" ")),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
