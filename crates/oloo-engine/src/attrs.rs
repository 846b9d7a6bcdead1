//! Attribute parser
//!
//! Parses the attribute mini-language used by property annotations:
//! space-separated tokens of the form `name`, `!name` (negation) or
//! `name=v1|v2` (valued, ordered list). The annotation text comes either
//! from the inline `attrs!("…")` marker in a method's source or from the
//! side-channel tag on a [`crate::Property`].

use crate::patterns;

/// Attribute names the descriptor builder understands. Anything else is
/// warned about and passed through untouched.
pub const RECOGNIZED: &[&str] = &[
    "static",
    "alias",
    "override",
    "enumerable",
    "configurable",
    "writable",
    "const",
    "readonly",
    "frozen",
    "sealed",
    "extensible",
    "attached",
    "solid",
    "validate",
    "state",
];

/// Value carried by a parsed attribute token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `name` (true) or `!name` (false)
    Flag(bool),
    /// `name=v1|v2` — ordered values
    List(Vec<String>),
}

impl AttrValue {
    /// Interpret the value as a boolean flag. Valued attributes count
    /// as set.
    pub fn as_flag(&self) -> bool {
        match self {
            AttrValue::Flag(b) => *b,
            AttrValue::List(_) => true,
        }
    }
}

/// A single parsed attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Canonical attribute name
    pub name: String,
    /// Parsed value
    pub value: AttrValue,
}

/// Whether an attribute name is in the recognized set.
pub fn is_recognized(name: &str) -> bool {
    RECOGNIZED.contains(&name)
}

/// Parse an annotation string into attributes.
///
/// Whitespace around `=` and `|` is normalized away first, then each
/// whitespace-separated token is classified. An empty or all-whitespace
/// string yields no attributes, and downstream defaults apply.
pub fn parse(text: &str) -> Vec<Attr> {
    let normalized = patterns::normalize_attrs(text);
    normalized
        .split_whitespace()
        .filter_map(parse_token)
        .collect()
}

fn parse_token(token: &str) -> Option<Attr> {
    if let Some(name) = token.strip_prefix('!') {
        if name.is_empty() {
            return None;
        }
        return Some(Attr {
            name: name.to_string(),
            value: AttrValue::Flag(false),
        });
    }
    if token.contains('=') {
        // The first word is the canonical name, the rest are the values.
        let mut words = token
            .split(|c: char| c == '=' || c == '|')
            .filter(|w| !w.is_empty())
            .map(str::to_string);
        let name = words.next()?;
        return Some(Attr {
            name,
            value: AttrValue::List(words.collect()),
        });
    }
    Some(Attr {
        name: token.to_string(),
        value: AttrValue::Flag(true),
    })
}
