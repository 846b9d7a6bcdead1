//! Source-text heuristics
//!
//! The engine inspects the `stringify!`-captured source of methods to
//! find the inline attribute annotation, detect upper calls, and run the
//! private-use and static-member validations. This is pattern matching
//! over token text, not static analysis: string literals or unusually
//! shaped call expressions can fool it. The patterns live here, in one
//! place, so they can be retuned without touching the validators.
//!
//! Note that `stringify!` output separates tokens with spaces, so every
//! pattern tolerates whitespace around `.`, `(` and `,`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inline annotation marker: `attrs!("static alias=a|b")` as the first
/// statement of a method body.
static ATTR_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"attrs\s*!\s*\(\s*"([^"]*)"\s*\)"#).expect("valid pattern"));

/// An upper call through any context receiver: `ctx.upper(...)`.
static UPPER_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w+\s*\.\s*upper\s*\(").expect("valid pattern"));

/// A keyed member access through some receiver: `recv.get(cx, "name")`,
/// `recv.set(...)` or `recv.call(...)`. Captures the receiver and the
/// key so callers can filter on either.
static MEMBER_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b([A-Za-z_]\w*)\s*\.\s*(?:get|set|call)\s*\(\s*\w+\s*,\s*"([\w$]+)""#)
        .expect("valid pattern")
});

/// Normalization for attribute strings: collapse whitespace around `=`
/// and `|` so `alias = a | b` tokenizes like `alias=a|b`.
static ATTR_NORMALIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([=|])\s*").expect("valid pattern"));

/// Extract the inline attribute annotation from method source, if any.
pub fn annotation(src: &str) -> Option<String> {
    ATTR_MARKER
        .captures(src)
        .map(|caps| caps[1].to_string())
}

/// Whether the source contains an upper call.
pub fn calls_upper(src: &str) -> bool {
    UPPER_CALL.is_match(src)
}

/// Normalize an attribute string for tokenization.
pub fn normalize_attrs(text: &str) -> String {
    ATTR_NORMALIZE.replace_all(text, "$1").into_owned()
}

/// Find accesses to private (underscore-prefixed) members through a
/// receiver other than `this`, formatted as `recv._name`, in source
/// order. Double-underscore names are not considered private.
pub fn illegal_private_refs(src: &str) -> Vec<String> {
    MEMBER_ACCESS
        .captures_iter(src)
        .filter_map(|caps| {
            let recv = &caps[1];
            let key = &caps[2];
            let private = key.starts_with('_')
                && key.len() > 1
                && !key[1..].starts_with('_');
            if recv != "this" && private {
                Some(format!("{recv}.{key}"))
            } else {
                None
            }
        })
        .collect()
}

/// Find every member key accessed through `this`, in source order.
/// Used to validate that static slots only touch static members.
pub fn this_member_refs(src: &str) -> Vec<String> {
    MEMBER_ACCESS
        .captures_iter(src)
        .filter_map(|caps| {
            if &caps[1] == "this" {
                Some(caps[2].to_string())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_extraction() {
        let src = r#"{ attrs ! ("static alias=ctor|construct") ; Ok(Value::Null) }"#;
        assert_eq!(
            annotation(src).as_deref(),
            Some("static alias=ctor|construct")
        );
        assert_eq!(annotation("{ Ok(Value::Null) }"), None);
    }

    #[test]
    fn test_upper_detection() {
        assert!(calls_upper(r#"{ ctx . upper (this , args) }"#));
        assert!(calls_upper("{ctx.upper(this, args)}"));
        assert!(!calls_upper("{ this . get (ctx , \"upper\") }"));
    }

    #[test]
    fn test_illegal_private_refs_filters_this() {
        let src = r#"{ let a = this . get (ctx , "_mine") ; other . get (ctx , "_secret") }"#;
        assert_eq!(illegal_private_refs(src), vec!["other._secret"]);
    }

    #[test]
    fn test_dunder_names_are_not_private() {
        let src = r#"{ other . get (ctx , "__meta") }"#;
        assert!(illegal_private_refs(src).is_empty());
    }

    #[test]
    fn test_this_member_refs_in_order() {
        let src = r#"{ this . call (ctx , "a" , &[]) ; this . get (ctx , "b") ; x . get (ctx , "c") }"#;
        assert_eq!(this_member_refs(src), vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_attrs() {
        assert_eq!(
            normalize_attrs("static  alias = a | b   frozen"),
            "static  alias=a|b   frozen"
        );
    }
}
