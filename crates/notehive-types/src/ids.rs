//! Decimal-string identity codec for the sync boundary.
//!
//! Clients send numeric identities as strings because a device may hold
//! identifiers that have not yet resolved to a server account. A string that
//! does not parse as an integer is treated as absent, never as an error, and
//! absent identities serialize back as the empty string.

/// Parse an optional decimal-string identity. `None`, empty, whitespace-only
/// and non-numeric inputs all coerce to `None`.
pub fn parse_opt_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Format an optional identity back into the wire form: decimal digits, or
/// the empty string when unset.
pub fn fmt_opt_id(value: Option<i64>) -> String {
    value.map(|id| id.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integers() {
        assert_eq!(parse_opt_id(Some("42")), Some(42));
        assert_eq!(parse_opt_id(Some(" 7 ")), Some(7));
        assert_eq!(parse_opt_id(Some("-3")), Some(-3));
    }

    #[test]
    fn coerces_garbage_to_none() {
        assert_eq!(parse_opt_id(None), None);
        assert_eq!(parse_opt_id(Some("")), None);
        assert_eq!(parse_opt_id(Some("   ")), None);
        assert_eq!(parse_opt_id(Some("not-a-number")), None);
        assert_eq!(parse_opt_id(Some("12.5")), None);
    }

    #[test]
    fn formats_empty_string_for_null() {
        assert_eq!(fmt_opt_id(Some(99)), "99");
        assert_eq!(fmt_opt_id(None), "");
    }
}
