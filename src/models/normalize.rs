// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coercion of free-text form fields into payload values.

/// Parse a number typed by the user. Blank, unparseable or non-finite input
/// becomes `0`.
pub fn coerce_number(text: &str) -> f64 {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a whole count (sets, reps, minutes). Fractions are rounded,
/// negatives and garbage become `0`.
pub fn coerce_count(text: &str) -> u32 {
    let value = coerce_number(text);
    if value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value.round() as u32
    }
}

/// Trimmed optional text, with blank treated as absent.
pub fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("150"), 150.0);
        assert_eq!(coerce_number(" 2,5 "), 2.5);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number("-3"), -3.0);
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count("12"), 12);
        assert_eq!(coerce_count("7.6"), 8);
        assert_eq!(coerce_count("-1"), 0);
        assert_eq!(coerce_count("ten"), 0);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" hi ".to_string())), Some("hi".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
