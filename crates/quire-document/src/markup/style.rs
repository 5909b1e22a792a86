// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inline `style` attribute and dimension parsing for image sizing.

use std::collections::BTreeMap;

/// Parse `"width: 100px; height: auto"` into lowercase property → value pairs.
/// Declarations without a colon or with an empty side are skipped.
pub fn parse_style(style: &str) -> BTreeMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(prop, value)| (prop.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(prop, value)| !prop.is_empty() && !value.is_empty())
        .collect()
}

/// Numeric part of a dimension such as `"100px"` or `"12.5pt"`.
///
/// Every character that is not a digit or `.` is dropped before parsing, so
/// the unit is ignored. `auto`, empty and unparseable values give `None`.
pub fn parse_dimension(value: &str) -> Option<f32> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("auto") {
        return None;
    }
    let numeric: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse::<f32>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_declarations() {
        let styles = parse_style("Width: 100px; height:auto;; color :red");
        assert_eq!(styles.get("width").map(String::as_str), Some("100px"));
        assert_eq!(styles.get("height").map(String::as_str), Some("auto"));
        assert_eq!(styles.get("color").map(String::as_str), Some("red"));
        assert!(parse_style("").is_empty());
        assert!(parse_style("nonsense").is_empty());
    }

    #[test]
    fn dimensions_drop_units() {
        assert_eq!(parse_dimension("100px"), Some(100.0));
        assert_eq!(parse_dimension(" 12.5pt "), Some(12.5));
        assert_eq!(parse_dimension("300"), Some(300.0));
    }

    #[test]
    fn unusable_dimensions() {
        assert_eq!(parse_dimension("auto"), None);
        assert_eq!(parse_dimension(""), None);
        assert_eq!(parse_dimension("px"), None);
        assert_eq!(parse_dimension("1.2.3"), None);
    }
}
