//! Identifier list parsing
//!
//! Accepts either a JSON array or comma/newline-delimited text and produces an
//! ordered list of trimmed, non-empty identifiers. Duplicates and order are
//! preserved as given.

/// Parse a raw identifier argument into an ordered list.
///
/// A syntactically valid JSON array wins; its elements are stringified and
/// trimmed (numbers are accepted as-is). Anything else is treated as delimited
/// text with newlines acting as commas. Empty segments are dropped.
pub fn parse_identifiers(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if raw.starts_with('[') {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            return values
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    other => other.to_string().trim().to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect();
        }
        // fall through: malformed JSON is treated as delimited text
    }

    raw.replace('\n', ",")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array() {
        let ids = parse_identifiers(r#"["B001", " B002 ", "B003"]"#);
        assert_eq!(ids, vec!["B001", "B002", "B003"]);
    }

    #[test]
    fn test_json_array_drops_empty_elements() {
        let ids = parse_identifiers(r#"["B001", "", "  ", "B002"]"#);
        assert_eq!(ids, vec!["B001", "B002"]);
    }

    #[test]
    fn test_json_array_stringifies_numbers() {
        let ids = parse_identifiers(r#"[123, "B002"]"#);
        assert_eq!(ids, vec!["123", "B002"]);
    }

    #[test]
    fn test_comma_delimited() {
        let ids = parse_identifiers("A, B,,C");
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_newlines_act_as_commas() {
        let ids = parse_identifiers("B001\nB002, B003\n\nB004");
        assert_eq!(ids, vec!["B001", "B002", "B003", "B004"]);
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let ids = parse_identifiers("B002,B001,B002");
        assert_eq!(ids, vec!["B002", "B001", "B002"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_identifiers("").is_empty());
        assert!(parse_identifiers("   \n  ").is_empty());
        assert!(parse_identifiers(",,,").is_empty());
    }

    #[test]
    fn test_malformed_json_falls_back_to_delimited() {
        let ids = parse_identifiers("[B001, B002");
        assert_eq!(ids, vec!["[B001", "B002"]);
    }
}
