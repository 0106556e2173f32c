use chrono::NaiveDateTime;

/// Timestamp format the content API emits: UTC with literal separators.
const API_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Short display format: abbreviated month, day without leading zero.
const DISPLAY_FORMAT: &str = "%b %-d, %Y";

/// Convert an API publication timestamp into a short display date.
///
/// `"2024-03-09T10:00:00Z"` becomes `"Mar 9, 2024"`. An input that does not
/// match the fixed API format yields an empty string — a per-item soft
/// failure that must never abort the surrounding batch.
///
/// Pure function, safe to call concurrently for many items.
pub fn format_display(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, API_FORMAT) {
        Ok(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        Err(error) => {
            tracing::debug!(raw = %raw, error = %error, "unparseable publication date");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_format_display() {
        assert_eq!(format_display("2024-03-09T10:00:00Z"), "Mar 9, 2024");
        assert_eq!(format_display("2024-12-25T23:59:59Z"), "Dec 25, 2024");
        assert_eq!(format_display("1999-01-01T00:00:00Z"), "Jan 1, 1999");
    }

    #[test]
    fn test_day_has_no_leading_zero() {
        assert_eq!(format_display("2024-07-04T12:00:00Z"), "Jul 4, 2024");
    }

    #[test]
    fn test_invalid_input_yields_empty() {
        assert_eq!(format_display("not-a-date"), "");
        assert_eq!(format_display(""), "");
        // Right date, wrong separators
        assert_eq!(format_display("2024-03-09 10:00:00"), "");
        // Fractional seconds are not part of the API format
        assert_eq!(format_display("2024-03-09T10:00:00.123Z"), "");
    }

    #[test]
    fn test_out_of_range_date_yields_empty() {
        assert_eq!(format_display("2024-13-40T10:00:00Z"), "");
    }

    proptest! {
        /// Arbitrary input never panics and either yields an empty string or
        /// a "Mon D, YYYY" shaped date.
        #[test]
        fn arbitrary_input_is_safe(input in ".*") {
            let out = format_display(&input);
            if !out.is_empty() {
                let mut parts = out.splitn(2, ' ');
                let month = parts.next().unwrap_or("");
                prop_assert_eq!(month.len(), 3);
                prop_assert!(out.contains(", "));
            }
        }
    }
}
