use authflow_core::models::IdentityStatus;
use chrono::DateTime;
use colored::{ColoredString, Colorize};

/// Millisecond timestamp as local-agnostic display text.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

pub fn styled_status(status: IdentityStatus) -> ColoredString {
    match status {
        IdentityStatus::Pending => status.as_str().yellow(),
        IdentityStatus::Activated => status.as_str().cyan(),
        IdentityStatus::Joined => status.as_str().green(),
        IdentityStatus::Failed => status.as_str().red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_handles_short_input() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("abcdefghij"), "abcdefgh");
    }

    #[test]
    fn timestamp_formats() {
        let text = format_timestamp(1_700_000_000_000);
        assert!(text.starts_with("2023-11-14"));
    }
}
