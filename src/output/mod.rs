//! Output module for reporting drain results
//!
//! This module handles:
//! - Formatting one line per finished page
//! - Summarizing a finished drain

pub mod stats;

pub use stats::{error_breakdown, format_report, print_report};

/// Formats the line printed for one completed page
///
/// # Example
///
/// ```
/// use sumi_tide::output::format_page_line;
///
/// let line = format_page_line("https://example.com/", Some(200), 512, Some("Home"));
/// assert_eq!(line, "[200] https://example.com/ (512 bytes) Home");
/// ```
pub fn format_page_line(target: &str, status: Option<u16>, bytes: usize, title: Option<&str>) -> String {
    let status = status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "---".to_string());
    let mut line = format!("[{}] {} ({} bytes)", status, target, bytes);
    if let Some(title) = title {
        line.push(' ');
        line.push_str(title);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_line_without_status_or_title() {
        assert_eq!(
            format_page_line("https://example.com/", None, 0, None),
            "[---] https://example.com/ (0 bytes)"
        );
    }
}
