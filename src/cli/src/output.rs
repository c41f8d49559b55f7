//! Table formatting helpers for CLI output.

use comfy_table::{ContentArrangement, Table};

use trivy_zarf_runtime::{RunSummary, ScanOutcome};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a digest as algorithm prefix plus the first 12 hex chars.
pub fn format_digest(digest: &str) -> String {
    match digest.split_once(':') {
        Some((algorithm, hex)) => format!("{algorithm}:{}", truncate(hex, 12)),
        None => truncate(digest, 12).to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn status(outcome: &ScanOutcome) -> String {
    match (outcome.error(), outcome.report()) {
        (Some(_), _) => "FAILED".to_string(),
        (None, Some(path)) => format!("OK ({})", path.display()),
        (None, None) => "OK".to_string(),
    }
}

/// One row per scanned image.
pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = new_table(&["IMAGE", "DIGEST", "SIZE", "STATUS"]);
    for outcome in summary.outcomes() {
        let size = u64::try_from(outcome.descriptor().size()).unwrap_or(0);
        table.add_row(vec![
            outcome.name().to_string(),
            format_digest(outcome.digest()),
            format_bytes(size),
            status(outcome),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- format_bytes tests ---

    #[test]
    fn test_format_bytes_zero() {
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn test_format_bytes_small() {
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1023), "1023 B");
    }

    #[test]
    fn test_format_bytes_kilobytes() {
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
    }

    #[test]
    fn test_format_bytes_megabytes() {
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(100 * 1048576), "100.0 MB");
    }

    #[test]
    fn test_format_bytes_gigabytes() {
        assert_eq!(format_bytes(1073741824), "1.0 GB");
    }

    // --- format_digest tests ---

    #[test]
    fn test_format_digest_sha256() {
        assert_eq!(
            format_digest("sha256:0123456789abcdef0123456789abcdef"),
            "sha256:0123456789ab"
        );
    }

    #[test]
    fn test_format_digest_short() {
        assert_eq!(format_digest("sha256:abc"), "sha256:abc");
        assert_eq!(format_digest("abc"), "abc");
    }

    #[test]
    fn test_format_digest_no_algorithm() {
        assert_eq!(format_digest("0123456789abcdef"), "0123456789ab");
    }

    // --- summary_table tests ---

    #[test]
    fn test_summary_table_empty() {
        let table = summary_table(&RunSummary::default());
        let rendered = table.to_string();
        assert!(rendered.contains("IMAGE"));
        assert!(rendered.contains("STATUS"));
    }

    #[test]
    fn test_new_table_headers() {
        let mut table = new_table(&["A", "B"]);
        table.add_row(vec!["1", "2"]);
        let rendered = table.to_string();
        assert!(rendered.contains('A'));
        assert!(rendered.contains('2'));
    }
}
