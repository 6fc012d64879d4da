use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::compressor::CompressorConfig;
use crate::error::{Result, RoyaltyError};
use crate::models::Report;

const UTF8_BOM: &str = "\u{feff}";

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Normalize a header cell: NBSP becomes a space, surrounding whitespace is
/// trimmed and internal whitespace runs collapse to one space.
pub fn normalize_header(raw: &str) -> String {
    let spaced = raw.replace('\u{a0}', " ");
    whitespace_run().replace_all(spaced.trim(), " ").into_owned()
}

/// Drop the banner line some exports put above the real header.
fn strip_preamble<'a>(text: &'a str, token: &str) -> &'a str {
    if token.is_empty() {
        return text;
    }
    let first_line = text.lines().next().unwrap_or("");
    if !first_line.trim().starts_with(token) {
        return text;
    }
    match text.find('\n') {
        Some(i) => &text[i + 1..],
        None => "",
    }
}

/// Parse raw report bytes into a [`Report`] with normalized headers.
pub fn parse_report(raw: &[u8], config: &CompressorConfig) -> Result<Report> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| RoyaltyError::MalformedInput(format!("input is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let body = strip_preamble(text, &config.preamble_token);
    if body.len() != text.len() {
        debug!("skipped preamble line");
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let mut headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(RoyaltyError::MalformedInput("report has no header row".to_string()));
    }
    // Blank header cells (trailing delimiters) get positional names.
    for (i, h) in headers.iter_mut().enumerate() {
        if h.is_empty() {
            *h = format!("Unnamed: {i}");
        }
    }
    for (i, h) in headers.iter().enumerate() {
        if headers[..i].contains(h) {
            return Err(RoyaltyError::MalformedInput(format!("duplicate column: {h}")));
        }
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(columns = headers.len(), rows = rows.len(), "parsed report");
    Ok(Report { headers, rows })
}

/// Serialize a report as delimited text with a header row.
pub fn write_report(report: &Report, delimiter: u8) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(&report.headers)?;
    for row in &report.rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner()
        .map_err(|e| RoyaltyError::UnexpectedFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CompressorConfig {
        CompressorConfig::default()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Owned Views "), "Owned Views");
        assert_eq!(normalize_header("Owned\u{a0}Views"), "Owned Views");
        assert_eq!(normalize_header("Partner  Revenue :\tAuction"), "Partner Revenue : Auction");
        assert_eq!(normalize_header("\u{a0}\u{a0}"), "");
    }

    #[test]
    fn test_parse_skips_preamble() {
        let raw = "Asset Summary,2024-01\nAsset ID,Owned Views\n1,10\n";
        let report = parse_report(raw.as_bytes(), &config()).unwrap();
        assert_eq!(report.headers, vec!["Asset ID", "Owned Views"]);
        assert_eq!(report.rows, vec![vec!["1".to_string(), "10".to_string()]]);
    }

    #[test]
    fn test_parse_without_preamble_keeps_first_line_as_header() {
        let raw = "Asset ID,Owned Views\n1,10\n";
        let report = parse_report(raw.as_bytes(), &config()).unwrap();
        assert_eq!(report.headers[0], "Asset ID");
        assert_eq!(report.rows.len(), 1);
    }

    #[test]
    fn test_parse_strips_bom_and_normalizes_headers() {
        let raw = "\u{feff}Asset ID, Owned\u{a0}\u{a0}Views \n1,10\n";
        let report = parse_report(raw.as_bytes(), &config()).unwrap();
        assert_eq!(report.headers, vec!["Asset ID", "Owned Views"]);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let raw = "Asset ID,Owned Views\n1,10\n2\n";
        let err = parse_report(raw.as_bytes(), &config()).unwrap_err();
        assert!(matches!(err, RoyaltyError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let raw = b"Asset ID,Owned Views\n\xff\xfe,10\n";
        let err = parse_report(raw, &config()).unwrap_err();
        assert!(matches!(err, RoyaltyError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        let err = parse_report(b"", &config()).unwrap_err();
        assert!(matches!(err, RoyaltyError::MalformedInput(_)));
        let err = parse_report(b"Asset Summary,2024-01\n", &config()).unwrap_err();
        assert!(matches!(err, RoyaltyError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_rejects_duplicate_normalized_headers() {
        let raw = "Asset ID,Owned Views,Owned  Views\n1,1,2\n";
        let err = parse_report(raw.as_bytes(), &config()).unwrap_err();
        assert!(err.to_string().contains("duplicate column: Owned Views"));
    }

    #[test]
    fn test_parse_names_blank_headers_by_position() {
        let raw = "Asset ID,Owned Views,,\n1,10,,\n";
        let report = parse_report(raw.as_bytes(), &config()).unwrap();
        assert_eq!(
            report.headers,
            vec!["Asset ID", "Owned Views", "Unnamed: 2", "Unnamed: 3"]
        );
        assert_eq!(report.rows[0], vec!["1", "10", "", ""]);
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let mut cfg = config();
        cfg.delimiter = b';';
        let report = parse_report(b"Asset ID;Owned Views\n1;10\n", &cfg).unwrap();
        assert_eq!(report.headers, vec!["Asset ID", "Owned Views"]);
    }

    #[test]
    fn test_write_report_quotes_when_needed() {
        let report = Report {
            headers: vec!["Asset ID".into(), "Title".into()],
            rows: vec![vec!["1".into(), "Hello, World".into()]],
        };
        let out = String::from_utf8(write_report(&report, b',').unwrap()).unwrap();
        assert_eq!(out, "Asset ID,Title\n1,\"Hello, World\"\n");
    }
}
