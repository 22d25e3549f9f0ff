// ============================================================
// TABULAR PARSER
// ============================================================
// Parse uploaded delimited text into raw rows keyed by header

use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::row::{RawRow, RawValue};

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Delimited-text parser with delimiter detection
pub struct TabularParser {
    /// Delimiter byte; detected per document when `None`
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values (headers are always trimmed)
    trim: bool,
}

impl Default for TabularParser {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: false,
        }
    }
}

impl TabularParser {
    /// Create a parser that detects the delimiter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set whether to trim whitespace from values
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Decode and parse an uploaded document
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Vec<RawRow>> {
        let content = decode_document(bytes);
        self.parse_content(&content)
    }

    /// Parse document text. Every row carries every header; cells missing
    /// from short rows are absent.
    pub fn parse_content(&self, content: &str) -> Result<Vec<RawRow>> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));
        if matches!(delimiter, b'"' | b'\n' | b'\r') || !delimiter.is_ascii() {
            return Err(AppError::ParseError(format!(
                "Unsupported delimiter: {:?}",
                delimiter as char
            )));
        }

        check_quotes(content, delimiter)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::Headers })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read headers: {}", e)))?
            .clone();
        let headers = normalize_headers(&headers)?;

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse row {}: {}", index + 1, e))
            })?;

            if record.len() > headers.len() {
                warn!(
                    row = index + 1,
                    cells = record.len(),
                    headers = headers.len(),
                    "Row has more cells than headers, extra cells ignored"
                );
            }

            rows.push(parse_row(&headers, &record));
        }

        Ok(rows)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let sample_lines: Vec<_> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(10)
            .collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &DELIMITER_CANDIDATES {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// Decode upload bytes as UTF-8 (BOM removed), falling back to Windows-1252
pub fn decode_document(bytes: &[u8]) -> String {
    let (text, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return text.into_owned();
    }

    debug!("Upload is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Blank headers get the `Unnamed: N` label dataframe exports use;
/// duplicates make rows ambiguous and are rejected.
fn normalize_headers(headers: &StringRecord) -> Result<Vec<String>> {
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::ParseError(
            "Document has no header row".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let name = if header.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header.to_string()
        };
        if !seen.insert(name.clone()) {
            return Err(AppError::ParseError(format!(
                "Duplicate column header: {}",
                name
            )));
        }
        names.push(name);
    }

    Ok(names)
}

fn parse_row(headers: &[String], record: &StringRecord) -> RawRow {
    let mut row = RawRow::new();
    for (idx, header) in headers.iter().enumerate() {
        let value = record.get(idx).map(|v| RawValue::Text(v.to_string()));
        row.set(header.clone(), value);
    }
    row
}

/// The csv reader silently closes a quote left open at end of input, so
/// structural quoting is checked up front.
fn check_quotes(content: &str, delimiter: u8) -> Result<()> {
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    let mut line = 1usize;
    let mut opened_on = 0usize;

    for byte in content.bytes() {
        state = match state {
            State::FieldStart | State::Unquoted if byte == b'\n' || byte == delimiter => {
                State::FieldStart
            }
            State::FieldStart if byte == b'"' => {
                opened_on = line;
                State::Quoted
            }
            State::FieldStart | State::Unquoted => State::Unquoted,
            State::Quoted if byte == b'"' => State::QuoteInQuoted,
            State::Quoted => State::Quoted,
            // Doubled quote is an escaped quote
            State::QuoteInQuoted if byte == b'"' => State::Quoted,
            State::QuoteInQuoted if byte == b'\n' || byte == delimiter => State::FieldStart,
            State::QuoteInQuoted => State::Unquoted,
        };
        if byte == b'\n' {
            line += 1;
        }
    }

    if let State::Quoted = state {
        return Err(AppError::ParseError(format!(
            "Unterminated quoted field starting on line {}",
            opened_on
        )));
    }
    Ok(())
}
