//! Text decoding, numeric parsing and number formatting shared by the codecs.
//!
//! Photometric files are plain ASCII in practice but regularly arrive as
//! Latin-1 (European manufacturer names in EULUMDAT headers). Numbers are
//! parsed strictly: NaN and infinities are rejected, and count fields must
//! be integral.

use lumen_core::{LumenError, LumenResult};

use crate::codec::LineEnding;

/// Decode file bytes as UTF-8, falling back to Latin-1. A UTF-8 BOM is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse a finite decimal number.
pub fn parse_number(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a number that may use a comma as decimal separator.
pub fn parse_decimal_comma(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.contains(',') {
        parse_number(&token.replace(',', "."))
    } else {
        parse_number(token)
    }
}

pub fn is_numeric_token(token: &str) -> bool {
    parse_number(token).is_some()
}

/// True when every whitespace-separated token of a non-empty line is numeric.
pub fn is_numeric_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(is_numeric_token)
}

/// Safely convert f64 to usize, rejecting NaN, negative and fractional values.
///
/// # Examples
/// ```
/// use lumen_io::helpers::safe_f64_to_usize;
///
/// assert_eq!(safe_f64_to_usize(19.0, "vertical_count").unwrap(), 19);
/// assert!(safe_f64_to_usize(-1.0, "vertical_count").is_err());
/// assert!(safe_f64_to_usize(2.5, "vertical_count").is_err());
/// ```
pub fn safe_f64_to_usize(value: f64, field: &str) -> LumenResult<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
        return Err(LumenError::syntax(
            "number.count",
            format!("{field} must be a non-negative integer"),
        )
        .with_context("field", field)
        .with_context("value", value));
    }
    Ok(value as usize)
}

/// Safely convert f64 to i32, rejecting NaN, fractional and out-of-range values.
pub fn safe_f64_to_i32(value: f64, field: &str) -> LumenResult<i32> {
    if !value.is_finite()
        || value.fract() != 0.0
        || value < i32::MIN as f64
        || value > i32::MAX as f64
    {
        return Err(
            LumenError::syntax("number.integer", format!("{field} must be an integer"))
                .with_context("field", field)
                .with_context("value", value),
        );
    }
    Ok(value as i32)
}

/// Shortest representation that parses back to the same value.
pub fn format_number(value: f64) -> String {
    // Avoid writing "-0".
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Format with a fixed number of decimals.
pub fn format_fixed(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    // "-0.0" rounds to zero on the wire
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// Join lines with the requested terminator, including a trailing one.
pub fn join_lines(lines: &[String], ending: LineEnding) -> String {
    let sep = ending.as_str();
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
    for line in lines {
        out.push_str(line);
        out.push_str(sep);
    }
    out
}

/// Wrap numbers onto lines of at most `per_line` values.
pub fn wrap_numbers(values: &[f64], per_line: usize) -> Vec<String> {
    values
        .chunks(per_line.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|v| format_number(*v))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

// ============================================================================
// Token cursor
// ============================================================================

/// Whitespace-delimited tokens flattened across lines, each tagged with its
/// 1-based source line.
///
/// Arrays in LM-63 may wrap at any point, so the numeric section is read as
/// one token stream regardless of physical line breaks.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<(usize, String)>,
    pos: usize,
    code_prefix: &'static str,
}

impl TokenCursor {
    /// Tokenize `lines`, numbering them from `first_line`.
    pub fn new<'a, I>(lines: I, first_line: usize, code_prefix: &'static str) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokens = lines
            .into_iter()
            .enumerate()
            .flat_map(|(i, line)| {
                line.split_whitespace()
                    .map(move |token| (first_line + i, token.to_string()))
            })
            .collect();
        Self {
            tokens,
            pos: 0,
            code_prefix,
        }
    }

    /// Line of the next token, or of the last token when exhausted.
    pub fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(line, _)| *line)
            .unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    pub fn next_token(&mut self, field: &str) -> LumenResult<(usize, &str)> {
        match self.tokens.get(self.pos) {
            Some((line, token)) => {
                self.pos += 1;
                Ok((*line, token.as_str()))
            }
            None => Err(LumenError::syntax(
                format!("{}.truncated", self.code_prefix),
                format!("unexpected end of data while reading {field}"),
            )
            .with_context("field", field)
            .with_context("line", self.line())),
        }
    }

    pub fn next_f64(&mut self, field: &str) -> LumenResult<f64> {
        let prefix = self.code_prefix;
        let (line, token) = self.next_token(field)?;
        parse_number(token).ok_or_else(|| {
            LumenError::syntax(
                format!("{prefix}.number"),
                format!("expected a number for {field}"),
            )
            .with_context("field", field)
            .with_context("token", token)
            .with_context("line", line)
        })
    }

    pub fn next_usize(&mut self, field: &str) -> LumenResult<usize> {
        let line = self.line();
        let value = self.next_f64(field)?;
        safe_f64_to_usize(value, field).map_err(|err| err.with_context("line", line))
    }

    pub fn next_i32(&mut self, field: &str) -> LumenResult<i32> {
        let line = self.line();
        let value = self.next_f64(field)?;
        safe_f64_to_i32(value, field).map_err(|err| err.with_context("line", line))
    }

    /// Read exactly `count` numbers.
    pub fn take_f64(&mut self, count: usize, field: &str) -> LumenResult<Vec<f64>> {
        if self.remaining() < count {
            return Err(LumenError::syntax(
                format!("{}.truncated", self.code_prefix),
                format!("{field}: expected {count} values, found {}", self.remaining()),
            )
            .with_context("field", field)
            .with_context("line", self.line()));
        }
        (0..count).map(|_| self.next_f64(field)).collect()
    }
}
