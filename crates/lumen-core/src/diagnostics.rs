//! Warning/error accumulator shared by parsing, conversion and validation.
//!
//! Soft problems are data, not failures: codecs and validators push them into
//! a [`Diagnostics`] collection and keep going. Only structural failures
//! become a [`crate::LumenError`].
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping issues (parse, electrical, photometry, ...)
//! - Optional field references (e.g., "electrical.input_watts")
//! - Optional line numbers for file-based operations
//! - Serialization for JSON output
//!
//! # Example
//!
//! ```
//! use lumen_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//!
//! diag.add_warning("electrical", "Efficacy of 4.0 lm/W is implausibly low");
//! diag.add_error_with_field("photometry", "Negative intensity", "photometry.candela_values");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the operation continued (e.g., defaulted value)
    Warning,
    /// The data is invalid for the requested operation
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g., "parse", "electrical", "capacity")
    pub category: String,
    pub message: String,
    /// Optional line number (1-based) in the source file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Optional record field path, e.g. "geometry.height"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            field: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(field) = &self.field {
            write!(f, " ({})", field)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }

        Ok(())
    }
}

/// Ordered collection of diagnostic issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    // =========================================================================
    // Warning Methods
    // =========================================================================

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_line(line));
    }

    pub fn add_warning_with_field(&mut self, category: &str, message: &str, field: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_field(field));
    }

    // =========================================================================
    // Error Methods
    // =========================================================================

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_line(line));
    }

    pub fn add_error_with_field(&mut self, category: &str, message: &str, field: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_field(field));
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Messages of all issues, in insertion order.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.message.clone()).collect()
    }

    // =========================================================================
    // Utility Methods
    // =========================================================================

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }

    pub fn summary(&self) -> String {
        summarize(self.warning_count(), self.error_count())
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn summarize(warnings: usize, errors: usize) -> String {
    match (warnings, errors) {
        (0, 0) => "No issues".to_string(),
        (w, 0) => format!("{} warning{}", w, plural(w)),
        (0, e) => format!("{} error{}", e, plural(e)),
        (w, e) => format!("{} warning{}, {} error{}", w, plural(w), e, plural(e)),
    }
}

// ============================================================================
// Parse-Specific Extensions
// ============================================================================

/// Statistics about a parse operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseStats {
    pub vertical_angles: usize,
    pub horizontal_angles: usize,
    pub keywords: usize,
    pub skipped_lines: usize,
    pub defaulted_values: usize,
}

/// Diagnostics for a parse operation: statistics plus issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportDiagnostics {
    pub stats: ParseStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    /// Add a warning with line number. Leaves the counters alone.
    pub fn add_warning_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_line(line));
    }

    /// Record a field that fell back to its default value
    pub fn add_defaulted(&mut self, field: &str, message: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, "default", message).with_field(field),
        );
        self.stats.defaulted_values += 1;
    }

    /// Record a line that was ignored but did not stop the parse
    pub fn add_skipped_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_line(line));
        self.stats.skipped_lines += 1;
    }

    /// Add an error with line number (increments skipped_lines counter)
    pub fn add_error_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_line(line));
        self.stats.skipped_lines += 1;
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Drop the statistics and keep only the issues.
    pub fn into_diagnostics(self) -> Diagnostics {
        Diagnostics {
            issues: self.issues,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}x{} grid, {} keywords | {}",
            self.stats.vertical_angles,
            self.stats.horizontal_angles,
            self.stats.keywords,
            summarize(self.warning_count(), self.error_count())
        )
    }
}

impl std::fmt::Display for ImportDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Parse: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("parse", "test warning");
        diag.add_error("parse", "test error");
        diag.add_warning_at_line("parse", "line warning", 42);

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_issues());
        assert!(diag.has_errors());
        assert!(diag.has_warnings());
    }

    #[test]
    fn test_diagnostics_preserve_insertion_order() {
        let mut diag = Diagnostics::new();
        diag.add_warning("a", "first");
        diag.add_error("b", "second");
        diag.add_warning("c", "third");
        assert_eq!(diag.messages(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_warning_at_line("parse", "Defaulted manufacturer", 3);
        diag.add_error_with_field("geometry", "Negative width", "geometry.width");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(json.contains("\"line\": 3"));
        assert!(json.contains("\"field\": \"geometry.width\""));
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Error, "parse", "Invalid value")
            .with_field("photometry.vertical_angles")
            .with_line(12);

        let display = format!("{}", issue);
        assert_eq!(
            display,
            "[error:parse] Invalid value (photometry.vertical_angles) at line 12"
        );
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning("parse", "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_error("parse", "error");
        assert_eq!(diag.summary(), "1 warning, 1 error");

        diag.add_warning("parse", "another warning");
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn test_issues_by_category() {
        let mut diag = Diagnostics::new();
        diag.add_warning("electrical", "low efficacy");
        diag.add_warning("photometry", "asymmetric");
        diag.add_error("electrical", "negative watts");

        assert_eq!(diag.issues_by_category("electrical").count(), 2);
        assert_eq!(diag.issues_by_category("photometry").count(), 1);
    }

    #[test]
    fn test_import_diagnostics_counters() {
        let mut diag = ImportDiagnostics::new();
        diag.stats.vertical_angles = 19;
        diag.stats.horizontal_angles = 16;
        diag.add_defaulted("metadata.manufacturer", "Manufacturer missing, using 'Unknown'");
        diag.add_error_at_line("parse", "Invalid line", 7);

        assert_eq!(diag.stats.defaulted_values, 1);
        assert_eq!(diag.stats.skipped_lines, 1);
        assert!(diag.summary().starts_with("19x16 grid"));

        let plain = diag.into_diagnostics();
        assert_eq!(plain.warning_count(), 1);
        assert_eq!(plain.error_count(), 1);
    }

    #[test]
    fn test_line_warning_is_not_a_default() {
        let mut diag = ImportDiagnostics::new();
        diag.add_warning_at_line("tilt", "external tilt file is not read", 4);

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.stats.defaulted_values, 0);
        assert_eq!(diag.stats.skipped_lines, 0);
    }
}
