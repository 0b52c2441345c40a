//! Format identifiers and extension-based lookup.
//!
//! Content-based detection lives with each codec (`detect`); this module only
//! names the formats and maps file extensions and CLI identifiers onto them.

use std::path::Path;

use lumen_core::{LumenError, LumenResult};
use serde::{Deserialize, Serialize};

/// Supported photometric file formats.
///
/// The declaration order is the registry order used to break detection ties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// IESNA LM-63 (.ies)
    Ies,
    /// EULUMDAT (.ldt)
    Ldt,
    /// CIE i-table (.cie)
    Cie,
}

impl Format {
    /// All supported formats.
    pub const ALL: &'static [Format] = &[Format::Ies, Format::Ldt, Format::Cie];

    /// Expected file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Ies => &["ies"],
            Format::Ldt => &["ldt", "eul"],
            Format::Cie => &["cie", "txt"],
        }
    }

    /// Short identifier used on the command line and in JSON output.
    pub fn id(&self) -> &'static str {
        match self {
            Format::Ies => "ies",
            Format::Ldt => "ldt",
            Format::Cie => "cie",
        }
    }

    /// Human-readable format name.
    pub fn friendly_name(&self) -> &'static str {
        match self {
            Format::Ies => "IESNA LM-63",
            Format::Ldt => "EULUMDAT",
            Format::Cie => "CIE i-table",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Format::Ies => "North American photometric data file with keyword header",
            Format::Ldt => "European positional photometric data file",
            Format::Cie => "Fixed 19x16 intensity table in cd/klm",
        }
    }

    /// Default extension for files written in this format.
    pub fn default_extension(&self) -> &'static str {
        self.extensions()[0]
    }

    /// Guess the format from a file extension.
    ///
    /// `.txt` is accepted for CIE tables, but only as a weak hint; callers
    /// should prefer content detection when they have the bytes.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.extensions().iter().any(|e| *e == ext))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Format {
    type Err = LumenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ies" | "lm63" | "lm-63" => Ok(Format::Ies),
            "ldt" | "eulumdat" => Ok(Format::Ldt),
            "cie" | "itable" | "cie-itable" => Ok(Format::Cie),
            other => Err(unknown_format(other)),
        }
    }
}

fn unknown_format(id: &str) -> LumenError {
    LumenError::conversion(
        "format.unknown",
        format!("unknown format '{id}'. Supported: ies, ldt, cie"),
    )
    .with_context("format", id)
}

/// Parse a format identifier, for use where a `LumenResult` is expected.
pub fn parse_format_id(id: &str) -> LumenResult<Format> {
    id.parse()
}
