//! The codec seam: one implementation per file format.
//!
//! A [`Codec`] turns bytes into a [`PhotometricRecord`] and back, and scores
//! how likely a byte buffer is to be in its format. Codecs hold no state, so
//! the conversion manager shares a single instance of each across threads.

use lumen_core::{Diagnostics, ImportDiagnostics, LumenResult, PhotometricRecord, PhotometryType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::exporters::formats::{write_cie, write_ies, write_ldt};
use crate::helpers::decode_text;
use crate::importers::cie::{detect_cie, parse_cie, CieFile, CIE_C_PLANE_COUNT, CIE_GAMMA_COUNT, CIE_VERSION};
use crate::importers::ies::{detect_ies, parse_ies, IesFile, IES_VERSIONS};
use crate::importers::ldt::{
    detect_ldt, parse_ldt, LdtFile, LDT_VERSION, MAX_C_PLANES, MAX_GAMMA_ANGLES,
};
use crate::importers::Format;

/// Output of a successful parse.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub record: PhotometricRecord,
    pub diagnostics: ImportDiagnostics,
    /// Detected format version, e.g. `LM-63-2002`
    pub version: String,
}

/// Output of a successful write.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    /// Lossy-field warnings raised while writing
    pub diagnostics: Diagnostics,
}

/// Result of content sniffing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// In `[0, 1]`; 0 means "not this format"
    pub confidence: f64,
    /// Empty when confidence is 0
    pub version: String,
}

impl Detection {
    pub fn none() -> Self {
        Self {
            confidence: 0.0,
            version: String::new(),
        }
    }

    pub fn new(confidence: f64, version: impl Into<String>) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            version: version.into(),
        }
    }

    /// Apply a per-format acceptance threshold.
    pub fn thresholded(score: f64, threshold: f64, version: &str) -> Self {
        if score < threshold {
            Self::none()
        } else {
            Self::new(score, version)
        }
    }

    pub fn is_match(&self) -> bool {
        self.confidence > 0.0
    }
}

/// Line terminator used by writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Knobs for the byte layout of written files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// `LM-63-2002`, `LM-63-1995` or `LM-63-1991`
    pub ies_version: String,
    /// Write EULUMDAT numbers with a decimal comma
    pub ldt_decimal_comma: bool,
    /// Decimals in CIE intensity values
    pub cie_precision: usize,
    pub line_ending: LineEnding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            ies_version: "LM-63-2002".to_string(),
            ldt_decimal_comma: false,
            cie_precision: 1,
            line_ending: LineEnding::Lf,
        }
    }
}

/// What a format can carry; reported through `format_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capabilities {
    pub photometry_types: Vec<PhotometryType>,
    pub absolute_photometry: bool,
    pub relative_photometry: bool,
    /// `None` means unbounded
    pub max_vertical_angles: Option<usize>,
    pub max_horizontal_angles: Option<usize>,
    pub fixed_grid: bool,
    pub preserves_metadata: bool,
    pub preserves_geometry: bool,
    pub preserves_electrical: bool,
}

/// Parse, write and detect one photometric file format.
pub trait Codec: Send + Sync {
    fn format(&self) -> Format;

    /// Parse bytes into the common model.
    fn parse(&self, bytes: &[u8]) -> LumenResult<ImportResult>;

    /// Serialize a record. Fails with a conversion error when the record
    /// cannot be represented in this format.
    fn write(&self, record: &PhotometricRecord, options: &WriteOptions)
        -> LumenResult<ExportResult>;

    /// Score how likely `bytes` is to be in this format.
    fn detect(&self, bytes: &[u8]) -> Detection;

    fn supported_versions(&self) -> &'static [&'static str];

    fn capabilities(&self) -> Capabilities;
}

// ============================================================================
// Built-in codecs
// ============================================================================

/// One codec per supported format, in registry order.
pub fn builtin_codecs() -> Vec<Box<dyn Codec>> {
    vec![Box::new(IesCodec), Box::new(LdtCodec), Box::new(CieCodec)]
}

fn log_write(format: Format, diagnostics: &Diagnostics) {
    for issue in diagnostics.warnings() {
        debug!(format = %format, field = ?issue.field, "{}", issue.message);
    }
}

/// IESNA LM-63.
#[derive(Debug, Clone, Copy, Default)]
pub struct IesCodec;

impl Codec for IesCodec {
    fn format(&self) -> Format {
        Format::Ies
    }

    fn parse(&self, bytes: &[u8]) -> LumenResult<ImportResult> {
        let text = decode_text(bytes);
        let (file, mut diagnostics) = parse_ies(&text)?;
        let record = file.to_record(&mut diagnostics)?;
        debug!(
            version = %file.version,
            keywords = diagnostics.stats.keywords,
            "parsed LM-63 file"
        );
        Ok(ImportResult {
            record,
            diagnostics,
            version: file.version,
        })
    }

    fn write(
        &self,
        record: &PhotometricRecord,
        options: &WriteOptions,
    ) -> LumenResult<ExportResult> {
        let mut diagnostics = Diagnostics::new();
        let file = IesFile::from_record(record, options, &mut diagnostics)?;
        let text = write_ies(&file, options)?;
        log_write(Format::Ies, &diagnostics);
        Ok(ExportResult {
            bytes: text.into_bytes(),
            diagnostics,
        })
    }

    fn detect(&self, bytes: &[u8]) -> Detection {
        detect_ies(&decode_text(bytes))
    }

    fn supported_versions(&self) -> &'static [&'static str] {
        IES_VERSIONS
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            photometry_types: PhotometryType::ALL.to_vec(),
            absolute_photometry: true,
            relative_photometry: true,
            max_vertical_angles: None,
            max_horizontal_angles: None,
            fixed_grid: false,
            preserves_metadata: true,
            preserves_geometry: true,
            preserves_electrical: true,
        }
    }
}

/// EULUMDAT.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdtCodec;

impl Codec for LdtCodec {
    fn format(&self) -> Format {
        Format::Ldt
    }

    fn parse(&self, bytes: &[u8]) -> LumenResult<ImportResult> {
        let text = decode_text(bytes);
        let (file, mut diagnostics) = parse_ldt(&text)?;
        let record = file.to_record(&mut diagnostics)?;
        debug!(
            symmetry = file.symmetry,
            nc = file.nc,
            ng = file.ng,
            "parsed EULUMDAT file"
        );
        Ok(ImportResult {
            record,
            diagnostics,
            version: LDT_VERSION.to_string(),
        })
    }

    fn write(
        &self,
        record: &PhotometricRecord,
        options: &WriteOptions,
    ) -> LumenResult<ExportResult> {
        let mut diagnostics = Diagnostics::new();
        let file = LdtFile::from_record(record, &mut diagnostics)?;
        let text = write_ldt(&file, options)?;
        log_write(Format::Ldt, &diagnostics);
        Ok(ExportResult {
            bytes: text.into_bytes(),
            diagnostics,
        })
    }

    fn detect(&self, bytes: &[u8]) -> Detection {
        detect_ldt(&decode_text(bytes))
    }

    fn supported_versions(&self) -> &'static [&'static str] {
        &[LDT_VERSION]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            photometry_types: vec![PhotometryType::C],
            absolute_photometry: false,
            relative_photometry: true,
            max_vertical_angles: Some(MAX_GAMMA_ANGLES),
            max_horizontal_angles: Some(MAX_C_PLANES),
            fixed_grid: false,
            preserves_metadata: true,
            preserves_geometry: true,
            preserves_electrical: false,
        }
    }
}

/// CIE i-table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CieCodec;

impl Codec for CieCodec {
    fn format(&self) -> Format {
        Format::Cie
    }

    fn parse(&self, bytes: &[u8]) -> LumenResult<ImportResult> {
        let text = decode_text(bytes);
        let (file, mut diagnostics) = parse_cie(&text)?;
        let record = file.to_record(&mut diagnostics)?;
        debug!(symmetry = file.symmetry, "parsed CIE i-table");
        Ok(ImportResult {
            record,
            diagnostics,
            version: CIE_VERSION.to_string(),
        })
    }

    fn write(
        &self,
        record: &PhotometricRecord,
        options: &WriteOptions,
    ) -> LumenResult<ExportResult> {
        let mut diagnostics = Diagnostics::new();
        let file = CieFile::from_record(record, &mut diagnostics)?;
        let text = write_cie(&file, options)?;
        log_write(Format::Cie, &diagnostics);
        Ok(ExportResult {
            bytes: text.into_bytes(),
            diagnostics,
        })
    }

    fn detect(&self, bytes: &[u8]) -> Detection {
        detect_cie(&decode_text(bytes))
    }

    fn supported_versions(&self) -> &'static [&'static str] {
        &[CIE_VERSION]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            photometry_types: vec![PhotometryType::C],
            absolute_photometry: false,
            relative_photometry: true,
            max_vertical_angles: Some(CIE_GAMMA_COUNT),
            max_horizontal_angles: Some(CIE_C_PLANE_COUNT),
            fixed_grid: true,
            preserves_metadata: false,
            preserves_geometry: false,
            preserves_electrical: false,
        }
    }
}
