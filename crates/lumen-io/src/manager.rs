//! Conversion manager: the single entry point for detect, convert, validate
//! and format information.
//!
//! The registry of codecs and validators is built once in the constructor and
//! never changes afterwards. Every call allocates its own working data, so one
//! manager can be shared by reference across threads.
//!
//! ```
//! use lumen_io::{ConversionManager, Format};
//!
//! let manager = ConversionManager::new();
//! let ies = b"IESNA:LM-63-2002\n[MANUFAC] Acme\n[LUMCAT] A-1\nTILT=NONE\n\
//!             1 1000 1 3 1 1 2 0 0 0\n1 1 10\n0 45 90\n0\n100 80 0\n";
//!
//! let detected = manager.detect_format(ies)?;
//! assert_eq!(detected.format, Format::Ies);
//!
//! let output = manager.convert(ies, Format::Ies, Format::Ldt)?;
//! assert!(String::from_utf8_lossy(&output.bytes).starts_with("Acme\n"));
//! # Ok::<(), lumen_core::LumenError>(())
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use lumen_core::{
    validate_record, Diagnostics, ErrorKind, LumenError, LumenResult, MetadataOverrides,
    PhotometricRecord,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{builtin_codecs, Capabilities, Codec, ExportResult, ImportResult, WriteOptions};
use crate::helpers::record_validator::{validate_and_score, ValidationResult};
use crate::importers::Format;
use crate::validators::{builtin_validators, FormatValidator};

/// Alternatives reported next to the best detection match.
const MAX_ALTERNATIVES: usize = 3;

// ============================================================================
// Result types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionCandidate {
    pub format: Format,
    pub confidence: f64,
    pub version: String,
}

/// Best detection match plus ranked runners-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub format: Format,
    pub confidence: f64,
    pub version: String,
    pub alternatives: Vec<DetectionCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionMetadata {
    pub source_format: Format,
    pub target_format: Format,
    pub source_version: String,
    pub vertical_angles: usize,
    pub horizontal_angles: usize,
    pub elapsed_ms: f64,
}

/// Written bytes plus everything noticed on the way.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Parse, target-format and writer findings, in that order
    pub diagnostics: Diagnostics,
    pub metadata: ConversionMetadata,
}

impl ConversionOutput {
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics
            .warnings()
            .map(|issue| issue.message.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatInfo {
    pub format: Format,
    pub name: String,
    pub description: String,
    pub supported_versions: Vec<String>,
    pub file_extensions: Vec<String>,
    pub capabilities: Capabilities,
}

// ============================================================================
// Manager
// ============================================================================

pub struct ConversionManager {
    codecs: BTreeMap<Format, Box<dyn Codec>>,
    validators: BTreeMap<Format, Box<dyn FormatValidator>>,
    options: WriteOptions,
}

impl Default for ConversionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionManager")
            .field("codecs", &self.codecs.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}

impl ConversionManager {
    /// Manager with every built-in format and default write options.
    pub fn new() -> Self {
        Self::with_options(WriteOptions::default())
    }

    pub fn with_options(options: WriteOptions) -> Self {
        Self::from_parts(builtin_codecs(), builtin_validators(), options)
    }

    /// Build from explicit registries. A later entry for the same format
    /// replaces an earlier one.
    pub fn from_parts(
        codecs: Vec<Box<dyn Codec>>,
        validators: Vec<Box<dyn FormatValidator>>,
        options: WriteOptions,
    ) -> Self {
        Self {
            codecs: codecs.into_iter().map(|c| (c.format(), c)).collect(),
            validators: validators.into_iter().map(|v| (v.format(), v)).collect(),
            options,
        }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Registered formats in registry order.
    pub fn formats(&self) -> Vec<Format> {
        self.codecs.keys().copied().collect()
    }

    fn codec(&self, format: Format) -> LumenResult<&dyn Codec> {
        self.codecs
            .get(&format)
            .map(|codec| codec.as_ref())
            .ok_or_else(|| {
                LumenError::system(
                    "registry.codec",
                    "no codec registered for format",
                    format!("{format} is not in the codec registry"),
                )
                .with_context("format", format)
            })
    }

    // ------------------------------------------------------------------------
    // Detection
    // ------------------------------------------------------------------------

    /// Rank every codec's confidence for `bytes`.
    ///
    /// Ties keep registry order. Fails with a system error when no codec
    /// reports a confidence above zero.
    pub fn detect_format(&self, bytes: &[u8]) -> LumenResult<DetectionReport> {
        let mut candidates: Vec<DetectionCandidate> = self
            .codecs
            .values()
            .map(|codec| {
                let detection = codec.detect(bytes);
                DetectionCandidate {
                    format: codec.format(),
                    confidence: detection.confidence,
                    version: detection.version,
                }
            })
            .filter(|candidate| candidate.confidence > 0.0)
            .collect();
        // Stable sort, so equal scores stay in registry order.
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if candidates.is_empty() {
            return Err(LumenError::system(
                "detect.no_match",
                "input does not look like any supported photometric format",
                format!(
                    "{} bytes scored zero against {} formats",
                    bytes.len(),
                    self.codecs.len()
                ),
            ));
        }

        let best = candidates.remove(0);
        candidates.truncate(MAX_ALTERNATIVES);
        info!(
            format = %best.format,
            confidence = best.confidence,
            version = %best.version,
            alternatives = candidates.len(),
            "detected format"
        );
        Ok(DetectionReport {
            format: best.format,
            confidence: best.confidence,
            version: best.version,
            alternatives: candidates,
        })
    }

    // ------------------------------------------------------------------------
    // Parse / write
    // ------------------------------------------------------------------------

    pub fn parse(&self, bytes: &[u8], format: Format) -> LumenResult<ImportResult> {
        let result = self.codec(format)?.parse(bytes)?;
        debug!(
            format = %format,
            version = %result.version,
            warnings = result.diagnostics.warning_count(),
            "parsed input"
        );
        Ok(result)
    }

    /// Validate `record` for `format` and write it.
    ///
    /// Core invariant failures become validation errors; anything the target
    /// validator rejects becomes a conversion error. Validator warnings are
    /// returned ahead of the writer's own.
    pub fn write(&self, record: &PhotometricRecord, format: Format) -> LumenResult<ExportResult> {
        let codec = self.codec(format)?;

        validate_record(record).map_err(|err| {
            LumenError::wrap(
                ErrorKind::Validation,
                "validate.record",
                "record violates the common model invariants",
                err,
            )
        })?;

        let mut diagnostics = match self.validators.get(&format) {
            Some(validator) => validator.validate(record),
            None => Diagnostics::new(),
        };
        if diagnostics.has_errors() {
            let reasons: Vec<String> = diagnostics.errors().map(|i| i.message.clone()).collect();
            return Err(LumenError::conversion(
                "convert.unsupported",
                format!(
                    "record cannot be written as {}: {}",
                    format.friendly_name(),
                    reasons.join("; ")
                ),
            )
            .with_context("format", format)
            .with_warnings(diagnostics.warnings().map(|i| i.message.clone())));
        }

        let export = codec.write(record, &self.options)?;
        diagnostics.merge(export.diagnostics);
        Ok(ExportResult {
            bytes: export.bytes,
            diagnostics,
        })
    }

    // ------------------------------------------------------------------------
    // Convert
    // ------------------------------------------------------------------------

    pub fn convert(&self, bytes: &[u8], source: Format, target: Format) -> LumenResult<ConversionOutput> {
        self.convert_with_overrides(bytes, source, target, &MetadataOverrides::default())
    }

    /// Parse, apply metadata overrides, validate and write.
    pub fn convert_with_overrides(
        &self,
        bytes: &[u8],
        source: Format,
        target: Format,
        overrides: &MetadataOverrides,
    ) -> LumenResult<ConversionOutput> {
        let started = Instant::now();

        let imported = self.parse(bytes, source)?;
        let mut record = imported.record;
        if !overrides.is_empty() {
            record.apply_overrides(overrides);
            debug!("applied metadata overrides");
        }

        let export = self.write(&record, target)?;

        let mut diagnostics = imported.diagnostics.into_diagnostics();
        diagnostics.merge(export.diagnostics);
        let (vertical_angles, horizontal_angles) = record.photometry.grid_shape();
        let metadata = ConversionMetadata {
            source_format: source,
            target_format: target,
            source_version: imported.version,
            vertical_angles,
            horizontal_angles,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        if diagnostics.has_warnings() {
            warn!(
                source = %source,
                target = %target,
                warnings = diagnostics.warning_count(),
                "converted with warnings"
            );
        } else {
            info!(source = %source, target = %target, "converted");
        }

        Ok(ConversionOutput {
            bytes: export.bytes,
            diagnostics,
            metadata,
        })
    }

    /// Detect the source format, then convert.
    pub fn convert_auto(&self, bytes: &[u8], target: Format) -> LumenResult<ConversionOutput> {
        let detected = self.detect_format(bytes)?;
        self.convert(bytes, detected.format, target)
    }

    // ------------------------------------------------------------------------
    // Validate / info
    // ------------------------------------------------------------------------

    /// Cross-format plausibility checks with a quality score. Never fails.
    pub fn validate(&self, record: &PhotometricRecord) -> ValidationResult {
        let result = validate_and_score(record);
        debug!(
            valid = result.is_valid,
            score = result.score,
            warnings = result.warnings.len(),
            errors = result.errors.len(),
            "validated record"
        );
        result
    }

    pub fn format_info(&self, format: Format) -> LumenResult<FormatInfo> {
        let codec = self.codec(format)?;
        Ok(FormatInfo {
            format,
            name: format.friendly_name().to_string(),
            description: format.description().to_string(),
            supported_versions: codec
                .supported_versions()
                .iter()
                .map(|v| v.to_string())
                .collect(),
            file_extensions: format.extensions().iter().map(|e| e.to_string()).collect(),
            capabilities: codec.capabilities(),
        })
    }

    pub fn format_info_by_id(&self, id: &str) -> LumenResult<FormatInfo> {
        self.format_info(id.parse()?)
    }
}
