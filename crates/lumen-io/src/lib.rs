//! # lumen-io: Photometric File Conversion
//!
//! Reads, writes and detects luminaire photometry files, converting between
//! them through the common model in [`lumen_core`].
//!
//! ## Design Philosophy
//!
//! **Single Responsibility**: Each codec only knows its own byte layout. Every
//! format parses into an intermediate struct (`IesFile`, `LdtFile`,
//! `CieFile`) which is then lifted into a [`lumen_core::PhotometricRecord`].
//! Writing runs the same two steps in reverse.
//!
//! **Lossy Conversions Are Reported**: When the target cannot hold something
//! (electrical data in a CIE i-table, a test lab in EULUMDAT) the conversion
//! still succeeds and the loss shows up as a warning.
//!
//! **Shared, Immutable Registry**: [`ConversionManager`] owns every codec and
//! validator and never mutates them, so one instance serves many threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use lumen_io::{ConversionManager, Format};
//!
//! let manager = ConversionManager::new();
//! let ies = b"IESNA:LM-63-2002\n[MANUFAC] Acme\n[LUMCAT] A-1\nTILT=NONE\n\
//!             1 1000 1 3 1 1 2 0 0 0\n1 1 10\n0 45 90\n0\n100 80 0\n";
//!
//! let output = manager.convert_auto(ies, Format::Cie)?;
//! for warning in output.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//! assert_eq!(output.metadata.source_format, Format::Ies);
//! # Ok::<(), lumen_core::LumenError>(())
//! ```
//!
//! ## Supported Formats
//!
//! | Format | File Extensions | Versions | Notes |
//! |--------|-----------------|----------|-------|
//! | IESNA LM-63 | `.ies` | 1991, 1995, 2002 | TILT=NONE and INCLUDE only |
//! | EULUMDAT | `.ldt`, `.eul` | EULUMDAT | Type C, relative photometry |
//! | CIE i-table | `.cie`, `.txt` | CIE-102 | Fixed 19 x 16 grid |
//!
//! ## Module Overview
//!
//! - [`importers`]: parsers, detection and the [`Format`] enum
//! - [`exporters`]: record to intermediate struct, and byte writers
//! - [`helpers`]: number/token helpers, the grid interpolator and the
//!   cross-format record validator
//! - [`validators`]: per-format structural checks run before writing
//! - [`codec`]: the [`Codec`] trait tying one format's pieces together
//! - [`manager`]: the [`ConversionManager`] façade

pub mod codec;
pub mod exporters;
pub mod helpers;
pub mod importers;
pub mod manager;
pub mod validators;

pub use codec::{
    builtin_codecs, Capabilities, CieCodec, Codec, Detection, ExportResult, IesCodec,
    ImportResult, LdtCodec, LineEnding, WriteOptions,
};
pub use helpers::{validate_and_score, ValidationResult};
pub use importers::{parse_format_id, Format};
pub use manager::{
    ConversionManager, ConversionMetadata, ConversionOutput, DetectionCandidate, DetectionReport,
    FormatInfo,
};
pub use validators::{builtin_validators, FormatValidator};
