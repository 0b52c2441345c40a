//! # lumen-core: Photometric Data Model
//!
//! Provides the format-neutral representation of a luminaire's photometric
//! measurement shared by every codec in the lumen workspace.
//!
//! ## Design Philosophy
//!
//! A [`PhotometricRecord`] is a plain value: it owns all of its data, is
//! produced once by a parser, optionally patched with caller-supplied
//! [`MetadataOverrides`], and consumed by a validator or a writer. Nothing is
//! shared between conversions.
//!
//! The intensity grid is **gamma-major**: `candela_values[v][h]` is the value
//! at `vertical_angles[v]` and `horizontal_angles[h]`. Every consumer assumes
//! the grid is rectangular and fully populated; [`validate_record`] enforces
//! it.
//!
//! ## Quick Start
//!
//! ```rust
//! use lumen_core::*;
//!
//! let mut record = PhotometricRecord::default();
//! record.photometry.vertical_angles = vec![0.0, 45.0, 90.0];
//! record.photometry.horizontal_angles = vec![0.0];
//! record.photometry.candela_values = vec![vec![100.0], vec![70.0], vec![0.0]];
//! record.apply_defaults();
//!
//! assert_eq!(record.metadata.manufacturer, "Unknown");
//! assert_eq!(record.photometry.grid_shape(), (3, 1));
//! assert!(validate_record(&record).is_ok());
//! ```
//!
//! ## Units
//!
//! - Angles in degrees, geometry in meters ([`units`])
//! - Intensity in candela is `candela_values[v][h] * candela_multiplier`
//! - `luminous_flux` is the rated lamp flux in lumens; 0 means "not declared"
//!
//! ## Modules
//!
//! - [`diagnostics`] - Warning/error accumulator
//! - [`error`] - Categorized [`LumenError`]
//! - [`photometry`] - Flux integration and symmetry comparison
//! - [`units`] - Length and angle newtypes
//! - [`validate`] - Structural validation of a record

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod photometry;
pub mod units;
pub mod validate;

pub use diagnostics::{DiagnosticIssue, Diagnostics, ImportDiagnostics, ParseStats, Severity};
pub use error::{BoxedCause, ErrorKind, LumenError, LumenResult};
pub use units::{Degrees, Feet, Meters, Millimeters};
pub use validate::validate_record;

/// Value used for required metadata strings the source file left empty.
pub const UNKNOWN: &str = "Unknown";

/// Plane convention used to sample the light distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhotometryType {
    /// Type A (automotive): horizontal axis through the luminaire
    A,
    /// Type B (floodlight): vertical axis through the luminaire, planes tilted
    B,
    /// Type C (interior/road): vertical axis, C-planes around it
    #[default]
    C,
}

impl PhotometryType {
    pub const ALL: &'static [PhotometryType] =
        &[PhotometryType::A, PhotometryType::B, PhotometryType::C];

    /// LM-63 photometric type code (1 = C, 2 = B, 3 = A).
    pub fn ies_code(self) -> i32 {
        match self {
            PhotometryType::C => 1,
            PhotometryType::B => 2,
            PhotometryType::A => 3,
        }
    }

    pub fn from_ies_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(PhotometryType::C),
            2 => Some(PhotometryType::B),
            3 => Some(PhotometryType::A),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhotometryType::A => "A",
            PhotometryType::B => "B",
            PhotometryType::C => "C",
        }
    }

    /// Allowed vertical angle range in degrees.
    pub fn vertical_range(self) -> (f64, f64) {
        match self {
            PhotometryType::C => (0.0, 180.0),
            PhotometryType::A | PhotometryType::B => (-90.0, 90.0),
        }
    }

    /// Allowed horizontal angle range in degrees.
    pub fn horizontal_range(self) -> (f64, f64) {
        match self {
            PhotometryType::C => (0.0, 360.0),
            PhotometryType::A | PhotometryType::B => (-90.0, 90.0),
        }
    }
}

impl std::fmt::Display for PhotometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether intensities are absolute candela or scaled to rated lamp lumens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsType {
    Absolute,
    #[default]
    Relative,
}

/// Descriptive metadata. Manufacturer and catalog number are required and
/// default to [`UNKNOWN`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub manufacturer: String,
    pub catalog_number: String,
    pub description: String,
    pub luminaire_type: String,
    pub test_lab: String,
    pub test_date: String,
    pub test_number: String,
}

/// Physical and luminous dimensions in meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub luminous_length: f64,
    pub luminous_width: f64,
    pub luminous_height: f64,
}

/// The measured intensity distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotometricMeasurements {
    pub photometry_type: PhotometryType,
    pub units_type: UnitsType,
    /// Rated lamp flux in lumens (0 = not declared)
    pub luminous_flux: f64,
    pub candela_multiplier: f64,
    pub lamp_count: u32,
    /// Strictly ascending, degrees
    pub vertical_angles: Vec<f64>,
    /// Strictly ascending, degrees
    pub horizontal_angles: Vec<f64>,
    /// `candela_values[v][h]`, one row per vertical angle
    pub candela_values: Vec<Vec<f64>>,
    /// Declared light output ratio in percent, when the source states one
    #[serde(default)]
    pub light_output_ratio: Option<f64>,
}

impl Default for PhotometricMeasurements {
    fn default() -> Self {
        Self {
            photometry_type: PhotometryType::C,
            units_type: UnitsType::Relative,
            luminous_flux: 0.0,
            candela_multiplier: 1.0,
            lamp_count: 1,
            vertical_angles: Vec::new(),
            horizontal_angles: Vec::new(),
            candela_values: Vec::new(),
            light_output_ratio: None,
        }
    }
}

impl PhotometricMeasurements {
    /// `(rows, columns)` as declared by the angle arrays.
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.vertical_angles.len(), self.horizontal_angles.len())
    }

    /// True when the matrix matches the angle arrays exactly.
    pub fn is_rectangular(&self) -> bool {
        self.candela_values.len() == self.vertical_angles.len()
            && self
                .candela_values
                .iter()
                .all(|row| row.len() == self.horizontal_angles.len())
    }

    /// Intensity in candela at a grid cell (value times multiplier).
    pub fn intensity(&self, v: usize, h: usize) -> Option<f64> {
        self.candela_values
            .get(v)
            .and_then(|row| row.get(h))
            .map(|value| value * self.candela_multiplier)
    }

    /// Largest intensity in candela, 0 for an empty grid.
    pub fn max_intensity(&self) -> f64 {
        self.candela_values
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(*v))
            * self.candela_multiplier
    }

    /// Values of one horizontal plane, ordered by vertical angle.
    pub fn column(&self, h: usize) -> Vec<f64> {
        self.candela_values
            .iter()
            .filter_map(|row| row.get(h).copied())
            .collect()
    }
}

/// Electrical characteristics of the luminaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalData {
    pub input_watts: f64,
    /// Nominal range 0-2
    pub ballast_factor: f64,
    pub ballast_lamp_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_current: Option<f64>,
    /// 0-1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,
}

impl Default for ElectricalData {
    fn default() -> Self {
        Self {
            input_watts: 0.0,
            ballast_factor: 1.0,
            ballast_lamp_factor: 1.0,
            input_voltage: None,
            input_current: None,
            power_factor: None,
        }
    }
}

impl ElectricalData {
    /// True when voltage, current and power factor are all supplied.
    pub fn has_supply_triplet(&self) -> bool {
        self.input_voltage.is_some() && self.input_current.is_some() && self.power_factor.is_some()
    }
}

/// The common photometric model produced by every parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotometricRecord {
    pub metadata: Metadata,
    pub geometry: Geometry,
    pub photometry: PhotometricMeasurements,
    pub electrical: ElectricalData,
}

impl PhotometricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill required metadata strings with [`UNKNOWN`] and return the paths of
    /// the fields that were defaulted.
    pub fn apply_defaults(&mut self) -> Vec<&'static str> {
        let mut defaulted = Vec::new();
        if self.metadata.manufacturer.trim().is_empty() {
            self.metadata.manufacturer = UNKNOWN.to_string();
            defaulted.push("metadata.manufacturer");
        }
        if self.metadata.catalog_number.trim().is_empty() {
            self.metadata.catalog_number = UNKNOWN.to_string();
            defaulted.push("metadata.catalog_number");
        }
        defaulted
    }

    /// Overwrite metadata with every `Some` field of `overrides`.
    pub fn apply_overrides(&mut self, overrides: &MetadataOverrides) {
        let meta = &mut self.metadata;
        let pairs: [(&Option<String>, &mut String); 7] = [
            (&overrides.manufacturer, &mut meta.manufacturer),
            (&overrides.catalog_number, &mut meta.catalog_number),
            (&overrides.description, &mut meta.description),
            (&overrides.luminaire_type, &mut meta.luminaire_type),
            (&overrides.test_lab, &mut meta.test_lab),
            (&overrides.test_date, &mut meta.test_date),
            (&overrides.test_number, &mut meta.test_number),
        ];
        for (value, target) in pairs {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
    }
}

/// Caller-supplied metadata that replaces what the source file carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataOverrides {
    pub manufacturer: Option<String>,
    pub catalog_number: Option<String>,
    pub description: Option<String>,
    pub luminaire_type: Option<String>,
    pub test_lab: Option<String>,
    pub test_date: Option<String>,
    pub test_number: Option<String>,
}

impl MetadataOverrides {
    pub fn is_empty(&self) -> bool {
        self == &MetadataOverrides::default()
    }
}
