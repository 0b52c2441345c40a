//! CIE i-table parser.
//!
//! The i-table is a fixed grid: a header line `<fmt> <symmetry> <reserved>
//! <description>` followed by 19 rows (gamma 0°-90° in 5° steps) of 16
//! intensities (C 0°-337.5° in 22.5° steps) in cd/klm. A row may start with
//! its gamma angle, giving 17 tokens.
//!
//! The format has no fields for manufacturer, catalog number, wattage or
//! flux. These are mined from the free-text description, which by convention
//! reads like `OSL0526 PLED II 17W AE 3000K 2172.2 lms`.

use lumen_core::{
    ElectricalData, ImportDiagnostics, LumenError, LumenResult, Metadata, PhotometricMeasurements,
    PhotometricRecord, PhotometryType, UnitsType,
};
use serde::Serialize;

use crate::codec::Detection;
use crate::helpers::{is_numeric_token, parse_number};

pub const CIE_VERSION: &str = "CIE-102";

pub const CIE_GAMMA_COUNT: usize = 19;
pub const CIE_C_PLANE_COUNT: usize = 16;
pub const CIE_GAMMA_STEP: f64 = 5.0;
pub const CIE_C_PLANE_STEP: f64 = 22.5;

/// Gamma angles of the standard grid, 0°-90°.
pub fn standard_gamma_angles() -> Vec<f64> {
    (0..CIE_GAMMA_COUNT).map(|i| i as f64 * CIE_GAMMA_STEP).collect()
}

/// C-plane angles of the standard grid, 0°-337.5°.
pub fn standard_c_angles() -> Vec<f64> {
    (0..CIE_C_PLANE_COUNT)
        .map(|i| i as f64 * CIE_C_PLANE_STEP)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CieFile {
    pub format_type: i32,
    /// 1 rotationally symmetric, 0 anything else
    pub symmetry: i32,
    pub reserved: i32,
    pub description: String,
    /// `values[gamma][c]` in cd/klm
    pub values: Vec<Vec<f64>>,
}

// ============================================================================
// Description mining
// ============================================================================

/// Fields recovered from the free-text description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DescriptionFields {
    pub manufacturer: Option<String>,
    pub catalog_number: Option<String>,
    pub luminous_flux: Option<f64>,
    pub input_watts: Option<f64>,
}

fn is_lumen_unit(token: &str) -> bool {
    matches!(token.to_ascii_lowercase().as_str(), "lm" | "lms")
}

/// `2172.2lms` -> 2172.2
fn number_with_lumen_suffix(token: &str) -> Option<f64> {
    let lower = token.to_ascii_lowercase();
    let digits = lower
        .strip_suffix("lms")
        .or_else(|| lower.strip_suffix("lm"))?;
    parse_number(digits)
}

/// `17W` -> 17
fn watts(token: &str) -> Option<f64> {
    parse_number(token.strip_suffix(['W', 'w'])?)
}

pub fn mine_description(description: &str) -> DescriptionFields {
    let tokens: Vec<&str> = description.split_whitespace().collect();
    let Some((first, rest)) = tokens.split_first() else {
        return DescriptionFields::default();
    };

    let catalog_number = rest
        .iter()
        .find(|t| t.ends_with('W') || t.to_ascii_uppercase().contains("LED"))
        .map(|t| t.to_string());

    let luminous_flux = tokens.iter().enumerate().find_map(|(i, token)| {
        if i > 0 && is_lumen_unit(token) {
            parse_number(tokens[i - 1])
        } else {
            number_with_lumen_suffix(token)
        }
    });

    DescriptionFields {
        manufacturer: Some(first.to_string()),
        catalog_number,
        luminous_flux,
        input_watts: rest.iter().find_map(|t| watts(t)),
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Split off three leading fields, returning them and the rest of the line.
fn split_header(line: &str) -> Option<([&str; 3], &str)> {
    let mut rest = line.trim_start();
    let mut fields = [""; 3];
    for field in fields.iter_mut() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }
    Some((fields, rest.trim_end()))
}

fn header_integer(token: &str, name: &str, line: usize) -> LumenResult<i32> {
    token.parse::<i32>().map_err(|_| {
        LumenError::syntax("cie.header", format!("{name} must be an integer"))
            .with_context("token", token)
            .with_context("line", line)
    })
}

pub fn parse_cie(text: &str) -> LumenResult<(CieFile, ImportDiagnostics)> {
    let mut diag = ImportDiagnostics::new();
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| LumenError::syntax("cie.empty", "file is empty"))?;
    let ([fmt, symmetry, reserved], description) = split_header(header).ok_or_else(|| {
        LumenError::syntax(
            "cie.header",
            "header needs format, symmetry and reserved fields before the description",
        )
        .with_context("line", header_line)
    })?;
    let format_type = header_integer(fmt, "format type", header_line)?;
    let symmetry = header_integer(symmetry, "symmetry type", header_line)?;
    let reserved = header_integer(reserved, "reserved field", header_line)?;

    let mut values = Vec::with_capacity(CIE_GAMMA_COUNT);
    for row in 0..CIE_GAMMA_COUNT {
        let expected_gamma = row as f64 * CIE_GAMMA_STEP;
        let (line_no, line) = lines.next().ok_or_else(|| {
            LumenError::syntax("cie.truncated", "fewer than 19 intensity rows")
                .with_context("rows", row)
        })?;
        let numbers = line
            .split_whitespace()
            .map(|token| {
                parse_number(token).ok_or_else(|| {
                    LumenError::syntax("cie.number", "expected a number in intensity row")
                        .with_context("token", token)
                        .with_context("line", line_no)
                })
            })
            .collect::<LumenResult<Vec<f64>>>()?;

        let intensities = match numbers.len() {
            CIE_C_PLANE_COUNT => numbers,
            n if n == CIE_C_PLANE_COUNT + 1 => {
                if (numbers[0] - expected_gamma).abs() > 1e-6 {
                    return Err(LumenError::syntax(
                        "cie.gamma",
                        "row gamma angle does not match the standard grid",
                    )
                    .with_context("expected", expected_gamma)
                    .with_context("found", numbers[0])
                    .with_context("line", line_no));
                }
                numbers[1..].to_vec()
            }
            n => {
                return Err(LumenError::syntax(
                    "cie.row",
                    "intensity row must hold 16 values",
                )
                .with_context("found", n)
                .with_context("line", line_no))
            }
        };
        values.push(intensities);
    }

    for (line_no, _) in lines {
        diag.add_skipped_line("parse", "trailing line after the intensity grid ignored", line_no);
    }

    diag.stats.vertical_angles = CIE_GAMMA_COUNT;
    diag.stats.horizontal_angles = CIE_C_PLANE_COUNT;

    let file = CieFile {
        format_type,
        symmetry,
        reserved,
        description: description.to_string(),
        values,
    };
    Ok((file, diag))
}

// ============================================================================
// Common model mapping
// ============================================================================

impl CieFile {
    pub fn to_record(&self, diag: &mut ImportDiagnostics) -> LumenResult<PhotometricRecord> {
        if !matches!(self.symmetry, 0 | 1) {
            diag.add_warning(
                "parse",
                &format!("unknown symmetry type {}; grid read as-is", self.symmetry),
            );
        }

        let mined = mine_description(&self.description);
        let luminous_flux = mined.luminous_flux.filter(|f| *f > 0.0).unwrap_or(0.0);
        let flux_ref = if luminous_flux > 0.0 {
            luminous_flux
        } else {
            1000.0
        };

        let metadata = Metadata {
            manufacturer: mined.manufacturer.unwrap_or_default(),
            catalog_number: mined.catalog_number.unwrap_or_default(),
            description: self.description.clone(),
            ..Metadata::default()
        };

        let photometry = PhotometricMeasurements {
            photometry_type: PhotometryType::C,
            units_type: UnitsType::Relative,
            luminous_flux,
            candela_multiplier: flux_ref,
            lamp_count: 1,
            vertical_angles: standard_gamma_angles(),
            horizontal_angles: standard_c_angles(),
            candela_values: self
                .values
                .iter()
                .map(|row| row.iter().map(|v| v / 1000.0).collect())
                .collect(),
            light_output_ratio: None,
        };

        let electrical = ElectricalData {
            input_watts: mined.input_watts.unwrap_or(0.0),
            ..ElectricalData::default()
        };

        let mut record = PhotometricRecord {
            metadata,
            photometry,
            electrical,
            ..PhotometricRecord::default()
        };
        for field in record.apply_defaults() {
            diag.add_defaulted(field, "not found in description; using 'Unknown'");
        }
        Ok(record)
    }
}

// ============================================================================
// Detection
// ============================================================================

pub fn detect_cie(text: &str) -> Detection {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let Some((first, rest)) = lines.split_first() else {
        return Detection::none();
    };

    let mut score = 0.0;
    let header: Vec<&str> = first.split_whitespace().collect();
    if header.len() >= 4 && header[..3].iter().all(|t| t.parse::<i64>().is_ok()) {
        score += 0.4;
    }

    if !rest.is_empty() {
        let grid_rows = rest
            .iter()
            .filter(|line| {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                (CIE_C_PLANE_COUNT..=CIE_C_PLANE_COUNT + 1).contains(&tokens.len())
                    && tokens.iter().all(|t| is_numeric_token(t))
            })
            .count();
        score += 0.5 * grid_rows as f64 / rest.len() as f64;
        if grid_rows == CIE_GAMMA_COUNT {
            score += 0.1;
        }
    }
    Detection::thresholded(score, 0.4, CIE_VERSION)
}
