//! Format-neutral plausibility checks on a photometric record.
//!
//! These run behind `ConversionManager::validate` and go beyond the core
//! invariants: they look for data that is legal but suspicious. Nothing here
//! aborts. Findings are collected into a [`Diagnostics`] and scored.

use lumen_core::{
    photometry::{compare_symmetry, estimate_luminous_flux},
    validate_record, Diagnostics, PhotometricRecord, PhotometryType,
};
use serde::{Deserialize, Serialize};

/// Largest vertical grid the LM-63 reference tools handle.
pub const IES_MAX_VERTICAL_ANGLES: usize = 37;
/// Largest horizontal grid the LM-63 reference tools handle.
pub const IES_MAX_HORIZONTAL_ANGLES: usize = 73;

/// Type A luminaires lower than this (meters) are implausible floodlights.
pub const MIN_TYPE_A_HEIGHT: f64 = 0.05;
pub const MAX_INPUT_WATTS: f64 = 2000.0;
pub const VOLTAGE_RANGE: (f64, f64) = (12.0, 600.0);
/// Plausible efficacy in lm/W.
pub const EFFICACY_RANGE: (f64, f64) = (10.0, 300.0);
/// Allowed relative gap between W and V x I x PF.
pub const SUPPLY_TOLERANCE: f64 = 0.1;
/// Allowed relative gap between declared and integrated flux.
pub const FLUX_TOLERANCE: f64 = 0.2;
/// Share of differing left/right pairs above which symmetry is flagged.
pub const SYMMETRY_MISMATCH_LIMIT: f64 = 0.3;

/// Score lost per warning.
const WARNING_PENALTY: f64 = 0.1;

/// Outcome of a validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 1.0 minus 0.1 per warning, clamped to [0, 1]; 0 when any error
    pub score: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_diagnostics(diag: &Diagnostics) -> Self {
        let warnings: Vec<String> = diag.warnings().map(|i| i.message.clone()).collect();
        let errors: Vec<String> = diag.errors().map(|i| i.message.clone()).collect();
        let is_valid = errors.is_empty();
        let score = if is_valid {
            (1.0 - WARNING_PENALTY * warnings.len() as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            is_valid,
            score,
            warnings,
            errors,
        }
    }
}

/// Validate a record and collect every finding into `diag`.
pub fn validate_photometric_record(record: &PhotometricRecord, diag: &mut Diagnostics) {
    // Phase 1: core invariants. Later phases assume a well-formed grid.
    if let Err(err) = validate_record(record) {
        diag.add_error_with_field("validation", &err.message, &err.code);
        return;
    }

    // Phase 2: photometry type against geometry
    validate_type_geometry(record, diag);

    // Phase 3: grid size against the IES reference capacity
    validate_capacity(record, diag);

    // Phase 4: electrical sanity
    validate_electrical(record, diag);

    // Phase 5: declared flux against the candela grid
    validate_flux(record, diag);

    // Phase 6: left/right symmetry
    validate_symmetry(record, diag);
}

/// Validate and score in one step.
pub fn validate_and_score(record: &PhotometricRecord) -> ValidationResult {
    let mut diag = Diagnostics::new();
    validate_photometric_record(record, &mut diag);
    ValidationResult::from_diagnostics(&diag)
}

fn validate_type_geometry(record: &PhotometricRecord, diag: &mut Diagnostics) {
    if record.photometry.photometry_type == PhotometryType::A
        && record.geometry.height < MIN_TYPE_A_HEIGHT
    {
        diag.add_warning_with_field(
            "geometry",
            &format!(
                "Type A photometry with a luminaire height of {} m is implausible",
                record.geometry.height
            ),
            "geometry.height",
        );
    }
}

fn validate_capacity(record: &PhotometricRecord, diag: &mut Diagnostics) {
    let (vertical, horizontal) = record.photometry.grid_shape();
    if vertical > IES_MAX_VERTICAL_ANGLES {
        diag.add_warning_with_field(
            "capacity",
            &format!("{vertical} vertical angles exceed the IES limit of {IES_MAX_VERTICAL_ANGLES}"),
            "photometry.vertical_angles",
        );
    }
    if horizontal > IES_MAX_HORIZONTAL_ANGLES {
        diag.add_warning_with_field(
            "capacity",
            &format!(
                "{horizontal} horizontal angles exceed the IES limit of {IES_MAX_HORIZONTAL_ANGLES}"
            ),
            "photometry.horizontal_angles",
        );
    }
}

fn validate_electrical(record: &PhotometricRecord, diag: &mut Diagnostics) {
    let electrical = &record.electrical;
    let watts = electrical.input_watts;

    if watts > MAX_INPUT_WATTS {
        diag.add_warning_with_field(
            "electrical",
            &format!("input power of {watts} W is unusually high"),
            "electrical.input_watts",
        );
    }

    if let Some(voltage) = electrical.input_voltage {
        if !(VOLTAGE_RANGE.0..=VOLTAGE_RANGE.1).contains(&voltage) {
            diag.add_warning_with_field(
                "electrical",
                &format!(
                    "input voltage of {voltage} V is outside {}-{} V",
                    VOLTAGE_RANGE.0, VOLTAGE_RANGE.1
                ),
                "electrical.input_voltage",
            );
        }
    }

    let ballast = electrical.ballast_factor;
    if ballast <= 0.0 || ballast > 2.0 {
        diag.add_warning_with_field(
            "electrical",
            &format!("ballast factor {ballast} is outside (0, 2]"),
            "electrical.ballast_factor",
        );
    }

    let flux = record.photometry.luminous_flux;
    if flux > 0.0 && watts > 0.0 {
        let efficacy = flux / watts;
        if !(EFFICACY_RANGE.0..=EFFICACY_RANGE.1).contains(&efficacy) {
            diag.add_warning_with_field(
                "electrical",
                &format!(
                    "efficacy of {efficacy:.1} lm/W is outside {}-{} lm/W",
                    EFFICACY_RANGE.0, EFFICACY_RANGE.1
                ),
                "electrical.input_watts",
            );
        }
    }

    if let (Some(voltage), Some(current), Some(pf)) = (
        electrical.input_voltage,
        electrical.input_current,
        electrical.power_factor,
    ) {
        let apparent = voltage * current * pf;
        if watts > 0.0 && (apparent - watts).abs() > SUPPLY_TOLERANCE * watts {
            diag.add_warning_with_field(
                "electrical",
                &format!("V x I x PF = {apparent:.1} W disagrees with input power of {watts} W"),
                "electrical.input_watts",
            );
        }
    }
}

fn validate_flux(record: &PhotometricRecord, diag: &mut Diagnostics) {
    let declared = record.photometry.luminous_flux;
    if declared <= 0.0 {
        return;
    }
    let Some(estimate) = estimate_luminous_flux(&record.photometry) else {
        return;
    };
    if estimate <= 0.0 {
        return;
    }
    let deviation = (declared - estimate).abs() / estimate;
    if deviation > FLUX_TOLERANCE {
        diag.add_warning_with_field(
            "photometry",
            &format!(
                "declared flux {declared} lm deviates {:.0}% from the {estimate:.1} lm integrated from the candela grid",
                deviation * 100.0
            ),
            "photometry.luminous_flux",
        );
    }
}

fn validate_symmetry(record: &PhotometricRecord, diag: &mut Diagnostics) {
    let Some(comparison) = compare_symmetry(&record.photometry) else {
        return;
    };
    if comparison.mismatch_ratio() > SYMMETRY_MISMATCH_LIMIT {
        diag.add_warning_with_field(
            "photometry",
            &format!(
                "{} of {} mirrored intensity pairs differ by more than 10%",
                comparison.differing, comparison.compared
            ),
            "photometry.candela_values",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Isotropic 100 cd source over the full sphere: 400π lm.
    fn valid_record() -> PhotometricRecord {
        let mut record = PhotometricRecord::new();
        record.metadata.manufacturer = "Acme".into();
        record.metadata.catalog_number = "ISO-1".into();
        record.geometry.height = 0.1;
        record.photometry.vertical_angles = (0..=18).map(|i| i as f64 * 10.0).collect();
        record.photometry.horizontal_angles = vec![0.0, 90.0, 180.0, 270.0];
        record.photometry.candela_values = vec![vec![100.0; 4]; 19];
        record.photometry.luminous_flux = 400.0 * PI;
        record.electrical.input_watts = 10.0;
        record
    }

    #[test]
    fn test_valid_record_scores_one() {
        let result = validate_and_score(&valid_record());
        assert!(result.is_valid, "{:?}", result.warnings);
        assert_eq!(result.score, 1.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_single_warning_scores_point_nine() {
        let mut record = valid_record();
        record.electrical.input_watts = 2500.0;
        record.photometry.luminous_flux = 0.0;
        let result = validate_and_score(&record);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!((result.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_core_error_forces_zero() {
        let mut record = valid_record();
        record.photometry.candela_values.pop();
        record.electrical.input_watts = 2500.0;
        let result = validate_and_score(&record);
        assert!(!result.is_valid);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_flux_cross_check() {
        let mut record = valid_record();
        record.photometry.luminous_flux = 400.0 * PI * 1.5;
        record.electrical.input_watts = 15.0;
        let mut diag = Diagnostics::new();
        validate_photometric_record(&record, &mut diag);
        assert_eq!(diag.issues_by_category("photometry").count(), 1);
    }

    #[test]
    fn test_capacity_and_type_a_height() {
        let mut record = valid_record();
        record.photometry.photometry_type = PhotometryType::A;
        record.photometry.vertical_angles = (0..=40).map(|i| i as f64 * 4.0 - 80.0).collect();
        record.photometry.horizontal_angles = vec![-90.0, 0.0, 90.0];
        record.photometry.candela_values = vec![vec![5.0; 3]; 41];
        record.photometry.luminous_flux = 0.0;
        record.geometry.height = 0.01;
        let mut diag = Diagnostics::new();
        validate_photometric_record(&record, &mut diag);
        assert_eq!(diag.issues_by_category("capacity").count(), 1);
        assert_eq!(diag.issues_by_category("geometry").count(), 1);
    }

    #[test]
    fn test_electrical_supply_mismatch() {
        let mut record = valid_record();
        record.electrical.input_voltage = Some(230.0);
        record.electrical.input_current = Some(0.1);
        record.electrical.power_factor = Some(0.9);
        let mut diag = Diagnostics::new();
        validate_photometric_record(&record, &mut diag);
        // 230 x 0.1 x 0.9 = 20.7 W against 10 W declared
        assert_eq!(diag.warning_count(), 1);

        record.electrical.input_current = Some(0.05);
        let mut diag = Diagnostics::new();
        validate_photometric_record(&record, &mut diag);
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_asymmetric_distribution_flagged() {
        let mut record = valid_record();
        record.photometry.luminous_flux = 0.0;
        for row in record.photometry.candela_values.iter_mut() {
            *row = vec![100.0, 100.0, 10.0, 10.0];
        }
        let mut diag = Diagnostics::new();
        validate_photometric_record(&record, &mut diag);
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.issues[0].message.contains("mirrored"));
    }
}
