use lumen_core::{Diagnostics, PhotometricRecord, PhotometryType};

use super::FormatValidator;
use crate::helpers::{classify_coverage, mirrored_angles, Coverage};
use crate::importers::cie::{standard_c_angles, standard_gamma_angles};
use crate::importers::Format;

/// CIE i-table checks: Type C only, and any grid other than the standard
/// one will be resampled.
#[derive(Debug, Clone, Copy, Default)]
pub struct CieValidator;

fn same_angles(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
}

impl FormatValidator for CieValidator {
    fn format(&self) -> Format {
        Format::Cie
    }

    fn validate(&self, record: &PhotometricRecord) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let photometry = &record.photometry;

        if photometry.photometry_type != PhotometryType::C {
            diag.add_error_with_field(
                "capacity",
                &format!(
                    "CIE i-table stores Type C photometry only, got Type {}",
                    photometry.photometry_type
                ),
                "photometry.photometry_type",
            );
            return diag;
        }

        let above = photometry
            .vertical_angles
            .iter()
            .filter(|g| **g > 90.0 + 1e-6)
            .count();
        if above > 0 {
            diag.add_warning_with_field(
                "capacity",
                &format!("{above} gamma angles above 90° are dropped"),
                "photometry.vertical_angles",
            );
        }

        let horizontal = &photometry.horizontal_angles;
        let full_circle = match classify_coverage(horizontal) {
            Coverage::Rotational => standard_c_angles(),
            Coverage::Full => horizontal.clone(),
            coverage => mirrored_angles(horizontal, coverage),
        };
        let lower: Vec<f64> = photometry
            .vertical_angles
            .iter()
            .copied()
            .filter(|g| *g <= 90.0 + 1e-6)
            .collect();
        if !same_angles(&lower, &standard_gamma_angles())
            || !same_angles(&full_circle, &standard_c_angles())
        {
            diag.add_warning_with_field(
                "photometry",
                "grid is resampled by nearest neighbour onto the 19 x 16 standard grid",
                "photometry.candela_values",
            );
        }

        diag
    }
}
