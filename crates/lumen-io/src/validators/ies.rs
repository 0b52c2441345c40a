use lumen_core::{Diagnostics, PhotometricRecord, PhotometryType};

use super::FormatValidator;
use crate::helpers::record_validator::{IES_MAX_HORIZONTAL_ANGLES, IES_MAX_VERTICAL_ANGLES};
use crate::importers::Format;

/// LM-63 checks. Every record can be written, so this only ever warns.
#[derive(Debug, Clone, Copy, Default)]
pub struct IesValidator;

fn one_of(value: Option<&f64>, allowed: &[f64]) -> bool {
    value.is_some_and(|v| allowed.iter().any(|a| (v - a).abs() < 1e-6))
}

impl FormatValidator for IesValidator {
    fn format(&self) -> Format {
        Format::Ies
    }

    fn validate(&self, record: &PhotometricRecord) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let photometry = &record.photometry;
        let (vertical, horizontal) = photometry.grid_shape();

        if vertical > IES_MAX_VERTICAL_ANGLES {
            diag.add_warning_with_field(
                "capacity",
                &format!("{vertical} vertical angles exceed the {IES_MAX_VERTICAL_ANGLES} most LM-63 readers accept"),
                "photometry.vertical_angles",
            );
        }
        if horizontal > IES_MAX_HORIZONTAL_ANGLES {
            diag.add_warning_with_field(
                "capacity",
                &format!("{horizontal} horizontal angles exceed the {IES_MAX_HORIZONTAL_ANGLES} most LM-63 readers accept"),
                "photometry.horizontal_angles",
            );
        }

        // LM-63 fixes where each angle array starts and ends.
        let v = &photometry.vertical_angles;
        let h = &photometry.horizontal_angles;
        let (v_ok, h_ok) = match photometry.photometry_type {
            PhotometryType::C => (
                one_of(v.first(), &[0.0, 90.0]) && one_of(v.last(), &[90.0, 180.0]),
                one_of(h.first(), &[0.0, 90.0]) && one_of(h.last(), &[0.0, 90.0, 180.0, 270.0, 360.0]),
            ),
            PhotometryType::A | PhotometryType::B => (
                one_of(v.first(), &[-90.0, 0.0]) && one_of(v.last(), &[90.0]),
                one_of(h.first(), &[-90.0, 0.0]) && one_of(h.last(), &[0.0, 90.0]),
            ),
        };
        if !v_ok {
            diag.add_warning_with_field(
                "photometry",
                "vertical angles do not start and end where LM-63 expects",
                "photometry.vertical_angles",
            );
        }
        if !h_ok {
            diag.add_warning_with_field(
                "photometry",
                "horizontal angles do not start and end where LM-63 expects",
                "photometry.horizontal_angles",
            );
        }

        diag
    }
}
