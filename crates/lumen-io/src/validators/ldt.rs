use lumen_core::{Diagnostics, PhotometricRecord, PhotometryType};

use super::FormatValidator;
use crate::exporters::formats::PlaneLayout;
use crate::helpers::uniform_spacing;
use crate::importers::ldt::{MAX_C_PLANES, MAX_GAMMA_ANGLES};
use crate::importers::Format;

/// EULUMDAT checks: Type C only, bounded grid, mirrorable C-planes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdtValidator;

impl FormatValidator for LdtValidator {
    fn format(&self) -> Format {
        Format::Ldt
    }

    fn validate(&self, record: &PhotometricRecord) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let photometry = &record.photometry;

        if photometry.photometry_type != PhotometryType::C {
            diag.add_error_with_field(
                "capacity",
                &format!(
                    "EULUMDAT stores Type C photometry only, got Type {}",
                    photometry.photometry_type
                ),
                "photometry.photometry_type",
            );
            return diag;
        }

        let layout = PlaneLayout::for_angles(&photometry.horizontal_angles);
        let nc = layout.c_angles.len();
        if !layout.is_consistent() {
            diag.add_error_with_field(
                "capacity",
                &format!(
                    "{} horizontal angles do not mirror onto the {nc} C-planes of symmetry {}",
                    layout.stored_planes, layout.symmetry
                ),
                "photometry.horizontal_angles",
            );
        }
        if nc > MAX_C_PLANES {
            diag.add_error_with_field(
                "capacity",
                &format!("{nc} C-planes exceed the EULUMDAT limit of {MAX_C_PLANES}"),
                "photometry.horizontal_angles",
            );
        }
        let ng = photometry.vertical_angles.len();
        if ng > MAX_GAMMA_ANGLES {
            diag.add_error_with_field(
                "capacity",
                &format!("{ng} gamma angles exceed the EULUMDAT limit of {MAX_GAMMA_ANGLES}"),
                "photometry.vertical_angles",
            );
        }

        if nc > 1 && uniform_spacing(&layout.c_angles).is_none() {
            diag.add_warning_with_field(
                "photometry",
                "C-planes are not evenly spaced; Dc is written as 0",
                "photometry.horizontal_angles",
            );
        }
        if ng > 1 && uniform_spacing(&photometry.vertical_angles).is_none() {
            diag.add_warning_with_field(
                "photometry",
                "gamma angles are not evenly spaced; Dg is written as 0",
                "photometry.vertical_angles",
            );
        }

        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(h: Vec<f64>) -> PhotometricRecord {
        let mut record = PhotometricRecord::new();
        record.photometry.vertical_angles = vec![0.0, 45.0, 90.0];
        record.photometry.candela_values = vec![vec![1.0; h.len()]; 3];
        record.photometry.horizontal_angles = h;
        record
    }

    #[test]
    fn test_quarter_plane_is_clean() {
        let diag = LdtValidator.validate(&record(vec![0.0, 30.0, 60.0, 90.0]));
        assert!(diag.issues.is_empty());
    }

    #[test]
    fn test_type_b_is_an_error() {
        let mut rec = record(vec![0.0]);
        rec.photometry.photometry_type = PhotometryType::B;
        let diag = LdtValidator.validate(&rec);
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn test_uneven_planes_warn() {
        let diag = LdtValidator.validate(&record(vec![0.0, 10.0, 90.0, 200.0]));
        assert!(!diag.has_errors());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_too_many_planes() {
        let h: Vec<f64> = (0..800).map(|i| f64::from(i) * 0.45).collect();
        let diag = LdtValidator.validate(&record(h));
        assert!(diag.has_errors());
    }
}
