//! Structural validation of a [`PhotometricRecord`].
//!
//! Sub-records are checked in order (metadata, geometry, photometry,
//! electrical) and the first violation is returned as a
//! [`ErrorKind::Semantic`](crate::ErrorKind::Semantic) error. Softer
//! plausibility checks (efficacy, symmetry, flux cross-check) are not done
//! here; they live with the conversion manager and accumulate as warnings.

use crate::error::{LumenError, LumenResult};
use crate::{ElectricalData, Geometry, Metadata, PhotometricMeasurements, PhotometricRecord};

/// Slack allowed when comparing a luminous dimension with its physical one.
const DIMENSION_EPSILON: f64 = 1e-9;

/// Validate every invariant of the common model.
pub fn validate_record(record: &PhotometricRecord) -> LumenResult<()> {
    validate_metadata(&record.metadata)?;
    validate_geometry(&record.geometry)?;
    validate_photometry(&record.photometry)?;
    validate_electrical(&record.electrical)?;
    Ok(())
}

pub fn validate_metadata(metadata: &Metadata) -> LumenResult<()> {
    if metadata.manufacturer.trim().is_empty() {
        return Err(LumenError::semantic(
            "metadata.manufacturer",
            "manufacturer is required",
        ));
    }
    if metadata.catalog_number.trim().is_empty() {
        return Err(LumenError::semantic(
            "metadata.catalog_number",
            "catalog number is required",
        ));
    }
    Ok(())
}

pub fn validate_geometry(geometry: &Geometry) -> LumenResult<()> {
    let dims = [
        ("length", geometry.length, "luminous_length", geometry.luminous_length),
        ("width", geometry.width, "luminous_width", geometry.luminous_width),
        ("height", geometry.height, "luminous_height", geometry.luminous_height),
    ];

    for (name, physical, luminous_name, luminous) in dims {
        check_non_negative("geometry", name, physical)?;
        check_non_negative("geometry", luminous_name, luminous)?;
        if physical > 0.0 && luminous > physical + DIMENSION_EPSILON {
            return Err(LumenError::semantic(
                "geometry.luminous_exceeds_physical",
                format!("{luminous_name} exceeds {name}"),
            )
            .with_context(luminous_name, luminous)
            .with_context(name, physical));
        }
    }
    Ok(())
}

pub fn validate_photometry(photometry: &PhotometricMeasurements) -> LumenResult<()> {
    check_non_negative("photometry", "luminous_flux", photometry.luminous_flux)?;

    let multiplier = photometry.candela_multiplier;
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(LumenError::semantic(
            "photometry.candela_multiplier",
            "candela multiplier must be positive",
        )
        .with_context("candela_multiplier", multiplier));
    }

    if photometry.lamp_count == 0 {
        return Err(LumenError::semantic(
            "photometry.lamp_count",
            "lamp count must be at least 1",
        ));
    }

    let ty = photometry.photometry_type;
    check_angles(
        "vertical_angles",
        &photometry.vertical_angles,
        ty.vertical_range(),
    )
    .map_err(|err| err.with_context("photometry_type", ty))?;
    check_angles(
        "horizontal_angles",
        &photometry.horizontal_angles,
        ty.horizontal_range(),
    )
    .map_err(|err| err.with_context("photometry_type", ty))?;

    let (rows, cols) = photometry.grid_shape();
    if photometry.candela_values.len() != rows {
        return Err(LumenError::semantic(
            "photometry.shape",
            "candela row count does not match vertical angle count",
        )
        .with_context("rows", photometry.candela_values.len())
        .with_context("vertical_angles", rows));
    }

    for (v, row) in photometry.candela_values.iter().enumerate() {
        if row.len() != cols {
            return Err(LumenError::semantic(
                "photometry.shape",
                "candela row length does not match horizontal angle count",
            )
            .with_context("row", v)
            .with_context("length", row.len())
            .with_context("horizontal_angles", cols));
        }
        for (h, value) in row.iter().enumerate() {
            if !value.is_finite() || *value < 0.0 {
                return Err(LumenError::semantic(
                    "photometry.candela_value",
                    "candela values must be finite and non-negative",
                )
                .with_context("row", v)
                .with_context("column", h)
                .with_context("value", value));
            }
        }
    }
    Ok(())
}

pub fn validate_electrical(electrical: &ElectricalData) -> LumenResult<()> {
    check_non_negative("electrical", "input_watts", electrical.input_watts)?;
    check_non_negative("electrical", "ballast_factor", electrical.ballast_factor)?;
    check_non_negative(
        "electrical",
        "ballast_lamp_factor",
        electrical.ballast_lamp_factor,
    )?;
    if let Some(voltage) = electrical.input_voltage {
        check_non_negative("electrical", "input_voltage", voltage)?;
    }
    if let Some(current) = electrical.input_current {
        check_non_negative("electrical", "input_current", current)?;
    }
    if let Some(pf) = electrical.power_factor {
        if !pf.is_finite() || !(0.0..=1.0).contains(&pf) {
            return Err(LumenError::semantic(
                "electrical.power_factor",
                "power factor must lie in [0, 1]",
            )
            .with_context("power_factor", pf));
        }
    }
    Ok(())
}

fn check_non_negative(section: &str, field: &str, value: f64) -> LumenResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LumenError::semantic(
            format!("{section}.{field}"),
            format!("{field} must be finite and non-negative"),
        )
        .with_context(field, value));
    }
    Ok(())
}

fn check_angles(field: &str, angles: &[f64], (min, max): (f64, f64)) -> LumenResult<()> {
    let code = format!("photometry.{field}");
    if angles.is_empty() {
        return Err(LumenError::semantic(code, format!("{field} is empty")));
    }
    for (i, angle) in angles.iter().enumerate() {
        if !angle.is_finite() || *angle < min || *angle > max {
            return Err(LumenError::semantic(
                code,
                format!("{field} must lie in [{min}, {max}]"),
            )
            .with_context("index", i)
            .with_context("angle", angle));
        }
    }
    if let Some(i) = angles.windows(2).position(|pair| pair[1] <= pair[0]) {
        return Err(
            LumenError::semantic(code, format!("{field} must be strictly ascending"))
                .with_context("index", i + 1)
                .with_context("angle", angles[i + 1]),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, PhotometryType};

    fn valid_record() -> PhotometricRecord {
        let mut record = PhotometricRecord::new();
        record.metadata.manufacturer = "Acme".into();
        record.metadata.catalog_number = "A-1".into();
        record.geometry.length = 0.6;
        record.geometry.luminous_length = 0.5;
        record.photometry.vertical_angles = vec![0.0, 90.0, 180.0];
        record.photometry.horizontal_angles = vec![0.0, 90.0];
        record.photometry.candela_values = vec![vec![10.0, 10.0], vec![5.0, 4.0], vec![0.0, 0.0]];
        record
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(validate_record(&valid_record()).is_ok());
    }

    #[test]
    fn test_missing_manufacturer() {
        let mut record = valid_record();
        record.metadata.manufacturer.clear();
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.code, "metadata.manufacturer");
    }

    #[test]
    fn test_short_row_is_shape_error() {
        let mut record = valid_record();
        record.photometry.candela_values[1].pop();
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "photometry.shape");
        assert_eq!(err.context_value("row"), Some("1"));
    }

    #[test]
    fn test_missing_row_is_shape_error() {
        let mut record = valid_record();
        record.photometry.candela_values.pop();
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "photometry.shape");
    }

    #[test]
    fn test_negative_intensity() {
        let mut record = valid_record();
        record.photometry.candela_values[0][1] = -1.0;
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "photometry.candela_value");
    }

    #[test]
    fn test_angles_must_ascend() {
        let mut record = valid_record();
        record.photometry.horizontal_angles = vec![90.0, 0.0];
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "photometry.horizontal_angles");
    }

    #[test]
    fn test_angle_ranges_follow_photometry_type() {
        let mut record = valid_record();
        record.photometry.vertical_angles = vec![-45.0, 0.0, 45.0];
        assert!(validate_record(&record).is_err());
        record.photometry.photometry_type = PhotometryType::B;
        record.photometry.horizontal_angles = vec![-10.0, 10.0];
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn test_luminous_larger_than_physical() {
        let mut record = valid_record();
        record.geometry.luminous_length = 0.7;
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "geometry.luminous_exceeds_physical");
    }

    #[test]
    fn test_luminous_allowed_without_physical() {
        let mut record = valid_record();
        record.geometry.width = 0.0;
        record.geometry.luminous_width = 0.3;
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn test_power_factor_range() {
        let mut record = valid_record();
        record.electrical.power_factor = Some(1.2);
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "electrical.power_factor");
    }

    #[test]
    fn test_multiplier_must_be_positive() {
        let mut record = valid_record();
        record.photometry.candela_multiplier = 0.0;
        let err = validate_record(&record).unwrap_err();
        assert_eq!(err.code, "photometry.candela_multiplier");
    }
}
