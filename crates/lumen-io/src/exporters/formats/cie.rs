//! CIE i-table writer.
//!
//! Every record is written on the standard 19 x 16 grid. Symmetric coverage is
//! first expanded to the full circle, then the nearest-neighbour resampler
//! picks one source sample per standard cell. Gamma angles above 90° have no
//! place in the table and are lost.

use lumen_core::{Diagnostics, LumenError, LumenResult, PhotometricRecord, PhotometryType};

use crate::codec::WriteOptions;
use crate::helpers::{expand_to_full_circle, format_fixed, format_number, join_lines, resample};
use crate::importers::cie::{
    standard_c_angles, standard_gamma_angles, CieFile, CIE_C_PLANE_COUNT, CIE_GAMMA_COUNT,
};

/// Header format value written by this codec.
const FORMAT_TYPE: i32 = 1;

fn compose_description(record: &PhotometricRecord) -> String {
    let meta = &record.metadata;
    let description = meta.description.split_whitespace().collect::<Vec<_>>().join(" ");
    let reuse = description
        .split_whitespace()
        .next()
        .is_some_and(|first| first == meta.manufacturer.trim());
    if reuse {
        return description;
    }

    let mut parts = vec![meta.manufacturer.trim().to_string(), meta.catalog_number.trim().to_string()];
    parts.push(description);
    if record.electrical.input_watts > 0.0 {
        parts.push(format!("{}W", format_number(record.electrical.input_watts)));
    }
    if record.photometry.luminous_flux > 0.0 {
        parts.push(format!("{} lm", format_number(record.photometry.luminous_flux)));
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

/// Fields that have no home in an i-table.
fn report_dropped_fields(record: &PhotometricRecord, diag: &mut Diagnostics) {
    let meta = &record.metadata;
    let dropped: Vec<&str> = [
        ("luminaire type", &meta.luminaire_type),
        ("test lab", &meta.test_lab),
        ("test date", &meta.test_date),
        ("test number", &meta.test_number),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();
    if !dropped.is_empty() {
        diag.add_warning(
            "conversion",
            &format!("{} not stored by CIE i-table", dropped.join(", ")),
        );
    }

    let g = &record.geometry;
    if [g.length, g.width, g.height, g.luminous_length, g.luminous_width, g.luminous_height]
        .iter()
        .any(|v| *v != 0.0)
    {
        diag.add_warning_with_field("conversion", "geometry dropped by CIE i-table", "geometry");
    }

    let e = &record.electrical;
    if e.input_voltage.is_some()
        || e.input_current.is_some()
        || e.power_factor.is_some()
        || e.ballast_factor != 1.0
        || e.ballast_lamp_factor != 1.0
    {
        diag.add_warning_with_field(
            "conversion",
            "electrical data dropped by CIE i-table",
            "electrical",
        );
    }
}

impl CieFile {
    /// Resample a Type C record onto the standard grid.
    pub fn from_record(record: &PhotometricRecord, diag: &mut Diagnostics) -> LumenResult<CieFile> {
        let photometry = &record.photometry;
        if photometry.photometry_type != PhotometryType::C {
            return Err(LumenError::conversion(
                "cie.photometry_type",
                "CIE i-table only stores Type C photometry",
            )
            .with_context("photometry_type", photometry.photometry_type));
        }
        if !photometry.is_rectangular() {
            return Err(LumenError::conversion(
                "cie.shape",
                "candela matrix does not match the angle arrays",
            ));
        }

        let (c_angles, grid) =
            expand_to_full_circle(&photometry.horizontal_angles, &photometry.candela_values);
        let resampled = resample(
            &photometry.vertical_angles,
            &c_angles,
            &grid,
            &standard_gamma_angles(),
            &standard_c_angles(),
        )?;

        let flux_ref = if photometry.luminous_flux > 0.0 {
            photometry.luminous_flux
        } else {
            1000.0
        };
        let scale = photometry.candela_multiplier * 1000.0 / flux_ref;
        let values: Vec<Vec<f64>> = resampled
            .into_iter()
            .map(|row| row.into_iter().map(|v| v * scale).collect())
            .collect();

        let rotational = values
            .iter()
            .all(|row| row.iter().all(|v| *v == row[0]));

        report_dropped_fields(record, diag);

        Ok(CieFile {
            format_type: FORMAT_TYPE,
            // Half-plane and full-circle data share code 0.
            symmetry: i32::from(rotational),
            reserved: 0,
            description: compose_description(record),
            values,
        })
    }
}

pub fn write_cie(file: &CieFile, options: &WriteOptions) -> LumenResult<String> {
    if file.values.len() != CIE_GAMMA_COUNT
        || file.values.iter().any(|row| row.len() != CIE_C_PLANE_COUNT)
    {
        return Err(LumenError::conversion(
            "cie.grid",
            "i-table values must form the 19 x 16 standard grid",
        )
        .with_context("rows", file.values.len()));
    }

    let header = format!(
        "{} {} {} {}",
        file.format_type, file.symmetry, file.reserved, file.description
    );
    let mut lines = vec![header.trim_end().to_string()];
    lines.extend(file.values.iter().map(|row| {
        row.iter()
            .map(|v| format_fixed(*v, options.cie_precision))
            .collect::<Vec<_>>()
            .join(" ")
    }));
    Ok(join_lines(&lines, options.line_ending))
}
