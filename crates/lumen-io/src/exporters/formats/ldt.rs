//! EULUMDAT (.ldt) writer.

use lumen_core::{
    photometry::{downward_flux_fraction, estimate_luminous_flux},
    units::Millimeters,
    Diagnostics, LumenError, LumenResult, Meters, PhotometricRecord, PhotometryType,
};

use crate::codec::WriteOptions;
use crate::helpers::{
    classify_coverage, format_number, join_lines, mirrored_angles, uniform_spacing,
    without_closing_plane, Coverage,
};
use crate::importers::ldt::{stored_plane_count, type_indicator_code, LampSet, LdtFile};

fn millimeters(m: f64) -> f64 {
    Millimeters::from(Meters(m)).value()
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

/// How a record's horizontal angles map onto EULUMDAT C-planes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneLayout {
    pub coverage: Coverage,
    pub symmetry: i32,
    /// Full C-plane list written to the file
    pub c_angles: Vec<f64>,
    /// Columns of the record that become stored planes
    pub stored_planes: usize,
}

impl PlaneLayout {
    pub fn for_angles(horizontal: &[f64]) -> Self {
        // A closing 360° plane repeats C0 and is not stored.
        let planes = without_closing_plane(horizontal);
        let coverage = classify_coverage(planes);
        let c_angles = match coverage {
            Coverage::Rotational | Coverage::Full => planes.to_vec(),
            _ => mirrored_angles(planes, coverage),
        };
        Self {
            coverage,
            symmetry: coverage.ldt_symmetry(),
            c_angles,
            stored_planes: planes.len(),
        }
    }

    /// True when the symmetry indicator asks for exactly the stored planes.
    pub fn is_consistent(&self) -> bool {
        stored_plane_count(self.symmetry, self.c_angles.len()) == Some(self.stored_planes)
    }
}

impl LdtFile {
    /// Build the file structure for a Type C record.
    pub fn from_record(record: &PhotometricRecord, diag: &mut Diagnostics) -> LumenResult<LdtFile> {
        let photometry = &record.photometry;
        if photometry.photometry_type != PhotometryType::C {
            return Err(LumenError::conversion(
                "ldt.photometry_type",
                "EULUMDAT only stores Type C photometry",
            )
            .with_context("photometry_type", photometry.photometry_type));
        }
        if !photometry.is_rectangular() {
            return Err(LumenError::conversion(
                "ldt.shape",
                "candela matrix does not match the angle arrays",
            ));
        }

        let layout = PlaneLayout::for_angles(&photometry.horizontal_angles);
        if !layout.is_consistent() {
            return Err(LumenError::conversion(
                "ldt.transpose",
                "horizontal angles do not mirror onto a complete C-plane set",
            )
            .with_context("symmetry", layout.symmetry)
            .with_context("nc", layout.c_angles.len())
            .with_context("stored_planes", layout.stored_planes));
        }
        let PlaneLayout {
            coverage,
            symmetry,
            c_angles,
            stored_planes: mc,
        } = layout;
        let nc = c_angles.len();

        let flux = photometry.luminous_flux;
        let flux_ref = if flux > 0.0 { flux } else { 1000.0 };
        let mut factor = photometry.candela_multiplier * 1000.0 / flux_ref;
        if (factor - 1.0).abs() < 1e-12 {
            factor = 1.0;
        }

        let ng = photometry.vertical_angles.len();
        let intensities = (0..mc)
            .map(|c| {
                (0..ng)
                    .map(|g| photometry.candela_values[g][c] * factor)
                    .collect()
            })
            .collect();

        let meta = &record.metadata;
        let type_indicator = type_indicator_code(&meta.luminaire_type).unwrap_or(
            if coverage == Coverage::Rotational {
                1
            } else {
                3
            },
        );
        let lamp_type = if type_indicator_code(&meta.luminaire_type).is_some() {
            String::new()
        } else {
            single_line(&meta.luminaire_type)
        };

        if !meta.test_lab.trim().is_empty() {
            diag.add_warning_with_field(
                "conversion",
                "test lab is not stored by EULUMDAT",
                "metadata.test_lab",
            );
        }
        let electrical = &record.electrical;
        if electrical.input_voltage.is_some()
            || electrical.input_current.is_some()
            || electrical.power_factor.is_some()
        {
            diag.add_warning(
                "conversion",
                "input voltage, current and power factor are not stored by EULUMDAT",
            );
        }
        if electrical.ballast_factor != 1.0 || electrical.ballast_lamp_factor != 1.0 {
            diag.add_warning(
                "conversion",
                "ballast factors are not stored by EULUMDAT",
            );
        }

        let downward = downward_flux_fraction(photometry)
            .map(|f| round_to_tenth(f * 100.0))
            .unwrap_or(100.0);
        let output_ratio = match (photometry.light_output_ratio, estimate_luminous_flux(photometry)) {
            (Some(declared), _) if declared > 0.0 => declared,
            (_, Some(estimate)) if flux > 0.0 => round_to_tenth(estimate / flux * 100.0),
            _ => 100.0,
        };

        let geometry = &record.geometry;
        let luminous_height = millimeters(geometry.luminous_height);
        let catalog = single_line(&meta.catalog_number);

        Ok(LdtFile {
            company: single_line(&meta.manufacturer),
            type_indicator,
            symmetry,
            nc,
            dc: uniform_spacing(&c_angles).unwrap_or(0.0),
            ng,
            dg: uniform_spacing(&photometry.vertical_angles).unwrap_or(0.0),
            report_number: single_line(&meta.test_number),
            luminaire_name: single_line(&meta.description),
            luminaire_number: catalog.clone(),
            file_name: format!("{}.ldt", catalog.replace(' ', "_")),
            date_user: single_line(&meta.test_date),
            length: millimeters(geometry.length),
            width: millimeters(geometry.width),
            height: millimeters(geometry.height),
            luminous_length: millimeters(geometry.luminous_length),
            luminous_width: millimeters(geometry.luminous_width),
            luminous_heights: [luminous_height; 4],
            downward_flux_fraction: downward,
            light_output_ratio: output_ratio,
            conversion_factor: 1.0,
            tilt: 0.0,
            lamp_sets: vec![LampSet {
                count: i32::try_from(photometry.lamp_count).unwrap_or(i32::MAX),
                lamp_type,
                total_flux: flux,
                color_temperature: String::new(),
                color_rendering: String::new(),
                wattage: electrical.input_watts,
            }],
            direct_ratios: [0.0; 10],
            c_angles,
            g_angles: photometry.vertical_angles.clone(),
            intensities,
        })
    }
}

/// Serialize a EULUMDAT file, one value per line.
pub fn write_ldt(file: &LdtFile, options: &WriteOptions) -> LumenResult<String> {
    let mc = stored_plane_count(file.symmetry, file.nc).ok_or_else(|| {
        LumenError::conversion("ldt.symmetry", "symmetry indicator must be 0-4")
            .with_context("symmetry", file.symmetry)
    })?;
    if file.c_angles.len() != file.nc
        || file.g_angles.len() != file.ng
        || file.intensities.len() != mc
        || file.intensities.iter().any(|plane| plane.len() != file.ng)
    {
        return Err(LumenError::conversion(
            "ldt.transpose",
            "intensity table does not match the declared plane and gamma counts",
        )
        .with_context("nc", file.nc)
        .with_context("ng", file.ng)
        .with_context("stored_planes", file.intensities.len()));
    }

    let num = |value: f64| {
        let text = format_number(value);
        if options.ldt_decimal_comma {
            text.replace('.', ",")
        } else {
            text
        }
    };

    let mut lines: Vec<String> = vec![
        file.company.clone(),
        file.type_indicator.to_string(),
        file.symmetry.to_string(),
        file.nc.to_string(),
        num(file.dc),
        file.ng.to_string(),
        num(file.dg),
        file.report_number.clone(),
        file.luminaire_name.clone(),
        file.luminaire_number.clone(),
        file.file_name.clone(),
        file.date_user.clone(),
    ];
    lines.extend(
        [
            file.length,
            file.width,
            file.height,
            file.luminous_length,
            file.luminous_width,
        ]
        .into_iter()
        .chain(file.luminous_heights)
        .chain([
            file.downward_flux_fraction,
            file.light_output_ratio,
            file.conversion_factor,
            file.tilt,
        ])
        .map(num),
    );
    lines.push(file.lamp_sets.len().to_string());
    for set in &file.lamp_sets {
        lines.push(set.count.to_string());
        lines.push(set.lamp_type.clone());
        lines.push(num(set.total_flux));
        lines.push(set.color_temperature.clone());
        lines.push(set.color_rendering.clone());
        lines.push(num(set.wattage));
    }
    lines.extend(file.direct_ratios.iter().map(|v| num(*v)));
    lines.extend(file.c_angles.iter().map(|v| num(*v)));
    lines.extend(file.g_angles.iter().map(|v| num(*v)));
    for plane in &file.intensities {
        lines.extend(plane.iter().map(|v| num(*v)));
    }

    Ok(join_lines(&lines, options.line_ending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importers::ldt::parse_ldt;
    use lumen_core::ImportDiagnostics;

    fn quarter_record() -> PhotometricRecord {
        let mut record = PhotometricRecord::new();
        record.metadata.manufacturer = "ACME".into();
        record.metadata.catalog_number = "Q 1".into();
        record.geometry.length = 0.6;
        record.geometry.luminous_length = 0.5;
        record.photometry.luminous_flux = 1000.0;
        record.photometry.vertical_angles = vec![0.0, 45.0, 90.0];
        record.photometry.horizontal_angles = vec![0.0, 45.0, 90.0];
        record.photometry.candela_values =
            vec![vec![100.0, 100.0, 100.0], vec![80.5, 70.0, 60.0], vec![0.0, 0.0, 0.0]];
        record
    }

    #[test]
    fn test_quarter_symmetry_layout() {
        let mut diag = Diagnostics::new();
        let file = LdtFile::from_record(&quarter_record(), &mut diag).unwrap();
        assert_eq!(file.symmetry, 4);
        assert_eq!(file.nc, 8);
        assert_eq!(file.dc, 45.0);
        assert_eq!(file.dg, 45.0);
        assert_eq!(file.intensities.len(), 3);
        assert_eq!(file.intensities[0], vec![100.0, 80.5, 0.0]);
        assert_eq!(file.file_name, "Q_1.ldt");
        assert_eq!(file.downward_flux_fraction, 100.0);
        assert!(diag.issues.is_empty());
    }

    #[test]
    fn test_declared_output_ratio_is_kept() {
        let estimated = LdtFile::from_record(&quarter_record(), &mut Diagnostics::new()).unwrap();
        assert_ne!(estimated.light_output_ratio, 85.5);

        let mut record = quarter_record();
        record.photometry.light_output_ratio = Some(85.5);
        let file = LdtFile::from_record(&record, &mut Diagnostics::new()).unwrap();
        assert_eq!(file.light_output_ratio, 85.5);
    }

    #[test]
    fn test_round_trip_through_text() {
        let record = quarter_record();
        let file = LdtFile::from_record(&record, &mut Diagnostics::new()).unwrap();
        let text = write_ldt(&file, &WriteOptions::default()).unwrap();
        let (parsed, diag) = parse_ldt(&text).unwrap();
        let back = parsed.to_record(&mut ImportDiagnostics::new()).unwrap();
        assert_eq!(back.photometry.horizontal_angles, record.photometry.horizontal_angles);
        assert_eq!(back.photometry.candela_values, record.photometry.candela_values);
        assert_eq!(back.geometry.length, 0.6);
        assert_eq!(back.metadata.manufacturer, "ACME");
        assert_eq!(back.metadata.catalog_number, "Q 1");
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_decimal_comma_option() {
        let file = LdtFile::from_record(&quarter_record(), &mut Diagnostics::new()).unwrap();
        let options = WriteOptions {
            ldt_decimal_comma: true,
            ..Default::default()
        };
        let text = write_ldt(&file, &options).unwrap();
        assert!(text.lines().any(|l| l == "80,5"));
        let (parsed, _) = parse_ldt(&text).unwrap();
        assert_eq!(parsed.intensities[0][1], 80.5);
    }

    #[test]
    fn test_closing_plane_is_dropped() {
        let mut record = quarter_record();
        record.photometry.horizontal_angles = vec![0.0, 120.0, 240.0, 360.0];
        record.photometry.candela_values = vec![vec![1.0, 2.0, 3.0, 1.0]; 3];
        let file = LdtFile::from_record(&record, &mut Diagnostics::new()).unwrap();
        assert_eq!(file.symmetry, 0);
        assert_eq!(file.nc, 3);
        assert_eq!(file.c_angles, vec![0.0, 120.0, 240.0]);
        assert_eq!(file.intensities[2], vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_repeated_plane_is_inconsistent() {
        // A repeated plane collapses when mirrored, leaving Nc/2 + 1 != stored.
        let layout = PlaneLayout::for_angles(&[0.0, 90.0, 90.0, 180.0]);
        assert_eq!(layout.symmetry, 2);
        assert_eq!(layout.c_angles.len(), 4);
        assert!(!layout.is_consistent());
        assert!(PlaneLayout::for_angles(&[0.0, 90.0, 180.0]).is_consistent());
    }

    #[test]
    fn test_type_b_is_rejected() {
        let mut record = quarter_record();
        record.photometry.photometry_type = PhotometryType::B;
        let err = LdtFile::from_record(&record, &mut Diagnostics::new()).unwrap_err();
        assert_eq!(err.code, "ldt.photometry_type");
        assert_eq!(err.kind, lumen_core::ErrorKind::Conversion);
    }

    #[test]
    fn test_write_checks_transpose_precondition() {
        let mut file = LdtFile::from_record(&quarter_record(), &mut Diagnostics::new()).unwrap();
        file.intensities.pop();
        let err = write_ldt(&file, &WriteOptions::default()).unwrap_err();
        assert_eq!(err.code, "ldt.transpose");
    }

    #[test]
    fn test_lossy_fields_warn() {
        let mut record = quarter_record();
        record.metadata.test_lab = "Lab".into();
        record.electrical.input_voltage = Some(230.0);
        let mut diag = Diagnostics::new();
        LdtFile::from_record(&record, &mut diag).unwrap();
        assert_eq!(diag.warning_count(), 2);
    }
}
