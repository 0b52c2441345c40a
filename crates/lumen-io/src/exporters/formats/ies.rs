//! IESNA LM-63 writer.

use lumen_core::{Diagnostics, LumenError, LumenResult, PhotometricRecord, UnitsType};

use crate::codec::WriteOptions;
use crate::helpers::{format_number, join_lines, wrap_numbers};
use crate::importers::ies::{IesFile, IesKeywords, IesTilt};

/// Angles per line in the vertical and horizontal arrays.
const ANGLES_PER_LINE: usize = 10;

/// Version line for a version name.
pub fn version_line(version: &str) -> LumenResult<&'static str> {
    match version.trim().to_uppercase().as_str() {
        "LM-63-2002" | "2002" => Ok("IESNA:LM-63-2002"),
        "LM-63-1995" | "1995" => Ok("IESNA:LM-63-1995"),
        "LM-63-1991" | "1991" => Ok("IESNA91"),
        _ => Err(LumenError::conversion(
            "ies.version",
            "unsupported LM-63 version for writing",
        )
        .with_context("version", version)),
    }
}

/// Canonical name of a version accepted by [`version_line`].
fn canonical_version(version: &str) -> LumenResult<String> {
    let name = match version_line(version)? {
        "IESNA:LM-63-2002" => "LM-63-2002",
        "IESNA:LM-63-1995" => "LM-63-1995",
        _ => "LM-63-1991",
    };
    Ok(name.to_string())
}

impl IesFile {
    /// Build the file structure for a record.
    pub fn from_record(
        record: &PhotometricRecord,
        options: &WriteOptions,
        diag: &mut Diagnostics,
    ) -> LumenResult<IesFile> {
        let version = canonical_version(&options.ies_version)?;
        let photometry = &record.photometry;
        if !photometry.is_rectangular() {
            return Err(LumenError::conversion(
                "ies.shape",
                "candela matrix does not match the angle arrays",
            ));
        }

        let meta = &record.metadata;
        let mut keywords = IesKeywords::new();
        for (key, value) in [
            ("TEST", &meta.test_number),
            ("TESTLAB", &meta.test_lab),
            ("TESTDATE", &meta.test_date),
            ("MANUFAC", &meta.manufacturer),
            ("LUMCAT", &meta.catalog_number),
            ("LUMINAIRE", &meta.description),
            ("LAMP", &meta.luminaire_type),
        ] {
            if !value.trim().is_empty() {
                keywords.push(key, value);
            }
        }

        let lamp_count = photometry.lamp_count.max(1) as usize;
        let lumens_per_lamp = match photometry.units_type {
            UnitsType::Absolute => -1.0,
            UnitsType::Relative if photometry.luminous_flux > 0.0 => {
                photometry.luminous_flux / lamp_count as f64
            }
            UnitsType::Relative => {
                diag.add_warning_with_field(
                    "conversion",
                    "no rated lamp flux; written as absolute photometry",
                    "photometry.luminous_flux",
                );
                -1.0
            }
        };

        let electrical = &record.electrical;
        if electrical.input_voltage.is_some()
            || electrical.input_current.is_some()
            || electrical.power_factor.is_some()
        {
            diag.add_warning(
                "conversion",
                "input voltage, current and power factor are not stored by LM-63",
            );
        }

        let geometry = &record.geometry;
        let opening = |luminous: f64, physical: f64| if luminous > 0.0 { luminous } else { physical };

        let rows = photometry.vertical_angles.len();
        let candela = (0..photometry.horizontal_angles.len())
            .map(|h| (0..rows).map(|v| photometry.candela_values[v][h]).collect())
            .collect();

        Ok(IesFile {
            version,
            keywords,
            tilt: IesTilt::None,
            lamp_count,
            lumens_per_lamp,
            candela_multiplier: photometry.candela_multiplier,
            photometric_type: photometry.photometry_type.ies_code(),
            units_type: 2,
            width: opening(geometry.luminous_width, geometry.width),
            length: opening(geometry.luminous_length, geometry.length),
            height: opening(geometry.luminous_height, geometry.height),
            ballast_factor: electrical.ballast_factor,
            ballast_lamp_factor: electrical.ballast_lamp_factor,
            input_watts: electrical.input_watts,
            vertical_angles: photometry.vertical_angles.clone(),
            horizontal_angles: photometry.horizontal_angles.clone(),
            candela,
        })
    }
}

/// Serialize an LM-63 file.
pub fn write_ies(file: &IesFile, options: &WriteOptions) -> LumenResult<String> {
    let mut lines: Vec<String> = vec![version_line(&file.version)?.to_string()];

    for (key, value) in file.keywords.iter() {
        let mut parts = value.split('\n');
        let first = parts.next().unwrap_or_default();
        lines.push(format!("[{key}] {first}").trim_end().to_string());
        lines.extend(parts.map(|more| format!("[MORE] {more}").trim_end().to_string()));
    }

    match &file.tilt {
        IesTilt::None => lines.push("TILT=NONE".to_string()),
        IesTilt::File(name) => lines.push(format!("TILT={name}")),
        IesTilt::Include {
            lamp_to_luminaire_geometry,
            angles,
            multiplying_factors,
        } => {
            lines.push("TILT=INCLUDE".to_string());
            lines.push(lamp_to_luminaire_geometry.to_string());
            lines.push(angles.len().to_string());
            lines.extend(wrap_numbers(angles, ANGLES_PER_LINE));
            lines.extend(wrap_numbers(multiplying_factors, ANGLES_PER_LINE));
        }
    }

    lines.push(
        [
            file.lamp_count.to_string(),
            format_number(file.lumens_per_lamp),
            format_number(file.candela_multiplier),
            file.vertical_angles.len().to_string(),
            file.horizontal_angles.len().to_string(),
            file.photometric_type.to_string(),
            file.units_type.to_string(),
            format_number(file.width),
            format_number(file.length),
            format_number(file.height),
        ]
        .join(" "),
    );
    lines.push(format!(
        "{} {} {}",
        format_number(file.ballast_factor),
        format_number(file.ballast_lamp_factor),
        format_number(file.input_watts)
    ));
    lines.extend(wrap_numbers(&file.vertical_angles, ANGLES_PER_LINE));
    lines.extend(wrap_numbers(&file.horizontal_angles, ANGLES_PER_LINE));
    for block in &file.candela {
        lines.push(
            block
                .iter()
                .map(|v| format_number(*v))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }

    Ok(join_lines(&lines, options.line_ending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LineEnding;
    use crate::importers::ies::parse_ies;
    use lumen_core::PhotometryType;

    fn record() -> PhotometricRecord {
        let mut record = PhotometricRecord::new();
        record.metadata.manufacturer = "Acme".into();
        record.metadata.catalog_number = "X-1".into();
        record.metadata.description = "Line one\nLine two".into();
        record.photometry.luminous_flux = 2000.0;
        record.photometry.lamp_count = 2;
        record.photometry.vertical_angles = vec![0.0, 90.0];
        record.photometry.horizontal_angles = vec![0.0, 90.0, 180.0];
        record.photometry.candela_values = vec![vec![100.0, 110.0, 120.0], vec![1.5, 2.5, 3.5]];
        record
    }

    #[test]
    fn test_write_layout() {
        let mut diag = Diagnostics::new();
        let file = IesFile::from_record(&record(), &WriteOptions::default(), &mut diag).unwrap();
        let text = write_ies(&file, &WriteOptions::default()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "IESNA:LM-63-2002");
        assert_eq!(lines[1], "[MANUFAC] Acme");
        assert_eq!(lines[2], "[LUMCAT] X-1");
        assert_eq!(lines[3], "[LUMINAIRE] Line one");
        assert_eq!(lines[4], "[MORE] Line two");
        assert_eq!(lines[5], "TILT=NONE");
        assert_eq!(lines[6], "2 1000 1 2 3 1 2 0 0 0");
        assert_eq!(lines[7], "1 1 0");
        assert_eq!(lines[8], "0 90");
        assert_eq!(lines[9], "0 90 180");
        assert_eq!(lines[10], "100 1.5");
        assert_eq!(lines[12], "120 3.5");
        assert!(diag.issues.is_empty());
    }

    #[test]
    fn test_write_then_parse_preserves_grid() {
        let original = record();
        let mut diag = Diagnostics::new();
        let file = IesFile::from_record(&original, &WriteOptions::default(), &mut diag).unwrap();
        let text = write_ies(&file, &WriteOptions::default()).unwrap();
        let (parsed, mut import_diag) = parse_ies(&text).unwrap();
        let back = parsed.to_record(&mut import_diag).unwrap();
        assert_eq!(back.metadata, original.metadata);
        assert_eq!(back.photometry.photometry_type, PhotometryType::C);
        assert_eq!(back.photometry.candela_values, original.photometry.candela_values);
        assert_eq!(back.photometry.luminous_flux, 2000.0);
    }

    #[test]
    fn test_crlf_and_legacy_version() {
        let options = WriteOptions {
            ies_version: "LM-63-1991".into(),
            line_ending: LineEnding::Crlf,
            ..Default::default()
        };
        let mut diag = Diagnostics::new();
        let file = IesFile::from_record(&record(), &options, &mut diag).unwrap();
        let text = write_ies(&file, &options).unwrap();
        assert!(text.starts_with("IESNA91\r\n"));
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn test_unknown_version_is_conversion_error() {
        let options = WriteOptions {
            ies_version: "LM-63-1986".into(),
            ..Default::default()
        };
        let err = IesFile::from_record(&record(), &options, &mut Diagnostics::new()).unwrap_err();
        assert_eq!(err.kind, lumen_core::ErrorKind::Conversion);
        assert_eq!(err.code, "ies.version");
    }

    #[test]
    fn test_relative_without_flux_written_absolute() {
        let mut rec = record();
        rec.photometry.luminous_flux = 0.0;
        let mut diag = Diagnostics::new();
        let file = IesFile::from_record(&rec, &WriteOptions::default(), &mut diag).unwrap();
        assert_eq!(file.lumens_per_lamp, -1.0);
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_wraps_long_angle_arrays() {
        let mut rec = record();
        rec.photometry.vertical_angles = (0..=18).map(|i| i as f64 * 5.0).collect();
        rec.photometry.candela_values = vec![vec![1.0, 1.0, 1.0]; 19];
        let file = IesFile::from_record(&rec, &WriteOptions::default(), &mut Diagnostics::new()).unwrap();
        let text = write_ies(&file, &WriteOptions::default()).unwrap();
        assert!(text.contains("\n0 5 10 15 20 25 30 35 40 45\n50 55 60 65 70 75 80 85 90\n"));
    }
}
