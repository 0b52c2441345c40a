//! Cross-format round trips through the manager.

use lumen_core::PhotometricRecord;
use lumen_io::{ConversionManager, Format, LineEnding, WriteOptions};

/// Half-symmetric EULUMDAT downlight, 2000 lm, two lamps.
fn ldt_fixture() -> String {
    let mut lines = vec![
        "ACME", "1", "2", "4", "90", "3", "45", "R-17", "Round downlight", "DL-200",
        "dl200.ldt", "12.03.2021 QA", "600", "0", "80", "500", "0", "40", "40", "40", "40",
        "100", "85.5", "1", "0", "1", "2", "LED", "2000", "3000K", "1A", "24.5",
    ];
    lines.extend(["0.5"; 10]);
    lines.extend(["0", "90", "180", "270"]);
    lines.extend(["0", "45", "90"]);
    lines.extend(["300", "200", "0"]);
    lines.extend(["310", "205", "1"]);
    lines.extend(["320", "210", "2"]);
    lines.join("\n")
}

fn cie_fixture() -> String {
    let mut lines = vec!["1 0 0 Acme X-1 1000 lm".to_string()];
    for g in 0..19 {
        let row: Vec<String> = (0..16).map(|c| format!("{}", 500 - g * 20 + c)).collect();
        lines.push(row.join(" "));
    }
    lines.join("\n")
}

/// Intensity in candela at grid position (v, h).
fn candela(record: &PhotometricRecord, v: usize, h: usize) -> f64 {
    record.photometry.candela_values[v][h] * record.photometry.candela_multiplier
}

fn assert_same_intensities(a: &PhotometricRecord, b: &PhotometricRecord) {
    assert_eq!(a.photometry.vertical_angles, b.photometry.vertical_angles);
    assert_eq!(a.photometry.horizontal_angles, b.photometry.horizontal_angles);
    for v in 0..a.photometry.vertical_angles.len() {
        for h in 0..a.photometry.horizontal_angles.len() {
            let (x, y) = (candela(a, v, h), candela(b, v, h));
            assert!((x - y).abs() < 1e-6, "({v}, {h}): {x} != {y}");
        }
    }
}

#[test]
fn ldt_through_ies_keeps_intensities() {
    let manager = ConversionManager::new();
    let source = manager.parse(ldt_fixture().as_bytes(), Format::Ldt).unwrap().record;

    let ies = manager.convert(ldt_fixture().as_bytes(), Format::Ldt, Format::Ies).unwrap();
    let via_ies = manager.parse(&ies.bytes, Format::Ies).unwrap().record;

    assert_same_intensities(&source, &via_ies);
    assert_eq!(via_ies.metadata.manufacturer, "ACME");
    assert_eq!(via_ies.metadata.catalog_number, "DL-200");
    assert_eq!(via_ies.photometry.luminous_flux, 2000.0);
}

#[test]
fn ldt_through_ies_and_back() {
    let manager = ConversionManager::new();
    let source = manager.parse(ldt_fixture().as_bytes(), Format::Ldt).unwrap().record;

    let ies = manager.convert(ldt_fixture().as_bytes(), Format::Ldt, Format::Ies).unwrap();
    let ldt = manager.convert(&ies.bytes, Format::Ies, Format::Ldt).unwrap();
    let back = manager.parse(&ldt.bytes, Format::Ldt).unwrap().record;

    assert_same_intensities(&source, &back);
    // IES only stores the luminous opening, so it comes back as the body size.
    assert_eq!(back.geometry.length, source.geometry.luminous_length);
    assert_eq!(back.geometry.luminous_length, source.geometry.luminous_length);
    assert_eq!(back.electrical.input_watts, 24.5);
}

#[test]
fn cie_through_ies_and_back() {
    let manager = ConversionManager::new();
    let source = manager.parse(cie_fixture().as_bytes(), Format::Cie).unwrap().record;
    assert_eq!(source.photometry.grid_shape(), (19, 16));

    let ies = manager.convert(cie_fixture().as_bytes(), Format::Cie, Format::Ies).unwrap();
    let cie = manager.convert(&ies.bytes, Format::Ies, Format::Cie).unwrap();
    let text = String::from_utf8(cie.bytes).unwrap();

    let first_row: Vec<f64> = text
        .lines()
        .nth(1)
        .unwrap()
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    let expected: Vec<f64> = (0..16).map(|c| 500.0 + c as f64).collect();
    assert_eq!(first_row, expected);
    assert_eq!(text.lines().count(), 20);
}

#[test]
fn ies_to_cie_resamples_onto_standard_grid() {
    let ies = b"IESNA:LM-63-2002\n[MANUFAC] Acme\n[LUMCAT] A-1\nTILT=NONE\n\
1 1000 1 3 1 1 2 0 0 0\n1 1 10\n0 45 90\n0\n100 80 0\n";
    let output = ConversionManager::new().convert(ies, Format::Ies, Format::Cie).unwrap();
    let text = String::from_utf8(output.bytes.clone()).unwrap();
    let rows: Vec<&str> = text.lines().collect();

    assert_eq!(rows.len(), 20);
    // Rotational source: every column identical.
    assert!(rows[0].starts_with("1 1 0 "));
    assert!(rows[1..].iter().all(|r| r.split_whitespace().count() == 16));
    assert!(output
        .warnings()
        .iter()
        .any(|w| w.contains("resampl")));
}

#[test]
fn write_options_reach_every_writer() {
    let options = WriteOptions {
        ldt_decimal_comma: true,
        line_ending: LineEnding::Crlf,
        ..Default::default()
    };
    let manager = ConversionManager::with_options(options);
    let output = manager.convert(ldt_fixture().as_bytes(), Format::Ldt, Format::Ldt).unwrap();
    let text = String::from_utf8(output.bytes).unwrap();

    assert!(text.contains("\r\n"));
    assert!(text.contains("\r\n24,5\r\n"));
    assert!(text.contains("\r\n85,5\r\n"));

    let back = manager.parse(text.as_bytes(), Format::Ldt).unwrap().record;
    assert_eq!(back.photometry.grid_shape(), (3, 3));
}

#[test]
fn overrides_survive_round_trip() {
    let manager = ConversionManager::new();
    let overrides = lumen_core::MetadataOverrides {
        catalog_number: Some("DL-300".into()),
        test_lab: Some("North Lab".into()),
        ..Default::default()
    };
    let ies = manager
        .convert_with_overrides(ldt_fixture().as_bytes(), Format::Ldt, Format::Ies, &overrides)
        .unwrap();
    let record = manager.parse(&ies.bytes, Format::Ies).unwrap().record;
    assert_eq!(record.metadata.catalog_number, "DL-300");
    assert_eq!(record.metadata.test_lab, "North Lab");
}
