//! EULUMDAT (.ldt) parser.
//!
//! EULUMDAT has no keywords or delimiters: meaning comes from line position
//! alone. Lines 1-25 are single values, followed by six lines per lamp set,
//! ten direct ratios, the C-plane and gamma angle lists and finally the
//! intensities, stored C-plane by C-plane in cd/klm. Only the planes the
//! symmetry indicator calls for are present.
//!
//! Numbers may use a decimal comma and are normalized before parsing.

use lumen_core::{
    units::Millimeters, ElectricalData, Geometry, ImportDiagnostics, LumenError, LumenResult,
    Meters, Metadata, PhotometricMeasurements, PhotometricRecord, PhotometryType, UnitsType,
};
use serde::Serialize;

use crate::codec::Detection;
use crate::helpers::{parse_decimal_comma, safe_f64_to_i32, safe_f64_to_usize, TokenCursor};

pub const LDT_VERSION: &str = "EULUMDAT";

pub const MAX_C_PLANES: usize = 721;
pub const MAX_GAMMA_ANGLES: usize = 361;
pub const MAX_LAMP_SETS: usize = 20;

/// Type indicator labels, indexed by code.
pub const TYPE_INDICATOR_LABELS: [&str; 4] = [
    "Point source with no symmetry",
    "Point source with symmetry about the vertical axis",
    "Linear luminaire",
    "Point source with other symmetry",
];

/// Code for a type indicator label, if it is one.
pub fn type_indicator_code(label: &str) -> Option<i32> {
    TYPE_INDICATOR_LABELS
        .iter()
        .position(|l| l.eq_ignore_ascii_case(label.trim()))
        .map(|i| i as i32)
}

/// Number of stored C-planes for a symmetry indicator.
pub fn stored_plane_count(symmetry: i32, nc: usize) -> Option<usize> {
    match symmetry {
        0 => Some(nc),
        1 => Some(1),
        2 | 3 => Some(nc / 2 + 1),
        4 => Some(nc / 4 + 1),
        _ => None,
    }
}

// ============================================================================
// Intermediate representation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LampSet {
    /// Negative counts mark absolute photometry in some tools
    pub count: i32,
    pub lamp_type: String,
    /// Total luminous flux of the set, lm
    pub total_flux: f64,
    pub color_temperature: String,
    pub color_rendering: String,
    pub wattage: f64,
}

/// A EULUMDAT file as laid out on disk. Lengths are in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdtFile {
    pub company: String,
    pub type_indicator: i32,
    pub symmetry: i32,
    pub nc: usize,
    pub dc: f64,
    pub ng: usize,
    pub dg: f64,
    pub report_number: String,
    pub luminaire_name: String,
    pub luminaire_number: String,
    pub file_name: String,
    pub date_user: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub luminous_length: f64,
    pub luminous_width: f64,
    /// Luminous heights at C0, C90, C180, C270
    pub luminous_heights: [f64; 4],
    pub downward_flux_fraction: f64,
    pub light_output_ratio: f64,
    pub conversion_factor: f64,
    pub tilt: f64,
    pub lamp_sets: Vec<LampSet>,
    pub direct_ratios: [f64; 10],
    pub c_angles: Vec<f64>,
    pub g_angles: Vec<f64>,
    /// `intensities[plane][gamma]`, one row per stored C-plane
    pub intensities: Vec<Vec<f64>>,
}

impl LdtFile {
    /// Index into `c_angles` of the first stored plane.
    pub fn first_stored_plane(&self) -> usize {
        if self.symmetry == 3 {
            self.c_angles
                .iter()
                .position(|c| *c >= 90.0 - 1e-6)
                .unwrap_or(0)
        } else {
            0
        }
    }

    pub fn total_flux(&self) -> f64 {
        self.lamp_sets.iter().map(|set| set.total_flux).sum()
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Positional reader over single-value lines.
struct LineReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        Self { lines, pos: 0 }
    }

    /// 1-based number of the line about to be read.
    fn line_no(&self) -> usize {
        self.pos + 1
    }

    fn text(&mut self, field: &str) -> LumenResult<String> {
        let line = self.lines.get(self.pos).ok_or_else(|| {
            LumenError::syntax(
                "ldt.truncated",
                format!("unexpected end of file while reading {field}"),
            )
            .with_context("line", self.pos + 1)
        })?;
        self.pos += 1;
        Ok(line.trim().to_string())
    }

    fn number(&mut self, field: &str) -> LumenResult<f64> {
        let line_no = self.line_no();
        let raw = self.text(field)?;
        parse_decimal_comma(&raw).ok_or_else(|| {
            LumenError::syntax("ldt.number", format!("expected a number for {field}"))
                .with_context("line", line_no)
                .with_context("token", raw)
        })
    }

    fn count(&mut self, field: &str) -> LumenResult<usize> {
        let line_no = self.line_no();
        let value = self.number(field)?;
        safe_f64_to_usize(value, field).map_err(|err| err.with_context("line", line_no))
    }

    fn integer(&mut self, field: &str) -> LumenResult<i32> {
        let line_no = self.line_no();
        let value = self.number(field)?;
        safe_f64_to_i32(value, field).map_err(|err| err.with_context("line", line_no))
    }

    /// Remaining lines as one token stream with decimal commas normalized.
    fn rest_normalized(&self) -> Vec<String> {
        self.lines[self.pos.min(self.lines.len())..]
            .iter()
            .map(|line| line.replace(',', "."))
            .collect()
    }
}

/// Parse EULUMDAT text into its file structure.
pub fn parse_ldt(text: &str) -> LumenResult<(LdtFile, ImportDiagnostics)> {
    let mut diag = ImportDiagnostics::new();
    let mut reader = LineReader::new(text);
    if reader.lines.is_empty() {
        return Err(LumenError::syntax("ldt.empty", "file is empty"));
    }

    let company = reader.text("company identification")?;
    let type_indicator = reader.integer("type indicator")?;
    let symmetry_line = reader.line_no();
    let symmetry = reader.integer("symmetry indicator")?;
    let nc = reader.count("number of C-planes")?;
    let dc = reader.number("distance between C-planes")?;
    let ng = reader.count("number of gamma angles")?;
    let dg = reader.number("distance between gamma angles")?;
    let report_number = reader.text("measurement report number")?;
    let luminaire_name = reader.text("luminaire name")?;
    let luminaire_number = reader.text("luminaire number")?;
    let file_name = reader.text("file name")?;
    let date_user = reader.text("date/user")?;

    let length = reader.number("length of luminaire")?;
    let width = reader.number("width of luminaire")?;
    let height = reader.number("height of luminaire")?;
    let luminous_length = reader.number("length of luminous area")?;
    let luminous_width = reader.number("width of luminous area")?;
    let luminous_heights = [
        reader.number("luminous height C0")?,
        reader.number("luminous height C90")?,
        reader.number("luminous height C180")?,
        reader.number("luminous height C270")?,
    ];
    let downward_flux_fraction = reader.number("downward flux fraction")?;
    let light_output_ratio = reader.number("light output ratio")?;
    let conversion_factor = reader.number("conversion factor")?;
    let tilt = reader.number("tilt during measurement")?;

    let lamp_set_count = reader.count("number of lamp sets")?;
    if lamp_set_count > MAX_LAMP_SETS {
        diag.add_warning_at_line(
            "parse",
            &format!("{lamp_set_count} lamp sets exceeds the EULUMDAT limit of {MAX_LAMP_SETS}"),
            reader.line_no() - 1,
        );
    }
    let mut lamp_sets = Vec::with_capacity(lamp_set_count);
    for _ in 0..lamp_set_count {
        lamp_sets.push(LampSet {
            count: reader.integer("number of lamps")?,
            lamp_type: reader.text("type of lamps")?,
            total_flux: reader.number("total luminous flux of lamps")?,
            color_temperature: reader.text("color temperature")?,
            color_rendering: reader.text("color rendering index")?,
            wattage: reader.number("wattage including ballast")?,
        });
    }

    let mut direct_ratios = [0.0; 10];
    for ratio in direct_ratios.iter_mut() {
        *ratio = reader.number("direct ratio")?;
    }

    if !(0..=4).contains(&symmetry) {
        return Err(LumenError::syntax("ldt.symmetry", "symmetry indicator must be 0-4")
            .with_context("symmetry", symmetry)
            .with_context("line", symmetry_line));
    }
    if nc == 0 || ng == 0 {
        return Err(LumenError::syntax(
            "ldt.angle_count",
            "C-plane and gamma counts must be positive",
        )
        .with_context("nc", nc)
        .with_context("ng", ng));
    }

    let normalized = reader.rest_normalized();
    let mut cursor = TokenCursor::new(
        normalized.iter().map(String::as_str),
        reader.line_no(),
        "ldt",
    );
    let c_angles = cursor.take_f64(nc, "C-plane angles")?;
    let g_angles = cursor.take_f64(ng, "gamma angles")?;

    let mc = stored_plane_count(symmetry, nc).unwrap_or(nc);
    let expected = mc * ng;
    if cursor.remaining() < expected {
        return Err(LumenError::syntax(
            "ldt.intensity_count",
            "not enough intensities for the stored C-planes",
        )
        .with_context("planes", mc)
        .with_context("gamma_angles", ng)
        .with_context("expected", expected)
        .with_context("found", cursor.remaining()));
    }
    let intensities = (0..mc)
        .map(|_| cursor.take_f64(ng, "intensities"))
        .collect::<LumenResult<Vec<_>>>()?;
    if cursor.remaining() > 0 {
        let line = cursor.line();
        diag.add_skipped_line(
            "parse",
            &format!("{} trailing values ignored", cursor.remaining()),
            line,
        );
    }

    diag.stats.vertical_angles = ng;
    diag.stats.horizontal_angles = mc;

    let file = LdtFile {
        company,
        type_indicator,
        symmetry,
        nc,
        dc,
        ng,
        dg,
        report_number,
        luminaire_name,
        luminaire_number,
        file_name,
        date_user,
        length,
        width,
        height,
        luminous_length,
        luminous_width,
        luminous_heights,
        downward_flux_fraction,
        light_output_ratio,
        conversion_factor,
        tilt,
        lamp_sets,
        direct_ratios,
        c_angles,
        g_angles,
        intensities,
    };
    Ok((file, diag))
}

// ============================================================================
// Common model mapping
// ============================================================================

fn meters(mm: f64) -> f64 {
    Meters::from(Millimeters(mm)).value()
}

impl LdtFile {
    pub fn to_record(&self, diag: &mut ImportDiagnostics) -> LumenResult<PhotometricRecord> {
        let mc = self.intensities.len();
        let start = self.first_stored_plane();
        let horizontal_angles: Vec<f64> = self
            .c_angles
            .get(start..start + mc)
            .ok_or_else(|| {
                LumenError::syntax(
                    "ldt.planes",
                    "C-plane list is too short for the symmetry indicator",
                )
                .with_context("symmetry", self.symmetry)
                .with_context("nc", self.nc)
                .with_context("first_plane", start)
            })?
            .to_vec();

        // C-plane-major on disk, gamma-major in the model.
        let ng = self.g_angles.len();
        if self.intensities.iter().any(|plane| plane.len() != ng) {
            return Err(LumenError::syntax(
                "ldt.transpose",
                "every stored C-plane must hold one value per gamma angle",
            )
            .with_context("gamma_angles", ng));
        }
        let candela_values: Vec<Vec<f64>> = (0..ng)
            .map(|g| self.intensities.iter().map(|plane| plane[g]).collect())
            .collect();

        let conversion_factor = if self.conversion_factor > 0.0 {
            self.conversion_factor
        } else {
            diag.add_defaulted(
                "photometry.candela_multiplier",
                "conversion factor is not positive; using 1",
            );
            1.0
        };
        let luminous_flux = self.total_flux().max(0.0);
        let flux_ref = if luminous_flux > 0.0 {
            luminous_flux
        } else {
            1000.0
        };

        let lamp_count: u32 = self
            .lamp_sets
            .iter()
            .map(|set| set.count.unsigned_abs())
            .fold(0u32, |acc, count| acc.saturating_add(count))
            .max(1);

        if self.tilt != 0.0 {
            diag.issues.push(
                lumen_core::DiagnosticIssue::new(
                    lumen_core::Severity::Warning,
                    "conversion",
                    "measurement tilt is not carried into the common model",
                )
                .with_field("ldt.tilt"),
            );
        }

        let luminaire_type = match usize::try_from(self.type_indicator)
            .ok()
            .and_then(|i| TYPE_INDICATOR_LABELS.get(i))
        {
            Some(label) => label.to_string(),
            None => {
                diag.add_warning(
                    "parse",
                    &format!("unknown type indicator {}", self.type_indicator),
                );
                String::new()
            }
        };

        let metadata = Metadata {
            manufacturer: self.company.clone(),
            catalog_number: self.luminaire_number.clone(),
            description: self.luminaire_name.clone(),
            luminaire_type,
            test_lab: String::new(),
            test_date: self.date_user.clone(),
            test_number: self.report_number.clone(),
        };

        let geometry = Geometry {
            length: meters(self.length),
            width: meters(self.width),
            height: meters(self.height),
            luminous_length: meters(self.luminous_length),
            luminous_width: meters(self.luminous_width),
            luminous_height: meters(self.luminous_heights.iter().copied().fold(0.0, f64::max)),
        };

        let photometry = PhotometricMeasurements {
            photometry_type: PhotometryType::C,
            units_type: UnitsType::Relative,
            luminous_flux,
            candela_multiplier: conversion_factor * flux_ref / 1000.0,
            lamp_count,
            vertical_angles: self.g_angles.clone(),
            horizontal_angles,
            candela_values,
            light_output_ratio: (self.light_output_ratio > 0.0).then_some(self.light_output_ratio),
        };

        let electrical = ElectricalData {
            input_watts: self.lamp_sets.iter().map(|set| set.wattage).sum(),
            ..ElectricalData::default()
        };

        let mut record = PhotometricRecord {
            metadata,
            geometry,
            photometry,
            electrical,
        };
        for field in record.apply_defaults() {
            diag.add_defaulted(field, "missing in file; using 'Unknown'");
        }
        Ok(record)
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Score how likely `text` is a EULUMDAT file.
pub fn detect_ldt(text: &str) -> Detection {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if lines.len() < 12 {
        return Detection::none();
    }

    let single_number = |line: &str| line.split_whitespace().count() == 1 && parse_decimal_comma(line).is_some();

    let mut score = 0.0;
    let numeric = lines[1..7].iter().filter(|l| single_number(l)).count();
    score += 0.35 * numeric as f64 / 6.0;

    let int_in = |line: &str, lo: f64, hi: f64| {
        parse_decimal_comma(line).is_some_and(|v| v.fract() == 0.0 && v >= lo && v <= hi)
    };
    if int_in(lines[1], 0.0, 3.0) {
        score += 0.1;
    }
    if int_in(lines[2], 0.0, 4.0) {
        score += 0.1;
    }
    if looks_like_date(lines[11]) {
        score += 0.15;
    }
    let comma_decimal = lines.iter().skip(1).take(60).any(|l| {
        l.contains(',') && !l.contains(' ') && parse_decimal_comma(l).is_some()
    });
    if comma_decimal {
        score += 0.1;
    }
    if lines.len() >= 40 {
        score += 0.1;
    }
    Detection::thresholded(score, 0.5, LDT_VERSION)
}

/// Digits in at least three groups separated by '.', '/' or '-'.
fn looks_like_date(line: &str) -> bool {
    let has_separator = line.contains(['.', '/', '-']);
    let groups = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .count();
    has_separator && groups >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Half-symmetric file: Nc = 4 (C0, C90, C180, C270), Ng = 3, planes C0..C180 stored.
    pub(crate) fn sample() -> String {
        let mut lines = vec![
            "ACME", "1", "2", "4", "90", "3", "45", "R-17", "Round downlight", "DL-200",
            "dl200.ldt", "12.03.2021 QA", "600", "0", "80", "500", "0", "40", "40", "40", "40",
            "100", "85,5", "1", "0", "1", "2", "LED", "2000", "3000K", "1A", "24,5",
        ];
        lines.extend(["0.5"; 10]);
        lines.extend(["0", "90", "180", "270"]);
        lines.extend(["0", "45", "90"]);
        lines.extend(["300", "200", "0"]);
        lines.extend(["310", "205", "1"]);
        lines.extend(["320", "210", "2"]);
        lines.join("\n")
    }

    #[test]
    fn test_parse_positions() {
        let (file, diag) = parse_ldt(&sample()).unwrap();
        assert_eq!(file.company, "ACME");
        assert_eq!(file.symmetry, 2);
        assert_eq!(file.nc, 4);
        assert_eq!(file.light_output_ratio, 85.5);
        assert_eq!(file.lamp_sets.len(), 1);
        assert_eq!(file.lamp_sets[0].wattage, 24.5);
        assert_eq!(file.intensities.len(), 3);
        assert_eq!(diag.stats.horizontal_angles, 3);
    }

    #[test]
    fn test_record_mapping() {
        let (file, mut diag) = parse_ldt(&sample()).unwrap();
        let record = file.to_record(&mut diag).unwrap();
        assert_eq!(record.geometry.length, 0.6);
        assert_eq!(record.geometry.luminous_height, 0.04);
        assert_eq!(record.photometry.horizontal_angles, vec![0.0, 90.0, 180.0]);
        assert_eq!(
            record.photometry.candela_values,
            vec![vec![300.0, 310.0, 320.0], vec![200.0, 205.0, 210.0], vec![0.0, 1.0, 2.0]]
        );
        assert_eq!(record.photometry.luminous_flux, 2000.0);
        assert!((record.photometry.candela_multiplier - 2.0).abs() < 1e-12);
        assert_eq!(record.photometry.lamp_count, 2);
        assert_eq!(record.metadata.catalog_number, "DL-200");
        assert_eq!(record.metadata.test_number, "R-17");
        assert_eq!(record.metadata.luminaire_type, TYPE_INDICATOR_LABELS[1]);
        assert_eq!(record.electrical.input_watts, 24.5);
        assert_eq!(record.photometry.light_output_ratio, Some(85.5));
    }

    #[test]
    fn test_huge_lamp_counts_saturate() {
        let text = sample().replacen(
            "\n1\n0\n1\n2\nLED\n",
            "\n1\n0\n2\n-2147483648\nLED\n",
            1,
        );
        let text = text.replacen(
            "\n24,5\n",
            "\n24,5\n-2147483648\nLED\n0\n3000K\n1A\n0\n",
            1,
        );
        let (file, mut diag) = parse_ldt(&text).unwrap();
        assert_eq!(file.lamp_sets.len(), 2);
        let record = file.to_record(&mut diag).unwrap();
        assert_eq!(record.photometry.lamp_count, u32::MAX);
    }

    #[test]
    fn test_symmetry_three_starts_at_c90() {
        let text = sample().replacen("\n2\n4\n", "\n3\n4\n", 1);
        let (file, mut diag) = parse_ldt(&text).unwrap();
        assert_eq!(file.symmetry, 3);
        assert_eq!(file.first_stored_plane(), 1);
        let record = file.to_record(&mut diag).unwrap();
        assert_eq!(record.photometry.horizontal_angles, vec![90.0, 180.0, 270.0]);
    }

    #[test]
    fn test_truncated_intensities() {
        let text = sample();
        let cut = &text[..text.rfind('\n').unwrap()];
        let err = parse_ldt(cut).unwrap_err();
        assert_eq!(err.code, "ldt.intensity_count");
        assert_eq!(err.context_value("expected"), Some("9"));
    }

    #[test]
    fn test_non_numeric_header_line() {
        let text = sample().replacen("\n4\n90\n", "\nfour\n90\n", 1);
        let err = parse_ldt(&text).unwrap_err();
        assert_eq!(err.code, "ldt.number");
        assert_eq!(err.context_value("line"), Some("4"));
    }

    #[test]
    fn test_stored_plane_counts() {
        assert_eq!(stored_plane_count(0, 24), Some(24));
        assert_eq!(stored_plane_count(1, 24), Some(1));
        assert_eq!(stored_plane_count(2, 24), Some(13));
        assert_eq!(stored_plane_count(4, 24), Some(7));
        assert_eq!(stored_plane_count(5, 24), None);
    }

    #[test]
    fn test_detect() {
        let hit = detect_ldt(&sample());
        assert_eq!(hit.version, LDT_VERSION);
        assert!(hit.confidence >= 0.8);
        assert_eq!(detect_ldt("IESNA:LM-63-2002\nTILT=NONE\n"), Detection::none());
        assert_eq!(detect_ldt(""), Detection::none());
    }

    #[test]
    fn test_date_heuristic() {
        assert!(looks_like_date("12.03.2021 QA"));
        assert!(looks_like_date("2021-03-12"));
        assert!(!looks_like_date("dl200.ldt"));
    }
}
