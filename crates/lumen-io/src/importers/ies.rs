//! IESNA LM-63 parser.
//!
//! Layout of an LM-63 file:
//!
//! ```text
//! IESNA:LM-63-2002              version line (absent in 1986/1991 files)
//! [KEYWORD] value               keyword block, [MORE] continues the last one
//! TILT=NONE                     NONE | INCLUDE | <file name>
//! <lamps> <lm/lamp> <mult> <#v> <#h> <type> <units> <width> <length> <height>
//! <ballast factor> <ballast-lamp factor> <input watts>
//! <vertical angles...>          every array may wrap across lines
//! <horizontal angles...>
//! <candela...>                  #v values per horizontal angle
//! ```

use lumen_core::{
    units::METERS_PER_FOOT, ElectricalData, Geometry, ImportDiagnostics, LumenError,
    LumenResult, Metadata, PhotometricMeasurements, PhotometricRecord, PhotometryType, UnitsType,
};
use serde::Serialize;

use crate::codec::Detection;
use crate::helpers::{is_numeric_line, TokenCursor};

/// Versions this codec reads and writes.
pub const IES_VERSIONS: &[&str] = &["LM-63-2002", "LM-63-1995", "LM-63-1991"];

/// Version assumed when a file has no version line.
pub const IES_LEGACY_VERSION: &str = "LM-63-1991";

// ============================================================================
// Intermediate representation
// ============================================================================

/// Keyword block in file order.
///
/// `[MORE]` lines attach to the most recently seen keyword, so insertion
/// order is part of the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IesKeywords {
    entries: Vec<(String, String)>,
    #[serde(skip)]
    last: Option<usize>,
}

impl IesKeywords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword. Keys are stored upper-case without brackets.
    pub fn push(&mut self, key: &str, value: &str) {
        self.entries
            .push((key.trim().to_uppercase(), value.trim().to_string()));
        self.last = Some(self.entries.len() - 1);
    }

    /// Continue the last keyword on a new line. Returns false when there is no
    /// keyword to continue.
    pub fn append_more(&mut self, value: &str) -> bool {
        match self.last.and_then(|i| self.entries.get_mut(i)) {
            Some((_, existing)) => {
                existing.push('\n');
                existing.push_str(value.trim());
                true
            }
            None => false,
        }
    }

    /// First value recorded for `key` (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lamp tilt data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IesTilt {
    None,
    /// Inline tilt table
    Include {
        lamp_to_luminaire_geometry: i32,
        angles: Vec<f64>,
        multiplying_factors: Vec<f64>,
    },
    /// Tilt table in a separate file
    File(String),
}

/// An LM-63 file as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IesFile {
    pub version: String,
    pub keywords: IesKeywords,
    pub tilt: IesTilt,
    pub lamp_count: usize,
    /// -1 for absolute photometry
    pub lumens_per_lamp: f64,
    pub candela_multiplier: f64,
    /// 1 = C, 2 = B, 3 = A
    pub photometric_type: i32,
    /// 1 = feet, 2 = meters
    pub units_type: i32,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub ballast_factor: f64,
    pub ballast_lamp_factor: f64,
    pub input_watts: f64,
    pub vertical_angles: Vec<f64>,
    pub horizontal_angles: Vec<f64>,
    /// One block of `vertical_angles.len()` values per horizontal angle
    pub candela: Vec<Vec<f64>>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse LM-63 text into its file structure.
pub fn parse_ies(text: &str) -> LumenResult<(IesFile, ImportDiagnostics)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut diag = ImportDiagnostics::new();

    let mut idx = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .ok_or_else(|| LumenError::syntax("ies.empty", "file is empty"))?;

    let version = match header_version(lines[idx]) {
        Some(version) => {
            idx += 1;
            version
        }
        None => IES_LEGACY_VERSION.to_string(),
    };

    let mut keywords = IesKeywords::new();
    let (tilt_line, tilt_value) = loop {
        let Some(raw) = lines.get(idx) else {
            return Err(
                LumenError::syntax("ies.tilt_missing", "no TILT= line found")
                    .with_context("keywords", keywords.len()),
            );
        };
        let line_no = idx + 1;
        let line = raw.trim();
        idx += 1;

        if let Some(value) = strip_prefix_ignore_case(line, "TILT=") {
            break (line_no, value.trim().to_string());
        }
        if line.is_empty() {
            continue;
        }
        match parse_keyword_line(line) {
            Some((key, value)) if key.eq_ignore_ascii_case("MORE") => {
                if !keywords.append_more(value) {
                    diag.add_skipped_line("parse", "[MORE] without a preceding keyword", line_no);
                }
            }
            Some((key, value)) => keywords.push(key, value),
            None => diag.add_skipped_line("parse", "unrecognized header line ignored", line_no),
        }
    };
    diag.stats.keywords = keywords.len();

    let mut cursor = TokenCursor::new(lines[idx..].iter().copied(), idx + 1, "ies");

    let tilt = match tilt_value.to_uppercase().as_str() {
        "NONE" => IesTilt::None,
        "INCLUDE" => {
            let lamp_to_luminaire_geometry = cursor.next_i32("lamp-to-luminaire geometry")?;
            let pairs = cursor.next_usize("number of tilt angles")?;
            let angles = cursor.take_f64(pairs, "tilt angles")?;
            let multiplying_factors = cursor.take_f64(pairs, "tilt multiplying factors")?;
            diag.add_warning_at_line(
                "tilt",
                "TILT=INCLUDE data is not carried into the converted file",
                tilt_line,
            );
            IesTilt::Include {
                lamp_to_luminaire_geometry,
                angles,
                multiplying_factors,
            }
        }
        "" => {
            return Err(
                LumenError::syntax("ies.tilt", "TILT= line has no value")
                    .with_context("line", tilt_line),
            )
        }
        _ => {
            diag.add_warning_at_line(
                "tilt",
                &format!("external tilt file '{}' is not read", tilt_value),
                tilt_line,
            );
            IesTilt::File(tilt_value.clone())
        }
    };

    let lamp_count = cursor.next_usize("number of lamps")?;
    let lumens_per_lamp = cursor.next_f64("lumens per lamp")?;
    let candela_multiplier = cursor.next_f64("candela multiplier")?;
    let vertical_count = cursor.next_usize("number of vertical angles")?;
    let horizontal_count = cursor.next_usize("number of horizontal angles")?;
    let photometric_type = cursor.next_i32("photometric type")?;
    let units_type = cursor.next_i32("units type")?;
    let width = cursor.next_f64("width")?;
    let length = cursor.next_f64("length")?;
    let height = cursor.next_f64("height")?;
    let ballast_factor = cursor.next_f64("ballast factor")?;
    let ballast_lamp_factor = cursor.next_f64("ballast-lamp photometric factor")?;
    let input_watts = cursor.next_f64("input watts")?;

    if vertical_count == 0 || horizontal_count == 0 {
        return Err(LumenError::syntax(
            "ies.angle_count",
            "vertical and horizontal angle counts must be positive",
        )
        .with_context("vertical", vertical_count)
        .with_context("horizontal", horizontal_count)
        .with_context("line", cursor.line()));
    }

    let vertical_angles = cursor.take_f64(vertical_count, "vertical angles")?;
    let horizontal_angles = cursor.take_f64(horizontal_count, "horizontal angles")?;

    let expected = vertical_count * horizontal_count;
    if cursor.remaining() < expected {
        return Err(LumenError::syntax(
            "ies.candela_count",
            "not enough candela values for the declared grid",
        )
        .with_context("expected", expected)
        .with_context("found", cursor.remaining())
        .with_context("line", cursor.line()));
    }
    let candela = (0..horizontal_count)
        .map(|_| cursor.take_f64(vertical_count, "candela values"))
        .collect::<LumenResult<Vec<_>>>()?;

    if cursor.remaining() > 0 {
        let line = cursor.line();
        diag.add_skipped_line(
            "parse",
            &format!("{} trailing values ignored", cursor.remaining()),
            line,
        );
    }

    diag.stats.vertical_angles = vertical_count;
    diag.stats.horizontal_angles = horizontal_count;

    let file = IesFile {
        version,
        keywords,
        tilt,
        lamp_count,
        lumens_per_lamp,
        candela_multiplier,
        photometric_type,
        units_type,
        width,
        length,
        height,
        ballast_factor,
        ballast_lamp_factor,
        input_watts,
        vertical_angles,
        horizontal_angles,
        candela,
    };
    Ok((file, diag))
}

/// Map a version line to a version name; `None` if the line is not one.
fn header_version(line: &str) -> Option<String> {
    let upper = line.trim().to_uppercase();
    if upper.starts_with("IESNA91") {
        return Some(IES_LEGACY_VERSION.to_string());
    }
    let rest = upper
        .strip_prefix("IESNA:")
        .or_else(|| upper.strip_prefix("IES:"))?;
    let version = rest.trim();
    if version.is_empty() {
        Some(IES_LEGACY_VERSION.to_string())
    } else {
        Some(version.to_string())
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

/// Split `[KEY] value` into (KEY, value).
fn parse_keyword_line(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('[')?;
    let close = inner.find(']')?;
    let key = inner[..close].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, inner[close + 1..].trim()))
}

// ============================================================================
// Common model mapping
// ============================================================================

impl IesFile {
    /// Convert to the common model, reporting lossy or defaulted fields.
    pub fn to_record(&self, diag: &mut ImportDiagnostics) -> LumenResult<PhotometricRecord> {
        let photometry_type =
            PhotometryType::from_ies_code(self.photometric_type).ok_or_else(|| {
                LumenError::semantic("ies.photometric_type", "photometric type must be 1, 2 or 3")
                    .with_context("photometric_type", self.photometric_type)
            })?;

        let scale = match self.units_type {
            1 => METERS_PER_FOOT,
            2 => 1.0,
            other => {
                return Err(LumenError::semantic(
                    "ies.units_type",
                    "units type must be 1 (feet) or 2 (meters)",
                )
                .with_context("units_type", other))
            }
        };

        let mut dimension = |name: &str, value: f64| -> f64 {
            if value < 0.0 {
                diag.add_defaulted(
                    &format!("geometry.{name}"),
                    &format!("negative {name} denotes a rounded opening; using its magnitude"),
                );
            }
            value.abs() * scale
        };
        let width = dimension("width", self.width);
        let length = dimension("length", self.length);
        let height = dimension("height", self.height);
        let geometry = Geometry {
            length,
            width,
            height,
            luminous_length: length,
            luminous_width: width,
            luminous_height: height,
        };

        let lamp_count = if self.lamp_count == 0 {
            diag.add_defaulted("photometry.lamp_count", "number of lamps is 0; using 1");
            1
        } else {
            u32::try_from(self.lamp_count).unwrap_or(u32::MAX)
        };

        let (units_type, luminous_flux) = if self.lumens_per_lamp < 0.0 {
            (UnitsType::Absolute, 0.0)
        } else {
            (
                UnitsType::Relative,
                self.lumens_per_lamp * self.lamp_count as f64,
            )
        };

        let candela_values = transpose(&self.candela, self.vertical_angles.len());

        let photometry = PhotometricMeasurements {
            photometry_type,
            units_type,
            luminous_flux,
            candela_multiplier: self.candela_multiplier,
            lamp_count,
            vertical_angles: self.vertical_angles.clone(),
            horizontal_angles: self.horizontal_angles.clone(),
            candela_values,
            light_output_ratio: None,
        };

        let electrical = ElectricalData {
            input_watts: self.input_watts,
            ballast_factor: self.ballast_factor,
            ballast_lamp_factor: self.ballast_lamp_factor,
            ..ElectricalData::default()
        };

        let keyword = |names: &[&str]| -> String {
            names
                .iter()
                .find_map(|name| self.keywords.get(name))
                .unwrap_or_default()
                .to_string()
        };
        let metadata = Metadata {
            manufacturer: keyword(&["MANUFAC"]),
            catalog_number: keyword(&["LUMCAT"]),
            description: keyword(&["LUMINAIRE"]),
            luminaire_type: keyword(&["LAMP"]),
            test_lab: keyword(&["TESTLAB"]),
            test_date: keyword(&["TESTDATE", "DATE"]),
            test_number: keyword(&["TEST"]),
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

/// Turn per-horizontal blocks into gamma-major rows.
fn transpose(blocks: &[Vec<f64>], rows: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|v| blocks.iter().map(|block| block[v]).collect())
        .collect()
}

// ============================================================================
// Detection
// ============================================================================

/// Score how likely `text` is an LM-63 file.
pub fn detect_ies(text: &str) -> Detection {
    let trimmed = text.trim_start();
    let upper_head: String = trimmed.chars().take(32).collect::<String>().to_uppercase();
    if upper_head.starts_with("IESNA:LM-63-2002") {
        return Detection::new(0.98, "LM-63-2002");
    }
    if upper_head.starts_with("IESNA:LM-63-1995") {
        return Detection::new(0.97, "LM-63-1995");
    }
    if upper_head.starts_with("IESNA91") {
        return Detection::new(0.95, IES_LEGACY_VERSION);
    }

    let lines: Vec<&str> = trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Detection::none();
    }

    let tilt_at = lines
        .iter()
        .position(|l| strip_prefix_ignore_case(l, "TILT=").is_some());
    let mut score = 0.0;
    if tilt_at.is_some() {
        score += 0.4;
    }
    if lines.iter().any(|l| parse_keyword_line(l).is_some()) {
        score += 0.2;
    }
    let numeric = lines.iter().filter(|l| is_numeric_line(l)).count();
    if numeric as f64 / lines.len() as f64 >= 0.5 {
        score += 0.2;
    }
    if let Some(at) = tilt_at {
        let has_parameter_line = lines[at + 1..]
            .iter()
            .any(|l| is_numeric_line(l) && l.split_whitespace().count() == 10);
        if has_parameter_line {
            score += 0.1;
        }
    }
    Detection::thresholded(score, 0.4, IES_LEGACY_VERSION)
}
