//! Shared building blocks for the codecs and the conversion manager.

pub mod conversions;
pub mod grid;
pub mod record_validator;

pub use conversions::{
    decode_text, format_fixed, format_number, is_numeric_line, is_numeric_token, join_lines,
    parse_decimal_comma, parse_number, safe_f64_to_i32, safe_f64_to_usize, wrap_numbers,
    TokenCursor,
};
pub use grid::{
    classify_coverage, expand_to_full_circle, mirrored_angles, nearest_azimuth_index,
    nearest_index, resample, uniform_spacing, without_closing_plane, Coverage,
};
pub use record_validator::{validate_and_score, validate_photometric_record, ValidationResult};
