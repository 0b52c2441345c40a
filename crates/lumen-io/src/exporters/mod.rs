//! Writers for the supported photometric formats.

pub mod formats;

pub use formats::{write_cie, write_ies, write_ldt};
