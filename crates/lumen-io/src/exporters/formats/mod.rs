//! Format-specific writers.
//!
//! Each writer builds the format's file struct from a record with
//! `from_record` (which fails with a conversion error when the record cannot
//! be represented) and then serializes it. Fields the target cannot store are
//! reported as warnings in a [`lumen_core::Diagnostics`].

pub mod cie;
pub mod ies;
pub mod ldt;

pub use cie::write_cie;
pub use ies::{version_line, write_ies};
pub use ldt::{write_ldt, PlaneLayout};
