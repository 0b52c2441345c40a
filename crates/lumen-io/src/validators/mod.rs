//! Per-format validators.
//!
//! A format validator checks a record against what the target format can
//! physically hold: angle ranges, grid ceilings, fixed grids. Errors mean the
//! record cannot be written; warnings mean it can, with some loss. Findings
//! about individual lossy fields come from the writers instead.

mod cie;
mod ies;
mod ldt;

pub use cie::CieValidator;
pub use ies::IesValidator;
pub use ldt::LdtValidator;

use lumen_core::{Diagnostics, PhotometricRecord};

use crate::importers::Format;

/// Structural checks of a record against one target format.
pub trait FormatValidator: Send + Sync {
    fn format(&self) -> Format;

    fn validate(&self, record: &PhotometricRecord) -> Diagnostics;
}

/// One validator per supported format.
pub fn builtin_validators() -> Vec<Box<dyn FormatValidator>> {
    vec![
        Box::new(IesValidator),
        Box::new(LdtValidator),
        Box::new(CieValidator),
    ]
}
