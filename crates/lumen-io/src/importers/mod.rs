//! Parsers for the supported photometric formats.
//!
//! Each parser works in two steps: text into a format-specific struct that
//! mirrors the file layout ([`ies::IesFile`], [`ldt::LdtFile`],
//! [`cie::CieFile`]), then `to_record` into the common model. Parse problems
//! that do not stop the import are collected in an
//! [`lumen_core::ImportDiagnostics`].
//!
//! ```
//! use lumen_io::importers::{parse_ies, Format};
//!
//! let text = "IESNA:LM-63-2002\n[MANUFAC] Acme\n[LUMCAT] A-1\nTILT=NONE\n\
//!             1 1000 1 2 1 1 2 0 0 0\n1 1 10\n0 90\n0\n100 50\n";
//! let (file, mut diag) = parse_ies(text)?;
//! let record = file.to_record(&mut diag)?;
//! assert_eq!(record.metadata.manufacturer, "Acme");
//! assert_eq!("lm63".parse::<Format>()?, Format::Ies);
//! # Ok::<(), lumen_core::LumenError>(())
//! ```
//!
//! | Format | Grid | Units in file | Metadata |
//! |--------|------|---------------|----------|
//! | IES LM-63 | any, horizontal-major | cd x multiplier | keyword block |
//! | EULUMDAT | Nc x Ng, C-plane-major | cd/klm | fixed lines |
//! | CIE i-table | fixed 19 x 16 | cd/klm | description only |

pub mod cie;
pub mod format;
pub mod ies;
pub mod ldt;

pub use cie::{detect_cie, mine_description, parse_cie, CieFile, DescriptionFields};
pub use format::{parse_format_id, Format};
pub use ies::{detect_ies, parse_ies, IesFile, IesKeywords, IesTilt};
pub use ldt::{detect_ldt, parse_ldt, LampSet, LdtFile};
