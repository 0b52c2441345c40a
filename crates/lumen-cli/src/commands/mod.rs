pub mod batch;
pub mod completions;
pub mod convert;
pub mod detect;
pub mod info;
pub mod util;
pub mod validate;
