//! Path and URL utilities.
//!
//! Pure functions, no side effects.
//!
//! - [`fs`]: filesystem path normalization (`normalize_path`, `is_within`)
//! - [`url`]: URL classification (`is_local_url`, `strip_query`)

pub mod fs;
pub mod url;

pub use fs::{is_within, normalize_path};
pub use url::{is_local_url, strip_query};
